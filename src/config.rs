//! Configuration types.

use std::net::SocketAddr;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Table names in the hosted database.
pub mod tables {
    pub const PROFILES: &str = "fanc_user_profiles";
    pub const BUYER_PREFERENCES: &str = "buyer_preferences";
    pub const PROPERTIES: &str = "fanc_properties";
    pub const CLIENTS: &str = "fanc_clients";
    pub const EVENTS: &str = "fanc_events";
    pub const SELLER_REQUESTS: &str = "seller_requests";
}

/// Connection settings for the hosted auth/storage service.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`. No trailing slash.
    pub url: String,
    /// Public anon key sent as `apikey` on every request.
    pub anon_key: SecretString,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl BackendConfig {
    /// Load from `SUPABASE_URL`, `SUPABASE_ANON_KEY` and
    /// `LIGHTKEEPER_HTTP_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup("SUPABASE_URL")
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("SUPABASE_URL".to_string()))?;
        let anon_key = lookup("SUPABASE_ANON_KEY")
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("SUPABASE_ANON_KEY".to_string()))?;

        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ConfigError::InvalidValue {
                key: "SUPABASE_URL".to_string(),
                message: format!("expected an http(s) URL, got {url}"),
            });
        }

        let timeout_secs: u64 = lookup("LIGHTKEEPER_HTTP_TIMEOUT_SECS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(15);

        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            anon_key: SecretString::from(anon_key),
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

/// HTTP server settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    /// Allowed CORS origin. `None` means permissive.
    pub cors_origin: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 3000,
            cors_origin: None,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let bind = std::env::var("LIGHTKEEPER_BIND").unwrap_or(defaults.bind);
        let port: u16 = std::env::var("LIGHTKEEPER_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.port);
        let cors_origin = std::env::var("LIGHTKEEPER_CORS_ORIGIN")
            .ok()
            .filter(|s| !s.is_empty());
        Self {
            bind,
            port,
            cors_origin,
        }
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.bind, self.port)
            .parse()
            .map_err(|e| ConfigError::InvalidValue {
                key: "LIGHTKEEPER_BIND".to_string(),
                message: format!("{e}"),
            })
    }
}
