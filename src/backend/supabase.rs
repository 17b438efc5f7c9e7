//! Supabase backend. GoTrue for auth, PostgREST for rows.
//!
//! Native HTTP implementation over `reqwest`. The session lives in memory
//! only; one backend instance serves one signed-in operator. [`fork`]
//! hands out further instances that share the connection pool.
//!
//! [`fork`]: SupabaseBackend::fork

use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::{Mutex, RwLock, broadcast};
use tracing::{debug, info, warn};

use super::{Backend, Filter, Select, Session, SessionEvent, SessionUser};
use crate::config::BackendConfig;
use crate::error::{AuthError, BackendError};

/// Capacity of the session event channel.
const SESSION_BROADCAST_CAPACITY: usize = 32;

/// Token grant response from `/auth/v1/token`.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    expires_in: i64,
    user: SessionUser,
}

impl TokenResponse {
    fn into_session(self) -> Session {
        Session {
            access_token: SecretString::from(self.access_token),
            refresh_token: self.refresh_token.map(SecretString::from),
            expires_at: Utc::now() + Duration::seconds(self.expires_in),
            user: self.user,
        }
    }
}

/// HTTP client for a Supabase project.
pub struct SupabaseBackend {
    config: BackendConfig,
    client: reqwest::Client,
    session: RwLock<Option<Session>>,
    /// Serializes token refreshes; refresh tokens are single use.
    refresh_lock: Mutex<()>,
    tx: broadcast::Sender<SessionEvent>,
}

impl SupabaseBackend {
    pub fn new(config: BackendConfig) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| BackendError::Request {
                endpoint: config.url.clone(),
                reason: format!("Failed to build HTTP client: {e}"),
            })?;
        Ok(Self::with_client(config, client))
    }

    fn with_client(config: BackendConfig, client: reqwest::Client) -> Self {
        let (tx, _rx) = broadcast::channel(SESSION_BROADCAST_CAPACITY);
        Self {
            config,
            client,
            session: RwLock::new(None),
            refresh_lock: Mutex::new(()),
            tx,
        }
    }

    /// A backend for another operator: same project and connection pool,
    /// no session and its own event channel.
    pub fn fork(&self) -> Self {
        Self::with_client(self.config.clone(), self.client.clone())
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{path}", self.config.url)
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.config.url)
    }

    fn auth_request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, self.auth_url(path))
            .header("apikey", self.config.anon_key.expose_secret())
    }

    /// Row request authorized as the signed-in user, or anonymously.
    ///
    /// An expired session is refreshed first. If the refresh fails the
    /// session is dropped and the request goes out with the anon key.
    async fn rest_request(&self, method: Method, table: &str) -> Result<RequestBuilder, BackendError> {
        let bearer = match self.get_session().await? {
            Some(session) => session.access_token.expose_secret().to_string(),
            None => self.config.anon_key.expose_secret().to_string(),
        };
        Ok(self
            .client
            .request(method, self.rest_url(table))
            .header("apikey", self.config.anon_key.expose_secret())
            .bearer_auth(bearer))
    }

    async fn send(&self, endpoint: &str, request: RequestBuilder) -> Result<Response, BackendError> {
        let response = request.send().await.map_err(|e| BackendError::Request {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })?;
        if response.status().is_success() {
            return Ok(response);
        }
        Err(status_error(response).await)
    }

    /// Store the session carried by `event` and notify subscribers.
    async fn publish(&self, event: SessionEvent) {
        *self.session.write().await = event.session().cloned();
        debug!(event = event.name(), "Session event");
        // ok if nobody is listening
        let _ = self.tx.send(event);
    }

    async fn refresh_session(&self, refresh_token: &SecretString) -> Result<Session, BackendError> {
        let request = self
            .auth_request(Method::POST, "token")
            .query(&[("grant_type", "refresh_token")])
            .json(&serde_json::json!({ "refresh_token": refresh_token.expose_secret() }));
        let response = self.send("auth/token", request).await?;
        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))?;
        Ok(token.into_session())
    }
}

#[async_trait]
impl Backend for SupabaseBackend {
    async fn get_session(&self) -> Result<Option<Session>, BackendError> {
        let _refresh = self.refresh_lock.lock().await;
        let current = self.session.read().await.clone();
        let Some(session) = current else {
            return Ok(None);
        };
        if !session.is_expired_at(Utc::now()) {
            return Ok(Some(session));
        }

        let Some(refresh_token) = session.refresh_token.clone() else {
            info!(user_id = %session.user_id(), "Session expired without refresh token");
            self.publish(SessionEvent::SignedOut).await;
            return Ok(None);
        };

        match self.refresh_session(&refresh_token).await {
            Ok(fresh) => {
                self.publish(SessionEvent::TokenRefreshed(fresh.clone())).await;
                Ok(Some(fresh))
            }
            Err(e) => {
                warn!(user_id = %session.user_id(), "Token refresh failed: {}", e);
                self.publish(SessionEvent::SignedOut).await;
                Ok(None)
            }
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<Session, AuthError> {
        let request = self
            .auth_request(Method::POST, "token")
            .query(&[("grant_type", "password")])
            .json(&serde_json::json!({
                "email": email,
                "password": password.expose_secret(),
            }));

        let response = request.send().await.map_err(|e| BackendError::Request {
            endpoint: "auth/token".to_string(),
            reason: e.to_string(),
        })?;

        let status = response.status();
        if status == StatusCode::BAD_REQUEST || status == StatusCode::UNAUTHORIZED {
            return Err(AuthError::InvalidCredentials);
        }
        if !status.is_success() {
            return Err(status_error(response).await.into());
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))?;
        let session = token.into_session();
        info!(user_id = %session.user_id(), "Signed in");
        self.publish(SessionEvent::SignedIn(session.clone())).await;
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        let current = self.session.read().await.clone();
        let result = match current {
            Some(session) => {
                let request = self
                    .auth_request(Method::POST, "logout")
                    .bearer_auth(session.access_token.expose_secret());
                self.send("auth/logout", request).await.map(|_| ())
            }
            None => Ok(()),
        };
        if let Err(ref e) = result {
            warn!("Remote sign-out failed, clearing local session anyway: {}", e);
        }
        self.publish(SessionEvent::SignedOut).await;
        result
    }

    async fn read_one(&self, table: &str, id: &str) -> Result<Option<Value>, BackendError> {
        let request = self
            .rest_request(Method::GET, table)
            .await?
            .query(&[("select", "*".to_string()), ("id", format!("eq.{id}"))]);
        let response = self.send(table, request).await?;
        let rows: Vec<Value> = response
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))?;
        Ok(rows.into_iter().next())
    }

    async fn select(&self, query: &Select) -> Result<Vec<Value>, BackendError> {
        let mut params = vec![("select".to_string(), "*".to_string())];
        params.extend(filter_params(&query.filters));
        if let Some(order) = &query.order {
            let direction = if order.ascending { "asc" } else { "desc" };
            params.push(("order".to_string(), format!("{}.{direction}", order.column)));
        }

        let request = self
            .rest_request(Method::GET, &query.table)
            .await?
            .query(&params);
        let response = self.send(&query.table, request).await?;
        response
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))
    }

    async fn count(&self, table: &str, filters: &[Filter]) -> Result<u64, BackendError> {
        let mut params = vec![("select".to_string(), "*".to_string())];
        params.extend(filter_params(filters));

        let request = self
            .rest_request(Method::HEAD, table)
            .await?
            .header("Prefer", "count=exact")
            .query(&params);
        let response = self.send(table, request).await?;
        let range = response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| BackendError::Decode("missing Content-Range header".to_string()))?;
        parse_content_range(range)
            .ok_or_else(|| BackendError::Decode(format!("unparseable Content-Range: {range}")))
    }

    async fn insert_one(&self, table: &str, record: &Value) -> Result<(), BackendError> {
        let request = self
            .rest_request(Method::POST, table)
            .await?
            .header("Prefer", "return=minimal")
            .json(&[record]);
        self.send(table, request).await?;
        debug!(table, "Inserted row");
        Ok(())
    }

    async fn update(&self, table: &str, id: &str, patch: &Value) -> Result<(), BackendError> {
        let request = self
            .rest_request(Method::PATCH, table)
            .await?
            .header("Prefer", "return=minimal")
            .query(&[("id", format!("eq.{id}"))])
            .json(patch);
        self.send(table, request).await?;
        debug!(table, id, "Updated row");
        Ok(())
    }

    async fn delete(&self, table: &str, id: &str) -> Result<(), BackendError> {
        let request = self
            .rest_request(Method::DELETE, table)
            .await?
            .query(&[("id", format!("eq.{id}"))]);
        self.send(table, request).await?;
        debug!(table, id, "Deleted row");
        Ok(())
    }
}

fn filter_params(filters: &[Filter]) -> Vec<(String, String)> {
    filters
        .iter()
        .map(|f| (f.column().to_string(), f.to_query_value()))
        .collect()
}

async fn status_error(response: Response) -> BackendError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    BackendError::Status {
        status,
        message: error_message(&body),
    }
}

/// Pull a human-readable message out of a GoTrue/PostgREST error body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            ["message", "msg", "error_description", "error"]
                .iter()
                .find_map(|key| v.get(*key).and_then(|m| m.as_str()).map(String::from))
        })
        .unwrap_or_else(|| body.to_string())
}

/// Total from a `Content-Range` header such as `0-24/3573` or `*/0`.
fn parse_content_range(header: &str) -> Option<u64> {
    header.rsplit('/').next()?.trim().parse().ok()
}
