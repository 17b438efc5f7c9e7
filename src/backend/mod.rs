//! Hosted backend collaborator: auth sessions plus row storage.
//!
//! Everything the application persists or authenticates goes through the
//! [`Backend`] trait. The production implementation talks to a Supabase
//! project over HTTP; tests substitute their own implementations.

pub mod session;
pub mod supabase;

pub use session::{Session, SessionEvent, SessionUser};
pub use supabase::SupabaseBackend;

use async_trait::async_trait;
use secrecy::SecretString;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::error::{AuthError, BackendError};

/// A row filter understood by the storage API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    Eq(String, String),
    Gte(String, String),
}

impl Filter {
    pub fn eq(column: &str, value: impl Into<String>) -> Self {
        Self::Eq(column.to_string(), value.into())
    }

    pub fn gte(column: &str, value: impl Into<String>) -> Self {
        Self::Gte(column.to_string(), value.into())
    }

    pub fn column(&self) -> &str {
        match self {
            Self::Eq(c, _) | Self::Gte(c, _) => c,
        }
    }

    /// Operator-prefixed value in PostgREST syntax (`eq.active`).
    pub fn to_query_value(&self) -> String {
        match self {
            Self::Eq(_, v) => format!("eq.{v}"),
            Self::Gte(_, v) => format!("gte.{v}"),
        }
    }
}

/// Sort order for a select.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

/// A multi-row read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Select {
    pub table: String,
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
}

impl Select {
    pub fn from(table: &str) -> Self {
        Self {
            table: table.to_string(),
            filters: Vec::new(),
            order: None,
        }
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order_by(mut self, column: &str, ascending: bool) -> Self {
        self.order = Some(Order {
            column: column.to_string(),
            ascending,
        });
        self
    }
}

/// Backend-agnostic interface to the hosted auth + storage service.
#[async_trait]
pub trait Backend: Send + Sync {
    // ── Auth ────────────────────────────────────────────────────────

    /// Current session, if any.
    async fn get_session(&self) -> Result<Option<Session>, BackendError>;

    /// Subscribe to sign-in, sign-out and token refresh events.
    fn subscribe(&self) -> broadcast::Receiver<SessionEvent>;

    /// Check credentials and establish a session.
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<Session, AuthError>;

    /// End the current session. The local session is forgotten even if the
    /// remote call fails.
    async fn sign_out(&self) -> Result<(), BackendError>;

    // ── Rows ────────────────────────────────────────────────────────

    /// Read the single row with the given `id`.
    async fn read_one(&self, table: &str, id: &str) -> Result<Option<Value>, BackendError>;

    /// Read all rows matching a select.
    async fn select(&self, query: &Select) -> Result<Vec<Value>, BackendError>;

    /// Exact number of rows matching the filters.
    async fn count(&self, table: &str, filters: &[Filter]) -> Result<u64, BackendError>;

    /// Insert one record.
    async fn insert_one(&self, table: &str, record: &Value) -> Result<(), BackendError>;

    /// Patch the row with the given `id`.
    async fn update(&self, table: &str, id: &str, patch: &Value) -> Result<(), BackendError>;

    /// Delete the row with the given `id`.
    async fn delete(&self, table: &str, id: &str) -> Result<(), BackendError>;
}
