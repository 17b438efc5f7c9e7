//! SessionRegistry: one gate per signed-in operator.
//!
//! Sign-in opens a fresh backend session and hands the caller an opaque
//! token. Requests present it as `Authorization: Bearer <token>`; anything
//! without a known token is anonymous.

use std::collections::HashMap;
use std::sync::Arc;

use secrecy::SecretString;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use super::gate::{GateHandle, SessionGate};
use crate::backend::Backend;
use crate::error::AuthError;

/// Builds a backend with no session for the next operator.
pub type BackendFactory = Arc<dyn Fn() -> Arc<dyn Backend> + Send + Sync>;

/// A signed-in operator's gate and the backend acting as them.
#[derive(Clone)]
pub struct Caller {
    pub gate: Arc<SessionGate>,
    pub backend: Arc<dyn Backend>,
}

struct Entry {
    caller: Caller,
    handle: GateHandle,
}

impl Entry {
    fn close(self) {
        self.handle.dispose();
    }
}

pub struct SessionRegistry {
    connect: BackendFactory,
    sessions: RwLock<HashMap<String, Entry>>,
}

impl SessionRegistry {
    pub fn new(connect: BackendFactory) -> Arc<Self> {
        Arc::new(Self {
            connect,
            sessions: RwLock::new(HashMap::new()),
        })
    }

    /// Check credentials on a new backend session. On success the caller
    /// is registered under a new token.
    pub async fn sign_in(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<(String, Caller), AuthError> {
        let backend = (self.connect)();
        let gate = SessionGate::new(Arc::clone(&backend));
        let handle = gate.start();
        if let Err(e) = gate.sign_in(email, password).await {
            handle.dispose();
            return Err(e);
        }

        let token = new_token();
        let caller = Caller { gate, backend };
        let mut sessions = self.sessions.write().await;
        sessions.insert(
            token.clone(),
            Entry {
                caller: caller.clone(),
                handle,
            },
        );
        info!(open = sessions.len(), "Operator session opened");
        Ok((token, caller))
    }

    /// The caller behind `token`. A session the backend has since dropped,
    /// for example after a failed token refresh, is forgotten.
    pub async fn caller(&self, token: &str) -> Option<Caller> {
        let caller = self.sessions.read().await.get(token)?.caller.clone();
        if caller.gate.state().await.is_authenticated() {
            return Some(caller);
        }
        if let Some(entry) = self.sessions.write().await.remove(token) {
            debug!("Dropping operator session the backend ended");
            entry.close();
        }
        None
    }

    /// Sign out the session behind `token`. Unknown tokens are a no-op.
    pub async fn sign_out(&self, token: &str) -> bool {
        let Some(entry) = self.sessions.write().await.remove(token) else {
            return false;
        };
        entry.caller.gate.sign_out().await;
        entry.close();
        info!("Operator session closed");
        true
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Stop every gate listener. Remote sessions are left to expire.
    pub async fn close_all(&self) {
        let mut sessions = self.sessions.write().await;
        for (_, entry) in sessions.drain() {
            entry.close();
        }
    }
}

/// 256 random bits, hex encoded.
fn new_token() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}
