//! SessionGate tracks the session and resolves the profile behind it.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tokio::sync::RwLock;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::model::{Identity, Profile};
use super::state::{GatePhase, GateState, ProfileLookup};
use crate::backend::{Backend, Session};
use crate::config::tables;
use crate::error::AuthError;

/// Holds the current session and profile for one operator.
///
/// Each signed-in operator gets their own gate over their own backend
/// session; see [`SessionRegistry`](super::SessionRegistry).
///
/// Constructed explicitly and shared behind an `Arc`. Call [`start`] to
/// follow backend auth events and [`initialize`] to pick up an existing
/// session.
///
/// [`start`]: SessionGate::start
/// [`initialize`]: SessionGate::initialize
pub struct SessionGate {
    backend: Arc<dyn Backend>,
    state: RwLock<GateState>,
}

impl SessionGate {
    pub fn new(backend: Arc<dyn Backend>) -> Arc<Self> {
        Arc::new(Self {
            backend,
            state: RwLock::new(GateState::default()),
        })
    }

    /// Look for an existing session and resolve its profile.
    pub async fn initialize(&self) {
        match self.backend.get_session().await {
            Ok(Some(session)) => self.on_session_change(Some(session)).await,
            Ok(None) => {
                debug!("No existing session");
                *self.state.write().await = GateState::Unauthenticated;
            }
            Err(e) => {
                warn!("Failed to read existing session: {}", e);
                *self.state.write().await = GateState::Unauthenticated;
            }
        }
    }

    /// Apply a sign-in, sign-out or token refresh.
    pub async fn on_session_change(&self, session: Option<Session>) {
        let Some(session) = session else {
            *self.state.write().await = GateState::Unauthenticated;
            return;
        };

        let user_id = session.user_id();
        {
            let mut state = self.state.write().await;
            if let Some(current) = state.session() {
                if same_token(current, &session) {
                    return;
                }
            }
            *state = match std::mem::take(&mut *state) {
                // Same identity with a new token keeps its profile while it re-resolves.
                GateState::AuthenticatedWithProfile { profile, .. } if profile.id == user_id => {
                    GateState::AuthenticatedWithProfile { session, profile }
                }
                _ => GateState::AuthenticatedNoProfile {
                    session,
                    lookup: ProfileLookup::Pending,
                },
            };
        }

        self.resolve_profile(user_id).await;
    }

    /// Fetch the profile row for `user_id` and apply it.
    ///
    /// Never fails: a missing row or read error is logged and the gate
    /// stays without a profile. The result is discarded if the session has
    /// moved on to another identity meanwhile.
    pub async fn resolve_profile(&self, user_id: Uuid) -> Option<Profile> {
        let profile = match self
            .backend
            .read_one(tables::PROFILES, &user_id.to_string())
            .await
        {
            Ok(Some(row)) => match serde_json::from_value::<Profile>(row) {
                Ok(profile) => Some(profile),
                Err(e) => {
                    warn!(user_id = %user_id, "Malformed profile row: {}", e);
                    None
                }
            },
            Ok(None) => {
                warn!(user_id = %user_id, "No profile row for user");
                None
            }
            Err(e) => {
                warn!(user_id = %user_id, "Error fetching profile: {}", e);
                None
            }
        };

        let mut state = self.state.write().await;
        if state.user_id() != Some(user_id) {
            debug!(user_id = %user_id, "Discarding profile lookup for stale session");
            return None;
        }
        let session = state.session().cloned()?;

        match profile {
            Some(ref p) => {
                info!(user_id = %user_id, role = %p.role, "Profile resolved");
                *state = GateState::AuthenticatedWithProfile {
                    session,
                    profile: p.clone(),
                };
            }
            None => {
                if !matches!(*state, GateState::AuthenticatedWithProfile { .. }) {
                    *state = GateState::AuthenticatedNoProfile {
                        session,
                        lookup: ProfileLookup::Failed,
                    };
                }
            }
        }
        profile
    }

    /// Retry the profile lookup for the current session.
    pub async fn refresh_profile(&self) -> Option<Profile> {
        let user_id = {
            let mut state = self.state.write().await;
            let user_id = state.user_id()?;
            if let GateState::AuthenticatedNoProfile { lookup, .. } = &mut *state {
                *lookup = ProfileLookup::Pending;
            }
            user_id
        };
        self.resolve_profile(user_id).await
    }

    /// Check credentials with the backend. No retries.
    pub async fn sign_in(&self, email: &str, password: &SecretString) -> Result<(), AuthError> {
        let session = self.backend.sign_in_with_password(email, password).await?;
        let user_id = session.user_id();
        self.on_session_change(Some(session)).await;
        // The event listener may have applied this session first and still be resolving.
        if self.state.read().await.is_loading() {
            self.resolve_profile(user_id).await;
        }
        Ok(())
    }

    /// Sign out remotely, then clear local state whatever the outcome.
    pub async fn sign_out(&self) {
        if let Err(e) = self.backend.sign_out().await {
            warn!("Sign-out request failed: {}", e);
        }
        *self.state.write().await = GateState::Unauthenticated;
    }

    pub async fn state(&self) -> GateState {
        self.state.read().await.clone()
    }

    pub async fn identity(&self) -> Identity {
        self.state.read().await.identity()
    }

    pub async fn is_loading(&self) -> bool {
        self.state.read().await.is_loading()
    }

    pub async fn is_admin(&self) -> bool {
        self.identity().await.is_admin()
    }

    pub async fn is_broker(&self) -> bool {
        self.identity().await.is_broker()
    }

    pub async fn is_client(&self) -> bool {
        self.identity().await.is_client()
    }

    /// Serializable view of the gate for the API.
    pub async fn snapshot(&self) -> GateSnapshot {
        GateSnapshot::from_state(&*self.state.read().await)
    }

    /// Follow backend auth events until disposed.
    pub fn start(self: &Arc<Self>) -> GateHandle {
        let mut rx = self.backend.subscribe();
        let gate = Arc::clone(self);
        let task = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => {
                        debug!(event = event.name(), "Auth state change");
                        gate.on_session_change(event.into_session()).await;
                    }
                    Err(RecvError::Lagged(n)) => {
                        warn!(missed = n, "Session gate lagged behind auth events");
                        let session = gate.backend.get_session().await.ok().flatten();
                        gate.on_session_change(session).await;
                    }
                    Err(RecvError::Closed) => {
                        debug!("Auth event channel closed");
                        break;
                    }
                }
            }
        });
        GateHandle { task }
    }
}

fn same_token(a: &Session, b: &Session) -> bool {
    a.user_id() == b.user_id() && a.access_token.expose_secret() == b.access_token.expose_secret()
}

/// Running auth-event subscription.
pub struct GateHandle {
    task: JoinHandle<()>,
}

impl GateHandle {
    /// Stop following auth events.
    pub fn dispose(self) {
        self.task.abort();
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

/// Gate state as returned by `GET /api/session`.
#[derive(Debug, Clone, Serialize)]
pub struct GateSnapshot {
    pub phase: GatePhase,
    pub loading: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<SnapshotUser>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<Profile>,
    pub profile_lookup_failed: bool,
    pub is_admin: bool,
    pub is_broker: bool,
    pub is_client: bool,
}

impl GateSnapshot {
    pub fn from_state(state: &GateState) -> Self {
        let identity = state.identity();
        Self {
            phase: state.phase(),
            loading: state.is_loading(),
            user: state.session().map(|s| SnapshotUser {
                id: s.user.id,
                email: s.user.email.clone(),
            }),
            profile_lookup_failed: matches!(
                state,
                GateState::AuthenticatedNoProfile {
                    lookup: ProfileLookup::Failed,
                    ..
                }
            ),
            is_admin: identity.is_admin(),
            is_broker: identity.is_broker(),
            is_client: identity.is_client(),
            profile: identity.profile().cloned(),
        }
    }

    /// What a caller without a session sees.
    pub fn signed_out() -> Self {
        Self::from_state(&GateState::Unauthenticated)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SnapshotUser {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::Utc;
    use serde_json::Value;
    use tokio::sync::broadcast;

    use super::*;
    use crate::auth::model::Role;
    use crate::backend::{Filter, Select, SessionEvent, SessionUser};
    use crate::error::BackendError;

    #[derive(Default)]
    struct StubBackend {
        session: Mutex<Option<Session>>,
        profiles: Mutex<HashMap<String, Value>>,
        profile_error: Mutex<bool>,
        sign_out_error: bool,
        tx: Option<broadcast::Sender<SessionEvent>>,
    }

    impl StubBackend {
        fn new() -> Self {
            let (tx, _) = broadcast::channel(16);
            Self {
                tx: Some(tx),
                ..Default::default()
            }
        }

        fn with_session(self, session: Session) -> Self {
            *self.session.lock().unwrap() = Some(session);
            self
        }

        fn with_profile(self, id: Uuid, role: Role) -> Self {
            self.profiles.lock().unwrap().insert(
                id.to_string(),
                serde_json::json!({ "id": id, "role": role, "first_name": "Pat" }),
            );
            self
        }

        fn emit(&self, event: SessionEvent) {
            *self.session.lock().unwrap() = event.session().cloned();
            if let Some(tx) = &self.tx {
                let _ = tx.send(event);
            }
        }
    }

    #[async_trait]
    impl Backend for StubBackend {
        async fn get_session(&self) -> Result<Option<Session>, BackendError> {
            Ok(self.session.lock().unwrap().clone())
        }

        fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
            self.tx.as_ref().unwrap().subscribe()
        }

        async fn sign_in_with_password(
            &self,
            email: &str,
            password: &SecretString,
        ) -> Result<Session, AuthError> {
            if password.expose_secret() != "correct horse" {
                return Err(AuthError::InvalidCredentials);
            }
            let session = session_for(Uuid::new_v4(), Some(email));
            *self.session.lock().unwrap() = Some(session.clone());
            Ok(session)
        }

        async fn sign_out(&self) -> Result<(), BackendError> {
            *self.session.lock().unwrap() = None;
            if self.sign_out_error {
                return Err(BackendError::Request {
                    endpoint: "auth/logout".into(),
                    reason: "offline".into(),
                });
            }
            Ok(())
        }

        async fn read_one(&self, _table: &str, id: &str) -> Result<Option<Value>, BackendError> {
            if *self.profile_error.lock().unwrap() {
                return Err(BackendError::Status {
                    status: 500,
                    message: "boom".into(),
                });
            }
            Ok(self.profiles.lock().unwrap().get(id).cloned())
        }

        async fn select(&self, _query: &Select) -> Result<Vec<Value>, BackendError> {
            Ok(vec![])
        }

        async fn count(&self, _table: &str, _filters: &[Filter]) -> Result<u64, BackendError> {
            Ok(0)
        }

        async fn insert_one(&self, _table: &str, _record: &Value) -> Result<(), BackendError> {
            Ok(())
        }

        async fn update(&self, _table: &str, _id: &str, _patch: &Value) -> Result<(), BackendError> {
            Ok(())
        }

        async fn delete(&self, _table: &str, _id: &str) -> Result<(), BackendError> {
            Ok(())
        }
    }

    fn session_for(id: Uuid, email: Option<&str>) -> Session {
        Session {
            access_token: SecretString::from(format!("token-{}", Uuid::new_v4())),
            refresh_token: None,
            expires_at: Utc::now() + chrono::Duration::hours(1),
            user: SessionUser {
                id,
                email: email.map(String::from),
            },
        }
    }

    #[tokio::test]
    async fn starts_initializing() {
        let gate = SessionGate::new(Arc::new(StubBackend::new()));
        assert!(gate.is_loading().await);
        assert_eq!(gate.state().await.phase(), GatePhase::Initializing);
    }

    #[tokio::test]
    async fn no_session_means_no_roles_and_not_loading() {
        let gate = SessionGate::new(Arc::new(StubBackend::new()));
        gate.initialize().await;

        assert!(!gate.is_loading().await);
        assert!(!gate.is_admin().await);
        assert!(!gate.is_broker().await);
        assert!(!gate.is_client().await);
        assert_eq!(gate.state().await.phase(), GatePhase::Unauthenticated);
    }

    #[tokio::test]
    async fn existing_session_resolves_profile() {
        let id = Uuid::new_v4();
        let backend = StubBackend::new()
            .with_session(session_for(id, None))
            .with_profile(id, Role::Broker);
        let gate = SessionGate::new(Arc::new(backend));
        gate.initialize().await;

        assert_eq!(gate.state().await.phase(), GatePhase::AuthenticatedWithProfile);
        assert!(gate.is_broker().await);
        assert!(!gate.is_admin().await);
        assert!(!gate.is_loading().await);
    }

    #[tokio::test]
    async fn missing_profile_stays_without_profile() {
        let id = Uuid::new_v4();
        let backend = StubBackend::new().with_session(session_for(id, None));
        let gate = SessionGate::new(Arc::new(backend));
        gate.initialize().await;

        let state = gate.state().await;
        assert_eq!(state.phase(), GatePhase::AuthenticatedNoProfile);
        assert!(!state.is_loading());
        assert!(state.profile().is_none());
        assert_eq!(gate.identity().await, Identity::Anonymous);
    }

    #[tokio::test]
    async fn profile_read_error_does_not_escalate() {
        let id = Uuid::new_v4();
        let backend = StubBackend::new()
            .with_session(session_for(id, None))
            .with_profile(id, Role::Admin);
        *backend.profile_error.lock().unwrap() = true;
        let gate = SessionGate::new(Arc::new(backend));
        gate.initialize().await;

        let snapshot = gate.snapshot().await;
        assert!(snapshot.profile.is_none());
        assert!(snapshot.profile_lookup_failed);
        assert!(!snapshot.is_admin);
    }

    #[tokio::test]
    async fn refresh_profile_recovers_after_failure() {
        let id = Uuid::new_v4();
        let backend = Arc::new(
            StubBackend::new()
                .with_session(session_for(id, None))
                .with_profile(id, Role::Admin),
        );
        *backend.profile_error.lock().unwrap() = true;
        let gate = SessionGate::new(backend.clone());
        gate.initialize().await;
        assert!(!gate.is_admin().await);

        *backend.profile_error.lock().unwrap() = false;
        let profile = gate.refresh_profile().await;
        assert_eq!(profile.map(|p| p.role), Some(Role::Admin));
        assert!(gate.is_admin().await);
    }

    #[tokio::test]
    async fn refresh_profile_without_session_is_noop() {
        let gate = SessionGate::new(Arc::new(StubBackend::new()));
        gate.initialize().await;
        assert!(gate.refresh_profile().await.is_none());
        assert_eq!(gate.state().await.phase(), GatePhase::Unauthenticated);
    }

    #[tokio::test]
    async fn sign_in_wrong_password_is_opaque_error() {
        let gate = SessionGate::new(Arc::new(StubBackend::new()));
        gate.initialize().await;
        let err = gate
            .sign_in("a@b.com", &SecretString::from("nope"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
        assert_eq!(gate.state().await.phase(), GatePhase::Unauthenticated);
    }

    #[tokio::test]
    async fn sign_in_without_profile_is_authenticated_no_profile() {
        let gate = SessionGate::new(Arc::new(StubBackend::new()));
        gate.initialize().await;
        gate.sign_in("a@b.com", &SecretString::from("correct horse"))
            .await
            .unwrap();
        let snapshot = gate.snapshot().await;
        assert_eq!(snapshot.phase, GatePhase::AuthenticatedNoProfile);
        assert_eq!(snapshot.user.unwrap().email.as_deref(), Some("a@b.com"));
    }

    #[tokio::test]
    async fn sign_out_clears_state_even_when_remote_fails() {
        let id = Uuid::new_v4();
        let backend = StubBackend {
            sign_out_error: true,
            ..StubBackend::new()
        }
        .with_session(session_for(id, None))
        .with_profile(id, Role::Client);
        let gate = SessionGate::new(Arc::new(backend));
        gate.initialize().await;
        assert!(gate.is_client().await);

        gate.sign_out().await;
        assert_eq!(gate.state().await.phase(), GatePhase::Unauthenticated);
        assert!(!gate.is_client().await);
    }

    #[tokio::test]
    async fn stale_lookup_is_discarded() {
        let id = Uuid::new_v4();
        let backend = StubBackend::new().with_profile(id, Role::Admin);
        let gate = SessionGate::new(Arc::new(backend));
        gate.initialize().await;

        // Lookup for an identity that is not the current session.
        assert!(gate.resolve_profile(id).await.is_none());
        assert_eq!(gate.state().await.phase(), GatePhase::Unauthenticated);
    }

    #[tokio::test]
    async fn token_refresh_keeps_profile() {
        let id = Uuid::new_v4();
        let backend = Arc::new(
            StubBackend::new()
                .with_session(session_for(id, None))
                .with_profile(id, Role::Broker),
        );
        let gate = SessionGate::new(backend.clone());
        gate.initialize().await;

        *backend.profile_error.lock().unwrap() = true;
        gate.on_session_change(Some(session_for(id, None))).await;
        assert!(gate.is_broker().await, "profile survives a failed re-resolve");
    }

    #[tokio::test]
    async fn started_gate_follows_backend_events() {
        let id = Uuid::new_v4();
        let backend = Arc::new(StubBackend::new().with_profile(id, Role::Admin));
        let gate = SessionGate::new(backend.clone());
        let handle = gate.start();
        gate.initialize().await;
        assert!(handle.is_running());

        backend.emit(SessionEvent::SignedIn(session_for(id, None)));
        tokio::time::timeout(Duration::from_secs(2), async {
            while !gate.is_admin().await {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("gate never saw sign-in");

        backend.emit(SessionEvent::SignedOut);
        tokio::time::timeout(Duration::from_secs(2), async {
            while gate.state().await.is_authenticated() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("gate never saw sign-out");

        handle.dispose();
    }

    #[test]
    fn signed_out_snapshot_is_settled_and_roleless() {
        let snapshot = GateSnapshot::signed_out();
        assert_eq!(snapshot.phase, GatePhase::Unauthenticated);
        assert!(!snapshot.loading);
        assert!(snapshot.user.is_none());
        assert!(!snapshot.is_admin && !snapshot.is_broker && !snapshot.is_client);
    }
}
