//! JSON API over the gate, the wizard, seller leads and the listings.

mod dashboard;
mod error;
mod seller;
mod session;
mod wizards;

pub use error::ApiError;

use std::sync::Arc;

use axum::http::{HeaderMap, HeaderValue, Method, header};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use tower_http::cors::CorsLayer;

use crate::auth::{
    BackendFactory, Caller, GuardDecision, Profile, Role, SessionRegistry, guard_dashboard,
};
use crate::backend::Backend;
use crate::error::ConfigError;
use crate::listings::ListingService;
use crate::wizard::WizardRegistry;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Anonymous backend for visitor-facing writes.
    pub backend: Arc<dyn Backend>,
    pub sessions: Arc<SessionRegistry>,
    pub wizards: Arc<WizardRegistry>,
}

/// A caller who passed the dashboard guard.
pub(crate) struct Authorized {
    pub profile: Profile,
    /// Acts with the caller's own backend session.
    pub backend: Arc<dyn Backend>,
}

impl Authorized {
    pub fn listings(&self) -> ListingService {
        ListingService::new(Arc::clone(&self.backend))
    }
}

impl AppState {
    /// `backend` stays anonymous; `connect` opens one backend per operator.
    pub fn new(backend: Arc<dyn Backend>, connect: BackendFactory) -> Self {
        Self {
            backend,
            sessions: SessionRegistry::new(connect),
            wizards: WizardRegistry::new(),
        }
    }

    /// The signed-in operator presenting this request's bearer token.
    pub(crate) async fn caller(&self, headers: &HeaderMap) -> Option<Caller> {
        self.sessions.caller(bearer_token(headers)?).await
    }

    /// Run the dashboard guard against the caller's own gate.
    pub(crate) async fn require(
        &self,
        headers: &HeaderMap,
        roles: &[Role],
    ) -> Result<Authorized, ApiError> {
        let Some(caller) = self.caller(headers).await else {
            return Err(ApiError::Guard(GuardDecision::RedirectToLogin));
        };
        match guard_dashboard(&caller.gate.state().await, roles) {
            GuardDecision::Allow(profile) => Ok(Authorized {
                profile,
                backend: caller.backend,
            }),
            other => Err(ApiError::Guard(other)),
        }
    }
}

pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Build the full API router.
pub fn app_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(session::routes())
        .merge(wizards::routes())
        .merge(seller::routes())
        .merge(dashboard::routes())
        .with_state(state)
}

/// CORS for the browser front-end. No origin configured means permissive.
pub fn cors_layer(origin: Option<&str>) -> Result<CorsLayer, ConfigError> {
    let Some(origin) = origin else {
        return Ok(CorsLayer::permissive());
    };
    let origin = HeaderValue::from_str(origin).map_err(|e| ConfigError::InvalidValue {
        key: "LIGHTKEEPER_CORS_ORIGIN".to_string(),
        message: e.to_string(),
    })?;
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]))
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "lightkeeper"
    }))
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use secrecy::SecretString;
    use serde_json::Value;
    use tokio::sync::broadcast;
    use tower::ServiceExt;

    use super::*;
    use crate::backend::{Filter, Select, Session, SessionEvent};
    use crate::error::{AuthError, BackendError};

    /// No session, no rows.
    struct EmptyBackend;

    #[async_trait]
    impl Backend for EmptyBackend {
        async fn get_session(&self) -> Result<Option<Session>, BackendError> {
            Ok(None)
        }
        fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
            broadcast::channel(1).1
        }
        async fn sign_in_with_password(
            &self,
            _email: &str,
            _password: &SecretString,
        ) -> Result<Session, AuthError> {
            Err(AuthError::InvalidCredentials)
        }
        async fn sign_out(&self) -> Result<(), BackendError> {
            Ok(())
        }
        async fn read_one(&self, _table: &str, _id: &str) -> Result<Option<Value>, BackendError> {
            Ok(None)
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

    fn app() -> Router {
        let backend: Arc<dyn Backend> = Arc::new(EmptyBackend);
        app_routes(AppState::new(
            backend,
            Arc::new(|| Arc::new(EmptyBackend) as Arc<dyn Backend>),
        ))
    }

    async fn send(request: Request<Body>) -> (StatusCode, Value) {
        let resp = app().oneshot(request).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn call(method: &str, uri: &str) -> (StatusCode, Value) {
        send(Request::builder().method(method).uri(uri).body(Body::empty()).unwrap()).await
    }

    #[tokio::test]
    async fn health_is_open() {
        let (status, json) = call("GET", "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["service"], "lightkeeper");
    }

    #[tokio::test]
    async fn dashboard_routes_need_a_session() {
        for uri in ["/api/properties", "/api/dashboard/stats", "/api/navigation"] {
            let (status, json) = call("GET", uri).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
            assert_eq!(json["redirect"], "/login");
        }
        let (status, _) = call("POST", "/api/session/profile/refresh").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unknown_bearer_token_is_anonymous() {
        let request = Request::builder()
            .uri("/api/properties")
            .header(header::AUTHORIZATION, "Bearer 0123456789abcdef")
            .body(Body::empty())
            .unwrap();
        let (status, json) = send(request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["redirect"], "/login");

        let (status, json) = call("GET", "/api/session").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["phase"], "unauthenticated");

        let (status, _) = call("POST", "/api/session/sign-out").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[test]
    fn bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(bearer_token(&headers), Some("abc"));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);
    }

    #[tokio::test]
    async fn seller_request_requires_contact_fields() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/seller-requests")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"name":"Dana","email":"dana@example.com"}"#))
            .unwrap();
        let (status, json) = send(request).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json["error"], "Missing required field: phone");
    }

    #[tokio::test]
    async fn wizard_is_open_to_visitors() {
        let (status, json) = call("POST", "/api/wizards").await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["step"], 1);
        assert_eq!(json["info"]["title"], "Home Buying Programs");
    }

    #[tokio::test]
    async fn property_routes_guard_before_parsing_ids() {
        let (status, _) = call("GET", "/api/properties/not-a-uuid").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn cors_origin_must_be_a_header_value() {
        assert!(cors_layer(None).is_ok());
        assert!(cors_layer(Some("https://lightkeeper.example")).is_ok());
        assert!(matches!(
            cors_layer(Some("bad\norigin")),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
