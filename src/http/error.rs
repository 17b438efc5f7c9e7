//! Error responses for the JSON API.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::auth::GuardDecision;
use crate::auth::guard::LOGIN_PATH;
use crate::error::{AuthError, BackendError, Error, ListingError, SellerRequestError, WizardError};

/// Anything a handler can fail with.
#[derive(Debug)]
pub enum ApiError {
    Core(Error),
    /// A guard decision other than `Allow`.
    Guard(GuardDecision),
    BadRequest(String),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self::Core(err)
    }
}

macro_rules! core_from {
    ($($source:ty),*) => {
        $(impl From<$source> for ApiError {
            fn from(err: $source) -> Self {
                Self::Core(err.into())
            }
        })*
    };
}

core_from!(AuthError, BackendError, ListingError, SellerRequestError, WizardError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Core(err) => {
                (err.status_code(), Json(json!({ "error": err.user_message() }))).into_response()
            }
            Self::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            Self::Guard(decision) => guard_response(decision),
        }
    }
}

fn guard_response(decision: GuardDecision) -> Response {
    let (status, body) = match decision {
        GuardDecision::Loading => (
            StatusCode::SERVICE_UNAVAILABLE,
            json!({ "error": "Session is still loading" }),
        ),
        GuardDecision::RedirectToLogin => (
            StatusCode::UNAUTHORIZED,
            json!({ "error": "Not signed in", "redirect": LOGIN_PATH }),
        ),
        GuardDecision::ProfileUnavailable => (
            StatusCode::SERVICE_UNAVAILABLE,
            json!({
                "error": "Your profile could not be loaded",
                "retry": "/api/session/profile/refresh"
            }),
        ),
        GuardDecision::Forbidden { role } => (
            StatusCode::FORBIDDEN,
            json!({ "error": format!("The {} role may not access this page", role.as_str()) }),
        ),
        GuardDecision::Allow(_) => (StatusCode::OK, json!({})),
    };
    (status, Json(body)).into_response()
}
