//! Session, sign-in and navigation endpoints.
//!
//! Sign-in returns a token; later requests send it as a bearer token.

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use super::{ApiError, AppState, bearer_token};
use crate::auth::{GateSnapshot, GuardDecision, NavLink, navigation_for};

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/session", get(get_session))
        .route("/api/session/sign-in", post(sign_in))
        .route("/api/session/sign-out", post(sign_out))
        .route("/api/session/profile/refresh", post(refresh_profile))
        .route("/api/navigation", get(navigation))
}

async fn get_session(State(state): State<AppState>, headers: HeaderMap) -> Json<GateSnapshot> {
    match state.caller(&headers).await {
        Some(caller) => Json(caller.gate.snapshot().await),
        None => Json(GateSnapshot::signed_out()),
    }
}

#[derive(Deserialize)]
struct SignInRequest {
    email: String,
    password: String,
}

/// The caller's token plus their gate state.
#[derive(Serialize)]
struct SignedIn {
    token: String,
    #[serde(flatten)]
    session: GateSnapshot,
}

async fn sign_in(
    State(state): State<AppState>,
    Json(body): Json<SignInRequest>,
) -> Result<Json<SignedIn>, ApiError> {
    let password = SecretString::from(body.password);
    let (token, caller) = state.sessions.sign_in(body.email.trim(), &password).await?;
    Ok(Json(SignedIn {
        token,
        session: caller.gate.snapshot().await,
    }))
}

/// Ends only the caller's own session.
async fn sign_out(State(state): State<AppState>, headers: HeaderMap) -> Json<GateSnapshot> {
    if let Some(token) = bearer_token(&headers) {
        state.sessions.sign_out(token).await;
    }
    Json(GateSnapshot::signed_out())
}

/// Manual retry after a failed profile lookup.
async fn refresh_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<GateSnapshot>, ApiError> {
    let Some(caller) = state.caller(&headers).await else {
        return Err(ApiError::Guard(GuardDecision::RedirectToLogin));
    };
    caller.gate.refresh_profile().await;
    Ok(Json(caller.gate.snapshot().await))
}

#[derive(Deserialize)]
struct NavigationQuery {
    #[serde(default)]
    path: Option<String>,
}

#[derive(Serialize)]
struct NavigationView {
    title: &'static str,
    display_name: String,
    initial: char,
    links: Vec<NavLink>,
}

async fn navigation(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<NavigationQuery>,
) -> Result<Json<NavigationView>, ApiError> {
    let profile = state.require(&headers, &[]).await?.profile;
    let path = query.path.as_deref().unwrap_or("/dashboard");
    Ok(Json(NavigationView {
        title: profile.role.portal_title(),
        display_name: profile.display_name(),
        initial: profile.initial(),
        links: navigation_for(profile.role, path),
    }))
}
