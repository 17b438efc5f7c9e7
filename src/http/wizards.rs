//! Buyer preference wizard endpoints. Open to anonymous visitors.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::info;
use uuid::Uuid;

use super::{ApiError, AppState};
use crate::wizard::{Action, PreferenceWizard, WizardView};

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/wizards", post(create_wizard))
        .route("/api/wizards/{id}", get(get_wizard))
        .route("/api/wizards/{id}/actions", post(dispatch))
        .route("/api/wizards/{id}/next", post(next_step))
        .route("/api/wizards/{id}/previous", post(previous_step))
        .route("/api/wizards/{id}/submit", post(submit))
}

fn parse_id(id: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id).map_err(|_| ApiError::BadRequest("Invalid wizard ID".into()))
}

async fn find(state: &AppState, id: &str) -> Result<std::sync::Arc<PreferenceWizard>, ApiError> {
    Ok(state.wizards.get(parse_id(id)?).await?)
}

async fn create_wizard(State(state): State<AppState>) -> (StatusCode, Json<WizardView>) {
    let wizard = state.wizards.create(state.backend.clone()).await;
    info!(wizard_id = %wizard.id(), "Preference wizard started");
    (StatusCode::CREATED, Json(wizard.view().await))
}

async fn get_wizard(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<WizardView>, ApiError> {
    Ok(Json(find(&state, &id).await?.view().await))
}

async fn dispatch(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(action): Json<Action>,
) -> Result<Json<WizardView>, ApiError> {
    Ok(Json(find(&state, &id).await?.dispatch(action).await?))
}

async fn next_step(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<WizardView>, ApiError> {
    Ok(Json(find(&state, &id).await?.next().await?))
}

async fn previous_step(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<WizardView>, ApiError> {
    Ok(Json(find(&state, &id).await?.previous().await?))
}

async fn submit(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<WizardView>, ApiError> {
    Ok(Json(state.wizards.submit(parse_id(&id)?).await?))
}
