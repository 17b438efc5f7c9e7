//! Staff dashboard endpoints: headline stats and property management.

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use super::{ApiError, AppState};
use crate::auth::guard::LISTING_ROLES;
use crate::dashboard::DashboardStats;
use crate::listings::{Property, PropertyFilter, PropertyForm, StatusCounts};

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/dashboard/stats", get(stats))
        .route("/api/properties", get(list_properties))
        .route(
            "/api/properties/{id}",
            get(get_property).put(update_property).delete(delete_property),
        )
}

fn parse_id(id: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id).map_err(|_| ApiError::BadRequest("Invalid property ID".into()))
}

async fn stats(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<DashboardStats>, ApiError> {
    let caller = state.require(&headers, &[]).await?;
    Ok(Json(DashboardStats::load(&caller.backend, Utc::now()).await))
}

#[derive(Serialize)]
struct PropertyList {
    properties: Vec<Property>,
    counts: StatusCounts,
    total: usize,
}

/// Counts cover every listing; `properties` is the filtered subset.
async fn list_properties(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(filter): Query<PropertyFilter>,
) -> Result<Json<PropertyList>, ApiError> {
    let caller = state.require(&headers, LISTING_ROLES).await?;
    let all = caller.listings().list().await?;
    let properties = filter.apply(&all).into_iter().cloned().collect();
    Ok(Json(PropertyList {
        counts: StatusCounts::tally(&all),
        total: all.len(),
        properties,
    }))
}

async fn get_property(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Property>, ApiError> {
    let caller = state.require(&headers, LISTING_ROLES).await?;
    Ok(Json(caller.listings().get(parse_id(&id)?).await?))
}

async fn update_property(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(form): Json<PropertyForm>,
) -> Result<Json<Property>, ApiError> {
    let caller = state.require(&headers, LISTING_ROLES).await?;
    let id = parse_id(&id)?;
    Ok(Json(caller.listings().update(id, &form, caller.profile.id).await?))
}

async fn delete_property(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let caller = state.require(&headers, LISTING_ROLES).await?;
    let id = parse_id(&id)?;
    caller.listings().delete(id, caller.profile.id).await?;
    Ok(Json(serde_json::json!({ "status": "deleted", "id": id })))
}
