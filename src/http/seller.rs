//! Seller lead endpoint. Open to anonymous visitors.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;

use super::{ApiError, AppState};
use crate::seller::{self, RequestType, SellerRequestForm};

pub(super) fn routes() -> Router<AppState> {
    Router::new().route("/api/seller-requests", post(create_request))
}

#[derive(Serialize)]
struct Received {
    status: &'static str,
    request_type: RequestType,
    message: &'static str,
}

async fn create_request(
    State(state): State<AppState>,
    Json(form): Json<SellerRequestForm>,
) -> Result<(StatusCode, Json<Received>), ApiError> {
    let request = seller::submit(&state.backend, &form).await?;
    Ok((
        StatusCode::CREATED,
        Json(Received {
            status: "received",
            request_type: request.request_type,
            message: seller::THANK_YOU,
        }),
    ))
}
