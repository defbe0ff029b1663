//! Context status and hot reload

use axum::{
    extract::State,
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use safety_scoring::ContextStatus;

use crate::app::AppState;
use crate::error::{ApiError, ApiResult};
use crate::password::constant_time_eq;

pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/reload", post(reload))
        .route("/status", get(status))
}

fn authorize(state: &AppState, headers: &HeaderMap) -> ApiResult<()> {
    let Some(expected) = state.admin_token.as_deref() else {
        return Ok(());
    };
    let supplied = headers
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if constant_time_eq(supplied.as_bytes(), expected.as_bytes()) {
        Ok(())
    } else {
        Err(ApiError::Unauthorized("invalid admin token".to_string()))
    }
}

pub async fn reload(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<ContextStatus>> {
    authorize(&state, &headers)?;
    let scoring = state.scoring.clone();
    // File IO and CSV parsing
    let status = tokio::task::spawn_blocking(move || scoring.reload())
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;
    Ok(Json(status))
}

pub async fn status(State(state): State<AppState>) -> Json<ContextStatus> {
    Json(state.scoring.current().status().clone())
}
