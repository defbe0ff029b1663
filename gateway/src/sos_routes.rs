//! SOS alert logging

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::error::{ApiError, ApiResult};
use crate::store::NewSosAlert;

pub fn sos_router() -> Router<AppState> {
    Router::new().route("/sos", post(log_sos))
}

#[derive(Deserialize)]
pub struct SosRequest {
    pub user_id: Option<i64>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub message: Option<String>,
    /// Client-side epoch seconds
    pub timestamp: Option<i64>,
}

#[derive(Serialize)]
pub struct SosResponse {
    pub message: String,
    pub id: i64,
}

pub async fn log_sos(
    State(state): State<AppState>,
    body: Result<Json<SosRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SosResponse>)> {
    let Json(req) = body?;
    let (Some(lat), Some(lng), Some(timestamp)) = (req.lat, req.lng, req.timestamp) else {
        return Err(ApiError::InvalidInput(
            "lat, lng and timestamp required".to_string(),
        ));
    };

    let alert = NewSosAlert {
        user_id: req.user_id,
        lat,
        lng,
        message: req.message,
        timestamp,
    };
    let id = state.store.insert_sos(&alert).await?;

    let sent_at = chrono::DateTime::from_timestamp(timestamp, 0)
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| timestamp.to_string());
    tracing::warn!(
        "SOS #{} at ({:.5}, {:.5}) user={:?} sent {}",
        id,
        lat,
        lng,
        alert.user_id,
        sent_at
    );

    Ok((
        StatusCode::CREATED,
        Json(SosResponse {
            message: "SOS logged".to_string(),
            id,
        }),
    ))
}
