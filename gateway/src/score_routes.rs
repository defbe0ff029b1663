//! Point and route safety scoring endpoints

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use safety_grid::Coordinate;

use crate::app::AppState;
use crate::error::{ApiError, ApiResult};

pub fn score_router() -> Router<AppState> {
    Router::new()
        .route("/safety-score", post(safety_score))
        .route("/score-route", post(score_route))
}

// ---- Request/Response types ----

#[derive(Deserialize)]
pub struct PointRequest {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

impl PointRequest {
    fn coordinate(&self) -> ApiResult<Coordinate> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Ok(Coordinate::new(lat, lng)),
            _ => Err(ApiError::InvalidInput("lat & lng required".to_string())),
        }
    }
}

#[derive(Serialize)]
pub struct PointResponse {
    pub safety_score: f64,
}

#[derive(Deserialize)]
pub struct RouteRequest {
    pub coords: Option<Vec<[f64; 2]>>,
}

#[derive(Serialize)]
pub struct RouteResponse {
    pub score: f64,
    pub segments: Vec<f64>,
}

// ---- Handlers ----

pub async fn safety_score(
    State(state): State<AppState>,
    body: Result<Json<PointRequest>, JsonRejection>,
) -> ApiResult<Json<PointResponse>> {
    let Json(req) = body?;
    let coord = req.coordinate()?;

    let ctx = state.scoring.current();
    let safety_score = ctx.engine().score_coordinate(coord)?;

    Ok(Json(PointResponse { safety_score }))
}

pub async fn score_route(
    State(state): State<AppState>,
    body: Result<Json<RouteRequest>, JsonRejection>,
) -> ApiResult<Json<RouteResponse>> {
    let Json(req) = body?;
    let coords: Vec<Coordinate> = req
        .coords
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::InvalidInput("coords required".to_string()))?
        .into_iter()
        .map(Coordinate::from)
        .collect();

    let ctx = state.scoring.current();
    let route = ctx.engine().score_route(&coords)?;

    tracing::debug!(
        "Route of {} points scored on {} samples: {:.2}",
        coords.len(),
        route.scored_points,
        route.score
    );

    Ok(Json(RouteResponse {
        score: route.score,
        segments: route.segments,
    }))
}
