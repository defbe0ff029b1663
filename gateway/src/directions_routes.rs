//! Walking directions via the external routing service

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use safety_grid::Coordinate;

use crate::app::AppState;
use crate::error::{ApiError, ApiResult};

const DEFAULT_PROFILE: &str = "foot";

pub fn directions_router() -> Router<AppState> {
    Router::new().route("/directions", get(directions))
}

#[derive(Deserialize)]
pub struct DirectionsQuery {
    pub start: String,
    pub end: String,
    pub profile: Option<String>,
}

/// Parse `"lat,lng"`
fn parse_point(name: &str, raw: &str) -> ApiResult<Coordinate> {
    let invalid = || ApiError::InvalidInput(format!("{} must be \"lat,lng\"", name));
    let (lat, lng) = raw.split_once(',').ok_or_else(invalid)?;
    let lat: f64 = lat.trim().parse().map_err(|_| invalid())?;
    let lng: f64 = lng.trim().parse().map_err(|_| invalid())?;
    let coord = Coordinate::new(lat, lng);
    if coord.is_finite() {
        Ok(coord)
    } else {
        Err(invalid())
    }
}

pub async fn directions(
    State(state): State<AppState>,
    query: Result<Query<DirectionsQuery>, QueryRejection>,
) -> ApiResult<Json<serde_json::Value>> {
    let Query(q) = query?;
    let start = parse_point("start", &q.start)?;
    let end = parse_point("end", &q.end)?;
    let profile = q.profile.as_deref().unwrap_or(DEFAULT_PROFILE);

    let route = state.routing.route(profile, start, end).await?;
    Ok(Json(route))
}
