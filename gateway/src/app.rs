//! Shared state and router assembly

use axum::{extract::State, routing::get, Json, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use safety_scoring::SharedContext;

use crate::routing_api::RoutingApi;
use crate::store::Store;
use crate::{admin_routes, auth_routes, directions_routes, score_routes, sos_routes};

#[derive(Clone)]
pub struct AppState {
    pub scoring: SharedContext,
    pub store: Store,
    pub routing: Arc<RoutingApi>,
    pub admin_token: Option<Arc<str>>,
    pub password_iterations: u32,
}

pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(score_routes::score_router())
        .merge(auth_routes::auth_router())
        .merge(sos_routes::sos_router())
        .merge(directions_routes::directions_router())
        .nest("/admin", admin_routes::admin_router());

    Router::new()
        .route("/health", get(health))
        .nest("/api", api_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let ctx = state.scoring.current();
    let status = ctx.status();
    Json(serde_json::json!({
        "status": if status.model_loaded { "healthy" } else { "degraded" },
        "service": "safety-gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "model_loaded": status.model_loaded,
        "table_loaded": status.table_loaded,
        "cells": status.cells,
    }))
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use safety_grid::{cell_of, CellFeatures, Coordinate, FeatureTable, GridIndex};
    use safety_scoring::{ScoreModel, ScoringContext};
    use std::time::Duration;
    use tower::ServiceExt;

    /// One cell at (40.0010, -73.0010) → (crime 2, camera 5, police 1)
    pub fn scoring_context(with_model: bool) -> ScoringContext {
        let mut table = FeatureTable::new();
        table.insert(
            cell_of(Coordinate::new(40.0010, -73.0010)),
            CellFeatures::new(2.0, 5.0, 1.0),
        );
        let model = with_model.then(|| ScoreModel::new([-1.2, 0.6, 1.0], 5.0));
        ScoringContext::new(model, GridIndex::from_table(table))
    }

    pub fn state_with(ctx: ScoringContext, admin_token: Option<&str>) -> AppState {
        AppState {
            scoring: SharedContext::from_context(ctx),
            store: Store::in_memory().unwrap(),
            // Nothing listens on port 9; requests fail fast
            routing: Arc::new(
                RoutingApi::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap(),
            ),
            admin_token: admin_token.map(Arc::from),
            password_iterations: 1_000,
        }
    }

    pub fn test_state() -> AppState {
        state_with(scoring_context(true), None)
    }

    pub async fn send(
        state: &AppState,
        request: Request<Body>,
    ) -> (StatusCode, serde_json::Value) {
        let response = build_router(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, body)
    }

    pub fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    pub fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_health_reports_context() {
        let (status, body) = send(&test_state(), get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["model_loaded"], true);
        assert_eq!(body["cells"], 1);
    }

    #[tokio::test]
    async fn test_health_degraded_without_model() {
        let state = state_with(scoring_context(false), None);
        let (status, body) = send(&state, get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "degraded");
    }
}
