use anyhow::{Context, Result};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use safety_scoring::SharedContext;

mod admin_routes;
mod app;
mod auth_routes;
mod config;
mod directions_routes;
mod error;
mod password;
mod routing_api;
mod score_routes;
mod sos_routes;
mod store;

use app::AppState;
use config::GatewayConfig;
use routing_api::RoutingApi;
use store::Store;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "safety_gateway=debug,info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = GatewayConfig::from_env()?;

    // Scoring context; a missing model leaves the service up in degraded mode
    let scoring = SharedContext::load(config.context_paths());
    let ready = scoring.current().is_ready();
    if !ready {
        tracing::warn!("   Scoring disabled until a model is loaded via /api/admin/reload");
    }

    let store = Store::open(&config.db_path)
        .with_context(|| format!("failed to open database {:?}", config.db_path))?;
    tracing::info!("   Database at {}", config.db_path.display());

    let routing = RoutingApi::new(config.routing_url.clone(), config.routing_timeout)?;
    tracing::info!("   Routing service: {}", config.routing_url);

    if config.admin_token.is_none() {
        tracing::warn!("   SAFEWALK_ADMIN_TOKEN unset, admin routes are open");
    }

    let state = AppState {
        scoring,
        store,
        routing: Arc::new(routing),
        admin_token: config.admin_token.as_deref().map(Arc::from),
        password_iterations: config.password_iterations,
    };

    let app = app::build_router(state);

    let addr = config.addr();
    tracing::info!("SafeWalk gateway starting on {}", addr);
    tracing::info!(
        "   Model: {} ({})",
        config.model_path.display(),
        if ready { "loaded" } else { "missing" }
    );
    tracing::info!("   Grid features: {}", config.grid_path.display());

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
