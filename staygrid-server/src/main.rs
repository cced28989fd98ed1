mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use staygrid_core::config::AppConfig;
use tokio::time::MissedTickBehavior;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::state::{AppState, FeedAggregator};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "staygrid=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("Could not load config")?;
    let state = AppState::new(&config)?;
    let refresh_every = config.refresh_interval()?;

    tokio::spawn(refresh_loop(Arc::clone(state.aggregator()), refresh_every));

    let app = app(state);
    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Could not bind {addr}"))?;
    tracing::info!(%addr, "staygrid-server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(routes::timelines::router())
        .merge(routes::grid::router())
        .merge(routes::sources::router())
        .merge(routes::properties::router())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Refresh every feed on a fixed period. The first tick fires immediately.
async fn refresh_loop(aggregator: Arc<FeedAggregator>, every: Duration) {
    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        let report = aggregator.refresh().await;
        if report.feeds_failed > 0 {
            tracing::warn!(
                failed = report.feeds_failed,
                version = report.version,
                "refresh finished with failing feeds"
            );
        }
    }
}
