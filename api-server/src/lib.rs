//! HTTP read API over the NEO store
//!
//! Routes:
//! - `GET /` status summary
//! - `GET /database/asteroids`, `/database/asteroids/ids`, `/database/asteroids/{id}`
//! - `GET /asteroids/{date}` live feed pass-through
//! - `POST /ai/report` narrative HTML report

#![deny(clippy::print_stdout, clippy::print_stderr)]

pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use neo_core::{AsteroidStore, FeedSource, NeoConfig, NeoError, NeoWsClient, Result};
use neo_report::{OpenAiNarrator, ReportAssembler, SvgChartRenderer};
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

pub use error::ApiError;

/// Shared handler state. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub store: AsteroidStore,
    pub feed: Arc<dyn FeedSource>,
    pub reports: ReportAssembler,
}

impl AppState {
    pub fn new(store: AsteroidStore, feed: Arc<dyn FeedSource>, reports: ReportAssembler) -> Self {
        Self {
            store,
            feed,
            reports,
        }
    }

    /// Production wiring: SQLite store, NeoWs client, SVG charts, chat-completions narrator
    pub fn from_config(cfg: &NeoConfig) -> Result<Self> {
        let store = AsteroidStore::open(cfg)?;
        let feed = Arc::new(NeoWsClient::new(&cfg.feed)?);
        let reports = ReportAssembler::new(
            store.clone(),
            Arc::new(SvgChartRenderer),
            Arc::new(OpenAiNarrator::new(&cfg.narrative)?),
        );
        Ok(Self::new(store, feed, reports))
    }
}

/// Build the router with CORS for `cors_origins`.
pub fn router(state: AppState, cors_origins: &[String]) -> Result<Router> {
    Ok(Router::new()
        .route("/", get(routes::root))
        .route("/database/asteroids", get(routes::list_asteroids))
        .route("/database/asteroids/ids", get(routes::list_asteroid_ids))
        .route("/database/asteroids/{asteroid_id}", get(routes::get_asteroid))
        .route("/asteroids/{date}", get(routes::feed_for_date))
        .route("/ai/report", post(routes::generate_report))
        .layer(cors_layer(cors_origins)?)
        .with_state(state))
}

/// Listed origins, with credentials; methods and headers mirror the request.
pub fn cors_layer(origins: &[String]) -> Result<CorsLayer> {
    let origins = origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin).map_err(|e| {
                NeoError::config_with_source(format!("invalid CORS origin {origin:?}"), e)
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request()))
}

/// Serve until Ctrl-C.
pub async fn serve(listener: TcpListener, app: Router) -> Result<()> {
    let addr = listener
        .local_addr()
        .map_err(|e| NeoError::internal(format!("listener has no local address: {e}")))?;
    tracing::info!(%addr, "NEO API ready");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| NeoError::internal(format!("HTTP server error: {e}")))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
