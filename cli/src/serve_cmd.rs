//! `neo serve`

use anyhow::Context;
use clap::Parser;
use neo_api_server::{AppState, router, serve};
use neo_core::NeoConfig;
use tokio::net::TcpListener;

#[derive(Debug, Parser)]
pub struct ServeArgs {
    /// Listen address (default: server.bind)
    #[arg(long, value_name = "ADDR")]
    pub bind: Option<String>,
}

impl ServeArgs {
    pub async fn run(self, cfg: &NeoConfig) -> anyhow::Result<()> {
        let bind = self.bind.unwrap_or_else(|| cfg.server.bind.clone());

        tracing::info!(
            neo_version = neo_core::VERSION,
            %bind,
            db_path = %cfg.resolved_db_path().display(),
            "starting NEO API"
        );
        let state = AppState::from_config(cfg)?;
        let app = router(state, &cfg.server.cors_origins)?;
        let listener = TcpListener::bind(bind.as_str())
            .await
            .with_context(|| format!("failed to bind {bind}"))?;

        serve(listener, app).await?;
        Ok(())
    }
}
