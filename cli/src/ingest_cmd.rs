//! `neo ingest`

use chrono::NaiveDate;
use clap::Parser;
use neo_core::config::MAX_FEED_WINDOW_DAYS;
use neo_core::{AsteroidStore, IngestWindow, NeoConfig, NeoWsClient, run_ingestion};

#[derive(Debug, Parser)]
pub struct IngestArgs {
    /// Days before the end date to include (default: feed.window_days)
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=i64::from(MAX_FEED_WINDOW_DAYS)))]
    pub days: Option<u32>,

    /// Last day of the window (default: today)
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub end_date: Option<NaiveDate>,
}

impl IngestArgs {
    pub fn window(&self, cfg: &NeoConfig) -> IngestWindow {
        let days = self.days.unwrap_or(cfg.feed.window_days);
        match self.end_date {
            Some(end) => IngestWindow::ending_on(end, days),
            None => IngestWindow::ending_today(days),
        }
    }

    /// Prints the ingestion report as JSON on success.
    pub async fn run(self, cfg: &NeoConfig) -> anyhow::Result<()> {
        let window = self.window(cfg);
        let store = AsteroidStore::open(cfg)?;
        let client = NeoWsClient::new(&cfg.feed)?;

        tracing::info!(%window, "starting ingestion run");
        let report = run_ingestion(&store, &client, window).await?;
        println!("{}", serde_json::to_string_pretty(&report)?);
        Ok(())
    }
}
