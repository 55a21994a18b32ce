//! `neo` command line
//!
//! ## Commands
//!
//! - `neo ingest` - pull a NeoWs feed window into the store
//! - `neo serve` - run the HTTP read API
//! - `neo show` - print normalized records from the store

pub mod ingest_cmd;
pub mod serve_cmd;
pub mod show_cmd;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use neo_core::NeoConfig;

use crate::ingest_cmd::IngestArgs;
use crate::serve_cmd::ServeArgs;
use crate::show_cmd::ShowArgs;

/// NEO feed ingestion, read API and reports
#[derive(Debug, Parser)]
#[command(name = "neo", version)]
pub struct Cli {
    /// Config file (default: $NEO_CONFIG, then ~/.config/neo/neo.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: NeoSubcommand,
}

#[derive(Debug, Subcommand)]
pub enum NeoSubcommand {
    /// Fetch a feed window from NeoWs and write it to the store
    Ingest(IngestArgs),

    /// Serve the HTTP API until Ctrl-C
    Serve(ServeArgs),

    /// Print normalized asteroids as JSON
    Show(ShowArgs),
}

impl Cli {
    /// Run the selected command and return the process exit code.
    pub async fn run(self) -> i32 {
        match self.execute().await {
            Ok(()) => 0,
            Err(err) => {
                eprintln!("error: {err:#}");
                1
            }
        }
    }

    async fn execute(self) -> anyhow::Result<()> {
        let cfg = NeoConfig::load(self.config.as_deref())?;
        tracing::debug!(
            db_path = %cfg.resolved_db_path().display(),
            feed = %cfg.feed.api_base,
            "configuration loaded"
        );
        match self.command {
            NeoSubcommand::Ingest(args) => args.run(&cfg).await,
            NeoSubcommand::Serve(args) => args.run(&cfg).await,
            NeoSubcommand::Show(args) => args.run(&cfg).await,
        }
    }
}
