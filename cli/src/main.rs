use clap::Parser;
use neo_cli::Cli;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // A missing .env is normal outside development.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    std::process::exit(cli.run().await);
}
