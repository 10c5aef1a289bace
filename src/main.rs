//! Main entry point for the bls-data-downloader CLI

use bls_data_downloader::cli::{Cli, Commands};
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber with optional JSON formatting
fn init_tracing(verbose: bool, silence: bool) {
    let json_format = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let filter = if silence {
        EnvFilter::new("off")
    } else if verbose {
        EnvFilter::new("bls_data_downloader=debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("bls_data_downloader=info"))
    };

    if json_format {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.silence);

    let result = match cli.command {
        Commands::Download(ref args) => args.execute(&cli).await.map_err(|e| anyhow::anyhow!(e)),
        Commands::Validate(ref validate_cmd) => validate_cmd
            .execute(&cli.quota_file)
            .await
            .map_err(|e| anyhow::anyhow!(e)),
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);
        if cli.silence {
            eprintln!("Command failed: {e}");
        }
        std::process::exit(1);
    }
}
