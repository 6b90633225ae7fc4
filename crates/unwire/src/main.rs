//! Unwire CLI binary.

use anyhow::Result;
use tracing_subscriber::EnvFilter;
use unwire::cli::Cli;

/// Main entry point for the unwire CLI.
///
/// Runs on tokio's current_thread runtime. Only corpus and configuration
/// file access is asynchronous.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Controlled via RUST_LOG, e.g. RUST_LOG=unwire=debug
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("unwire=info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("Starting unwire CLI");

    let cli = Cli::parse_args();
    cli.execute().await?;

    tracing::debug!("Unwire CLI completed successfully");
    Ok(())
}
