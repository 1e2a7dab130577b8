//! Linchpin CLI binary.

use anyhow::Result;
use linchpin::cli::Cli;
use tracing_subscriber::EnvFilter;

/// Main entry point for the linchpin CLI.
///
/// Every command is a short sequence of file reads and writes, so a
/// current_thread runtime is enough.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Example: RUST_LOG=linchpin=debug,linchpin_jsonl=trace linchpin validate
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("linchpin=info,linchpin_jsonl=info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("Starting linchpin CLI");

    let cli = Cli::parse_args();
    cli.execute().await?;

    tracing::debug!("Linchpin CLI completed successfully");
    Ok(())
}
