//! GridWatch Theft Scoring Service - Main Entry Point

use api::{init_logging, run_server, Settings};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    info!("=== GridWatch Theft Scoring v{} ===", env!("CARGO_PKG_VERSION"));
    let settings = Settings::load()?;
    run_server(settings).await
}
