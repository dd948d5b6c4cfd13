// rest_api/src/main.rs

// Entry point for the visit documentation REST API server. Loads
// configuration, wires up logging, and hands off to the library.

use anyhow::Result;
use rest_api::{load_config, start_server};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Pick up a local .env before reading configuration.
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = load_config()?;
    start_server(config).await
}
