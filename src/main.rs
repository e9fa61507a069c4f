//! Sandbox Explorer - Entry Point
//!
//! Serves a confined directory tree over a line-oriented console.

use log::{info, warn};

use sandbox_explorer::{Server, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize the logger (env_logger picks up RUST_LOG environment variable)
    env_logger::init();

    info!("Launching Sandbox Explorer...");

    let (startup, root) = ServerConfig::load()?.split()?;

    let root_path = root.get().await;
    if let Err(e) = tokio::fs::create_dir_all(root_path.as_path()).await {
        warn!("Failed to create root directory {}: {}", root_path.display(), e);
    } else {
        info!("Root directory: {}", root_path.display());
    }

    let server = Server::new(startup, root).await?;
    server.start().await;
    Ok(())
}
