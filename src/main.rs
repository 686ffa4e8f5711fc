//! Line chat server - Entry Point
//!
//! Binds the listener and serves until a listener-level error occurs.

use std::env;

use tracing_subscriber::EnvFilter;

use line_chat::{ChatServer, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=line_chat=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("line_chat=info")),
        )
        .init();

    // [addr] [nickname-file]
    let config = ServerConfig::from_args(env::args().skip(1));

    let server = ChatServer::bind(&config).await?;
    server.run().await?;

    Ok(())
}
