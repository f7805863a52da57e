//! `SyncBoard` server -- real-time shared task board.
//!
//! An axum server exposing the task board REST API and a WebSocket endpoint
//! over which all connected clients are kept in sync: every accepted
//! mutation fans out an invalidation signal, and any client's refresh pushes
//! the authoritative sorted snapshot to everyone.
//!
//! # Usage
//!
//! ```bash
//! # Run on default address 0.0.0.0:5000
//! cargo run --bin syncboard-server
//!
//! # Run on custom address
//! cargo run --bin syncboard-server -- --bind 127.0.0.1:8080
//!
//! # Or via environment variable
//! SYNCBOARD_ADDR=127.0.0.1:8080 cargo run --bin syncboard-server
//! ```

use std::sync::Arc;

use clap::Parser;
use syncboard_server::config::{ServerCliArgs, ServerConfig};
use syncboard_server::server::{self, AppState};
use syncboard_server::store::MemoryStore;

#[tokio::main]
async fn main() {
    let cli = ServerCliArgs::parse();

    // Load config from CLI args + config file + env vars + defaults.
    let config = match ServerConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            std::process::exit(1);
        }
    };

    // Initialize tracing with the resolved log level.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!(addr = %config.bind_addr, "starting syncboard server");

    let state = Arc::new(AppState::with_default_category(
        MemoryStore::new(),
        &config.default_category,
    ));

    // Any startup failure is fatal: log it and exit before serving.
    match server::start_server_with_state(&config.bind_addr, state).await {
        Ok((bound_addr, handle)) => {
            tracing::info!(addr = %bound_addr, "syncboard server listening");
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "server task failed");
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to start server");
            std::process::exit(1);
        }
    }
}
