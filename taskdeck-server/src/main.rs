//! Taskdeck server -- per-owner task API over HTTP.
//!
//! # Usage
//!
//! ```bash
//! # In-memory store on the default address 127.0.0.1:3000
//! cargo run --bin taskdeck-server -- --session secret=alice
//!
//! # Persist to SQLite on a custom address
//! cargo run --bin taskdeck-server -- --bind 0.0.0.0:8080 --database tasks.sqlite3
//!
//! # Or via environment variables
//! TASKDECK_BIND=127.0.0.1:8080 TASKDECK_DATABASE=tasks.sqlite3 cargo run --bin taskdeck-server
//! ```

use std::sync::Arc;

use clap::Parser;
use taskdeck_server::config::{ServerCliArgs, ServerConfig, StorageConfig};
use taskdeck_server::server::{self, ServerState};
use taskdeck_server::store::{MemoryTaskStore, SqliteTaskStore, TaskStore};

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

    let sessions = config.bearer_sessions();
    if sessions.is_empty() {
        tracing::warn!("no sessions configured; every request will be rejected");
    }

    match &config.storage {
        StorageConfig::Memory => {
            tracing::info!(addr = %config.bind_addr, "starting taskdeck server (memory store)");
            serve(&config.bind_addr, ServerState::new(MemoryTaskStore::new(), sessions)).await;
        }
        StorageConfig::Sqlite(path) => {
            tracing::info!(
                addr = %config.bind_addr,
                path = %path.display(),
                "starting taskdeck server (sqlite store)"
            );
            let store = match SqliteTaskStore::open(path) {
                Ok(store) => store,
                Err(e) => {
                    tracing::error!(error = %e, path = %path.display(), "failed to open database");
                    std::process::exit(1);
                }
            };
            serve(&config.bind_addr, ServerState::new(store, sessions)).await;
        }
    }
}

async fn serve<S: TaskStore>(addr: &str, state: ServerState<S>) {
    match server::start_server_with_state(addr, Arc::new(state)).await {
        Ok((bound_addr, handle)) => {
            tracing::info!(addr = %bound_addr, "task server listening");
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "task server task failed");
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to start task server");
            std::process::exit(1);
        }
    }
}
