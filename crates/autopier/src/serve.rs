// SPDX-FileCopyrightText: 2026 AutoPier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `autopier serve` command implementation.
//!
//! Opens the SQLite store, builds the chat service and typing-presence
//! store, spawns the background typing sweeper, and runs the HTTP gateway
//! until a shutdown signal arrives. Shutdown drains in-flight requests,
//! stops the sweeper, and checkpoints the WAL.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use autopier_chat::{spawn_sweeper, ChatService, TypingPresence};
use autopier_config::AutopierConfig;
use autopier_core::{AutopierError, VehicleCatalog};
use autopier_gateway::{start_server, AppState, ServerConfig};
use autopier_storage::Database;

/// Runs the `autopier serve` command.
pub async fn run_serve(config: AutopierConfig) -> Result<(), AutopierError> {
    init_tracing(&config.service.log_level);

    info!(name = config.service.name.as_str(), "starting autopier serve");

    let db = Database::open_with(&config.storage.database_path, config.storage.wal_mode).await?;
    info!(path = config.storage.database_path.as_str(), "storage initialized");

    let chat = ChatService::new(db.clone(), Arc::new(VehicleCatalog::builtin()))
        .with_preview_length(config.chat.preview_length);
    let typing = Arc::new(TypingPresence::with_system_clock(config.chat.typing_stale_ms));

    // Install signal handler.
    let cancel = install_signal_handler();

    // Background garbage collection for stale typing entries.
    let sweeper = spawn_sweeper(
        typing.clone(),
        Duration::from_secs(config.chat.typing_sweep_secs),
        cancel.clone(),
    );
    info!(
        sweep_secs = config.chat.typing_sweep_secs,
        stale_ms = config.chat.typing_stale_ms,
        "typing sweeper started"
    );

    let server_config = ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
    };
    let state = AppState { chat, typing };
    start_server(&server_config, state, cancel.clone()).await?;

    // The server returned: either a signal fired or it failed; make sure
    // the background task stops either way.
    cancel.cancel();
    if let Err(e) = sweeper.await {
        error!(error = %e, "typing sweeper did not shut down cleanly");
    }
    db.close().await?;

    info!("autopier serve shutdown complete");
    Ok(())
}

/// Installs SIGINT/SIGTERM handlers that cancel the returned token.
fn install_signal_handler() -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = tokio::signal::ctrl_c() => {}
                        _ = sigterm.recv() => {}
                    }
                }
                Err(e) => {
                    error!(error = %e, "failed to install SIGTERM handler");
                    let _ = tokio::signal::ctrl_c().await;
                }
            }
        }
        #[cfg(not(unix))]
        {
            let _ = tokio::signal::ctrl_c().await;
        }
        info!("shutdown signal received");
        token.cancel();
    });
    cancel
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("autopier={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
