// SPDX-FileCopyrightText: 2026 AutoPier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use autopier_chat::{ChatService, TypingPresence};
use autopier_core::AutopierError;

use crate::{chats, clients, negotiations, orders, typing};

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Domain service over the durable store.
    pub chat: ChatService,
    /// Ephemeral typing-presence map.
    pub typing: Arc<TypingPresence>,
}

/// Gateway server configuration (mirrors `ServerConfig` from
/// `autopier-config` to avoid a config dependency here).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
}

/// Response body for `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Health status string.
    pub status: String,
    /// Binary version.
    pub version: String,
}

/// GET /health
async fn get_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Build the gateway router over the shared state.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(get_health))
        .route(
            "/v1/negotiations",
            post(negotiations::create_negotiation).get(negotiations::list_negotiations),
        )
        .route("/v1/negotiations/quick", post(negotiations::quick_negotiation))
        .route(
            "/v1/negotiations/{id}",
            get(negotiations::get_negotiation).patch(negotiations::update_status),
        )
        .route(
            "/v1/negotiations/{id}/messages",
            get(negotiations::get_messages).post(negotiations::post_message),
        )
        .route(
            "/v1/dashboard/negotiations/{id}/messages",
            get(negotiations::staff_get_messages).post(negotiations::staff_post_message),
        )
        .route("/v1/orders", post(orders::create_order).get(orders::list_orders))
        .route(
            "/v1/orders/{id}",
            get(orders::get_order).patch(orders::update_status),
        )
        .route(
            "/v1/orders/{id}/messages",
            get(orders::get_messages).post(orders::post_message),
        )
        .route(
            "/v1/dashboard/orders/{id}/messages",
            get(orders::staff_get_messages).post(orders::staff_post_message),
        )
        .route(
            "/v1/chats/active",
            get(chats::active_chats).post(chats::reconnect),
        )
        .route("/v1/chats/read", post(chats::mark_read))
        .route(
            "/v1/typing",
            get(typing::typing_status).post(typing::set_typing),
        )
        .route("/v1/clients/negotiations", get(clients::client_negotiations))
        .route("/v1/clients/orders", get(clients::client_orders))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the gateway HTTP server.
///
/// Binds to the configured host:port and serves until the cancellation
/// token fires, then finishes in-flight requests and returns.
pub async fn start_server(
    config: &ServerConfig,
    state: AppState,
    cancel: CancellationToken,
) -> Result<(), AutopierError> {
    let app = router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AutopierError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .map_err(|e| AutopierError::Internal(format!("gateway server error: {e}")))?;

    Ok(())
}
