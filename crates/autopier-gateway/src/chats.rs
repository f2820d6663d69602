// SPDX-FileCopyrightText: 2026 AutoPier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Active-chat listings, the reconnect lookup for returning customers,
//! and the mark-as-read operation.

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use autopier_chat::{ReconnectQuery, ReconnectResult};
use autopier_core::{ConversationKind, ConversationRef};
use autopier_storage::ChatSession;

use crate::error::{empty_on_error, ApiResult};
use crate::server::AppState;

/// Query for GET /v1/chats/active.
#[derive(Debug, Deserialize)]
pub struct ActiveChatsQuery {
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub all: Option<String>,
}

/// Response body for GET /v1/chats/active.
#[derive(Debug, Serialize)]
pub struct ActiveChatsResponse {
    pub chats: Vec<ChatSession>,
}

/// GET /v1/chats/active?phone= | ?all=true
///
/// `all=true` is the staff dashboard listing; `phone` scopes to one
/// customer; neither yields an empty list. Failures degrade to empty.
pub async fn active_chats(
    State(state): State<AppState>,
    Query(query): Query<ActiveChatsQuery>,
) -> Json<ActiveChatsResponse> {
    let chats = if query.all.as_deref() == Some("true") {
        empty_on_error(state.chat.all_active_chats().await, "all active chats")
    } else if let Some(phone) = query.phone.as_deref() {
        empty_on_error(
            state.chat.active_chats_for_phone(phone).await,
            "active chats for phone",
        )
    } else {
        Vec::new()
    };
    Json(ActiveChatsResponse { chats })
}

/// Request body for POST /v1/chats/active (reconnect check).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconnectRequest {
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub negotiation_id: Option<String>,
    #[serde(default)]
    pub order_id: Option<String>,
}

/// Response body for POST /v1/chats/active.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconnectResponse {
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat: Option<ReconnectResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_chats: Option<usize>,
}

/// POST /v1/chats/active
///
/// Session-reconnect flow: look up by negotiation id, order id, or
/// phone (most recent chat first). `found: false` is a normal outcome.
pub async fn reconnect(
    State(state): State<AppState>,
    Json(body): Json<ReconnectRequest>,
) -> ApiResult<Json<ReconnectResponse>> {
    let query = if let Some(id) = body.negotiation_id {
        ReconnectQuery::Negotiation(id)
    } else if let Some(id) = body.order_id {
        ReconnectQuery::Order(id)
    } else if let Some(phone) = body.phone {
        ReconnectQuery::Phone(phone)
    } else {
        return Ok(Json(ReconnectResponse {
            found: false,
            chat: None,
            total_chats: None,
        }));
    };

    let result = state.chat.reconnect(query).await?;
    Ok(Json(match result {
        Some(chat) => ReconnectResponse {
            found: true,
            total_chats: chat.sibling_chats.as_ref().map(Vec::len),
            chat: Some(chat),
        },
        None => ReconnectResponse {
            found: false,
            chat: None,
            total_chats: None,
        },
    }))
}

/// Request body for POST /v1/chats/read.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadRequest {
    #[serde(rename = "type")]
    pub conversation_type: ConversationKind,
    pub reference_id: String,
}

/// Response body for POST /v1/chats/read.
#[derive(Debug, Serialize)]
pub struct MarkReadResponse {
    pub success: bool,
}

/// POST /v1/chats/read
///
/// Zero the unread counter. Absent sessions are a silent no-op.
pub async fn mark_read(
    State(state): State<AppState>,
    Json(body): Json<MarkReadRequest>,
) -> ApiResult<Json<MarkReadResponse>> {
    let conversation = ConversationRef::new(body.conversation_type, body.reference_id);
    state.chat.mark_read(&conversation).await?;
    Ok(Json(MarkReadResponse { success: true }))
}
