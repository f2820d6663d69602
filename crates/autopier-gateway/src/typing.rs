// SPDX-FileCopyrightText: 2026 AutoPier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typing-presence endpoints, polled on the same cadence as messages.

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use autopier_chat::TypingStatus;
use autopier_core::{AutopierError, ValidationErrors};

use crate::error::ApiResult;
use crate::server::AppState;

/// Query for GET /v1/typing.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingQuery {
    #[serde(default)]
    pub chat_id: Option<String>,
}

/// GET /v1/typing?chatId=
///
/// A missing chat id reads as nobody-typing rather than an error; the
/// poller treats both the same way.
pub async fn typing_status(
    State(state): State<AppState>,
    Query(query): Query<TypingQuery>,
) -> Json<TypingStatus> {
    let status = match query.chat_id.as_deref() {
        Some(chat_id) => state.typing.status(chat_id),
        None => TypingStatus {
            typing: false,
            user_name: None,
        },
    };
    Json(status)
}

/// Request body for POST /v1/typing.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetTypingRequest {
    #[serde(default)]
    pub chat_id: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub typing: bool,
}

/// Response body for POST /v1/typing.
#[derive(Debug, Serialize)]
pub struct SetTypingResponse {
    pub success: bool,
}

/// POST /v1/typing
///
/// `typing: true` upserts the signal; `typing: false` clears it
/// immediately.
pub async fn set_typing(
    State(state): State<AppState>,
    Json(body): Json<SetTypingRequest>,
) -> ApiResult<Json<SetTypingResponse>> {
    let mut errors = ValidationErrors::new();
    if body.chat_id.trim().is_empty() {
        errors.push("chatId", "chatId is required");
    }
    if body.user_name.trim().is_empty() {
        errors.push("userName", "userName is required");
    }
    if !errors.is_empty() {
        return Err(AutopierError::Validation(errors).into());
    }

    if body.typing {
        state.typing.set_typing(&body.chat_id, &body.user_name);
    } else {
        state.typing.clear_typing(&body.chat_id);
    }
    Ok(Json(SetTypingResponse { success: true }))
}
