// SPDX-FileCopyrightText: 2026 AutoPier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Client-portal listings: a returning customer's negotiations and orders
//! with chat badges, keyed by phone.

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use autopier_chat::{ClientNegotiationSummary, ClientOrderSummary};
use autopier_core::{AutopierError, ValidationErrors};

use crate::error::{empty_on_error, ApiResult};
use crate::server::AppState;

/// Query for the client-portal listings. The phone is required here:
/// without it there is nothing to scope to.
#[derive(Debug, Deserialize)]
pub struct ClientQuery {
    #[serde(default)]
    pub phone: Option<String>,
}

fn require_phone(query: &ClientQuery) -> Result<&str, AutopierError> {
    match query.phone.as_deref().map(str::trim) {
        Some(phone) if !phone.is_empty() => Ok(phone),
        _ => {
            let mut errors = ValidationErrors::new();
            errors.push("phone", "phone is required");
            Err(AutopierError::Validation(errors))
        }
    }
}

/// GET /v1/clients/negotiations?phone=
pub async fn client_negotiations(
    State(state): State<AppState>,
    Query(query): Query<ClientQuery>,
) -> ApiResult<Json<Vec<ClientNegotiationSummary>>> {
    let phone = require_phone(&query)?;
    Ok(Json(empty_on_error(
        state.chat.client_negotiations(phone).await,
        "client negotiations",
    )))
}

/// GET /v1/clients/orders?phone=
pub async fn client_orders(
    State(state): State<AppState>,
    Query(query): Query<ClientQuery>,
) -> ApiResult<Json<Vec<ClientOrderSummary>>> {
    let phone = require_phone(&query)?;
    Ok(Json(empty_on_error(
        state.chat.client_orders(phone).await,
        "client orders",
    )))
}
