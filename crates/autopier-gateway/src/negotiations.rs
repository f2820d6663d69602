// SPDX-FileCopyrightText: 2026 AutoPier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Negotiation endpoints: creation, quick create-or-reuse, detail, status
//! updates, and the customer/staff message surfaces.

use std::str::FromStr;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use autopier_chat::{NegotiationOverview, NewNegotiation, QuickNegotiation};
use autopier_core::{
    AutopierError, ConversationRef, NegotiationKind, NegotiationStatus, SenderClass,
    ValidationErrors, Vehicle,
};
use autopier_storage::{Message, Negotiation};

use crate::error::{degrade_storage, empty_on_error, ApiResult};
use crate::server::AppState;

/// Request body for POST /v1/negotiations.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNegotiationRequest {
    #[serde(default, rename = "type")]
    pub kind: Option<NegotiationKind>,
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub customer_phone: String,
    #[serde(default)]
    pub customer_email: String,
    #[serde(default)]
    pub car_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub vehicle_interest: Option<String>,
    #[serde(default)]
    pub vehicle_name: Option<String>,
    #[serde(default)]
    pub vehicle_brand: Option<String>,
    #[serde(default)]
    pub vehicle_year: Option<i64>,
    #[serde(default)]
    pub vehicle_mileage: Option<i64>,
    #[serde(default)]
    pub vehicle_description: Option<String>,
    #[serde(default)]
    pub proposed_price: Option<f64>,
}

/// Response body for POST /v1/negotiations.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNegotiationResponse {
    pub id: String,
    pub status: NegotiationStatus,
}

/// POST /v1/negotiations
///
/// Creates the negotiation, its opening customer message, and its chat
/// session in one operation.
pub async fn create_negotiation(
    State(state): State<AppState>,
    Json(body): Json<CreateNegotiationRequest>,
) -> ApiResult<impl IntoResponse> {
    let negotiation = state
        .chat
        .create_negotiation(NewNegotiation {
            kind: body.kind,
            customer_name: body.customer_name,
            customer_phone: body.customer_phone,
            customer_email: body.customer_email,
            car_id: body.car_id,
            message: body.message,
            vehicle_interest: body.vehicle_interest,
            vehicle_name: body.vehicle_name,
            vehicle_brand: body.vehicle_brand,
            vehicle_year: body.vehicle_year,
            vehicle_mileage: body.vehicle_mileage,
            vehicle_description: body.vehicle_description,
            proposed_price: body.proposed_price,
        })
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateNegotiationResponse {
            id: negotiation.id,
            status: negotiation.status,
        }),
    ))
}

/// GET /v1/negotiations
///
/// Staff dashboard overview. Storage failures degrade to an empty list.
pub async fn list_negotiations(
    State(state): State<AppState>,
) -> Json<Vec<NegotiationOverview>> {
    Json(empty_on_error(
        state.chat.negotiation_overviews().await,
        "list negotiations",
    ))
}

/// Request body for POST /v1/negotiations/quick.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickNegotiationRequest {
    #[serde(default)]
    pub car_id: String,
    #[serde(default)]
    pub customer_phone: String,
    #[serde(default)]
    pub customer_name: Option<String>,
}

/// POST /v1/negotiations/quick
///
/// Create-or-reuse by (car, phone): 201 when a new negotiation was
/// created, 200 when an open one was reused.
pub async fn quick_negotiation(
    State(state): State<AppState>,
    Json(body): Json<QuickNegotiationRequest>,
) -> ApiResult<impl IntoResponse> {
    let quick = state
        .chat
        .quick_negotiation(
            &body.car_id,
            &body.customer_phone,
            body.customer_name.as_deref(),
        )
        .await?;
    let status = if quick.is_new {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json::<QuickNegotiation>(quick)))
}

/// Phone query for ownership-scoped reads.
#[derive(Debug, Deserialize)]
pub struct PhoneQuery {
    #[serde(default)]
    pub phone: Option<String>,
}

/// Response body for GET /v1/negotiations/{id}.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NegotiationDetail {
    #[serde(flatten)]
    pub negotiation: Negotiation,
    pub car: Vehicle,
    pub messages: Vec<Message>,
}

/// GET /v1/negotiations/{id}?phone=
///
/// Detail view with full message history. When a phone is supplied it
/// must own the negotiation.
pub async fn get_negotiation(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<PhoneQuery>,
) -> ApiResult<Json<NegotiationDetail>> {
    let conversation = ConversationRef::Negotiation(id.clone());
    let messages = state
        .chat
        .messages_for(&conversation, query.phone.as_deref())
        .await?;
    let negotiation = state
        .chat
        .get_negotiation(&id)
        .await?
        .ok_or_else(|| AutopierError::not_found("negotiation", id))?;
    let car = state.chat.vehicle_for_negotiation(&negotiation);
    Ok(Json(NegotiationDetail {
        negotiation,
        car,
        messages,
    }))
}

/// Request body for PATCH /v1/negotiations/{id}.
#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    #[serde(default)]
    pub status: String,
}

/// PATCH /v1/negotiations/{id}
///
/// Status update, validated against the known statuses; COMPLETED and
/// CANCELLED are terminal.
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<StatusUpdateRequest>,
) -> ApiResult<Json<Negotiation>> {
    let status = NegotiationStatus::from_str(body.status.trim()).map_err(|_| {
        let mut errors = ValidationErrors::new();
        errors.push("status", format!("unknown status `{}`", body.status));
        AutopierError::Validation(errors)
    })?;
    let negotiation = state.chat.update_negotiation_status(&id, status).await?;
    Ok(Json(negotiation))
}

/// GET /v1/negotiations/{id}/messages?phone=
///
/// The poll read: always the full ordered list; clients diff on length.
/// Storage hiccups degrade to an empty list instead of an error screen.
pub async fn get_messages(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<PhoneQuery>,
) -> ApiResult<Json<Vec<Message>>> {
    let conversation = ConversationRef::Negotiation(id);
    let messages = degrade_storage(
        state
            .chat
            .messages_for(&conversation, query.phone.as_deref())
            .await,
        "poll negotiation messages",
    )?;
    Ok(Json(messages))
}

/// Request body for message sends.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub sender: Option<SenderClass>,
    #[serde(default)]
    pub sender_name: Option<String>,
}

/// POST /v1/negotiations/{id}/messages
///
/// Send a message from either side; `sender` defaults to the customer.
pub async fn post_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<SendMessageRequest>,
) -> ApiResult<impl IntoResponse> {
    let conversation = ConversationRef::Negotiation(id);
    let message = state
        .chat
        .send_message(
            &conversation,
            &body.content,
            body.sender.unwrap_or(SenderClass::Customer),
            body.sender_name.as_deref(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}

/// GET /v1/dashboard/negotiations/{id}/messages
///
/// Staff read: returns the history and marks the conversation read.
pub async fn staff_get_messages(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<Message>>> {
    let conversation = ConversationRef::Negotiation(id);
    let messages = degrade_storage(
        state.chat.staff_messages(&conversation).await,
        "staff negotiation messages",
    )?;
    Ok(Json(messages))
}

/// POST /v1/dashboard/negotiations/{id}/messages
///
/// Staff reply; implicitly clears the unread counter.
pub async fn staff_post_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<SendMessageRequest>,
) -> ApiResult<impl IntoResponse> {
    let conversation = ConversationRef::Negotiation(id);
    let message = state
        .chat
        .send_message(
            &conversation,
            &body.content,
            SenderClass::Staff,
            body.sender_name.as_deref(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_accepts_minimal_body() {
        let json = r#"{"customerName": "Ana", "customerPhone": "11999998888"}"#;
        let req: CreateNegotiationRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.customer_name, "Ana");
        assert!(req.kind.is_none());
        assert!(req.car_id.is_none());
    }

    #[test]
    fn create_request_accepts_legacy_kind_names() {
        let json = r#"{"type": "VENDA", "customerName": "Ana", "customerPhone": "1"}"#;
        let req: CreateNegotiationRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.kind, Some(NegotiationKind::Sell));
    }

    #[test]
    fn send_message_request_defaults_to_customer() {
        let json = r#"{"content": "hello"}"#;
        let req: SendMessageRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.content, "hello");
        assert!(req.sender.is_none());

        let json = r#"{"content": "hi", "sender": "funcionario", "senderName": "Paulo"}"#;
        let req: SendMessageRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.sender, Some(SenderClass::Staff));
        assert_eq!(req.sender_name.as_deref(), Some("Paulo"));
    }
}
