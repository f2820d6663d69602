// SPDX-FileCopyrightText: 2026 AutoPier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Order endpoints: checkout, listings, detail with payment breakdown,
//! status updates, and the order chat surfaces.

use std::str::FromStr;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use autopier_chat::{NewOrder, OrderOverview};
use autopier_core::{
    AutopierError, ConversationRef, OrderStatus, SenderClass, ValidationErrors, Vehicle,
};
use autopier_storage::{Message, Order};

use crate::error::{degrade_storage, empty_on_error, ApiResult};
use crate::negotiations::{PhoneQuery, SendMessageRequest, StatusUpdateRequest};
use crate::server::AppState;

/// Request body for POST /v1/orders (checkout).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub car_id: String,
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub customer_rg: String,
    #[serde(default)]
    pub customer_phone: String,
    #[serde(default)]
    pub payment_method: String,
    #[serde(default)]
    pub installments: Option<i64>,
    #[serde(default)]
    pub selected_color: Option<String>,
    #[serde(default)]
    pub total_price: f64,
}

/// Response body for POST /v1/orders.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderResponse {
    pub success: bool,
    pub order_id: String,
}

/// POST /v1/orders
///
/// Validates the checkout form and creates the order with its chat
/// session. Validation failures return the field-keyed error map and
/// create nothing.
pub async fn create_order(
    State(state): State<AppState>,
    Json(body): Json<CreateOrderRequest>,
) -> ApiResult<impl IntoResponse> {
    let order = state
        .chat
        .create_order(NewOrder {
            car_id: body.car_id,
            customer_name: body.customer_name,
            customer_rg: body.customer_rg,
            customer_phone: body.customer_phone,
            payment_method: body.payment_method,
            installments: body.installments,
            selected_color: body.selected_color,
            total_price: body.total_price,
        })
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateOrderResponse {
            success: true,
            order_id: order.id,
        }),
    ))
}

/// GET /v1/orders
///
/// Staff dashboard overview. Storage failures degrade to an empty list.
pub async fn list_orders(State(state): State<AppState>) -> Json<Vec<OrderOverview>> {
    Json(empty_on_error(
        state.chat.order_overviews().await,
        "list orders",
    ))
}

/// Response body for GET /v1/orders/{id}.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub car: Vehicle,
    /// Per-installment value; equals the total for single payments.
    pub installment_value: f64,
}

/// GET /v1/orders/{id}?phone=
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<PhoneQuery>,
) -> ApiResult<Json<OrderDetail>> {
    let order = state
        .chat
        .get_order(&id)
        .await?
        .ok_or_else(|| AutopierError::not_found("order", id))?;
    if let Some(phone) = query.phone.as_deref() {
        if !autopier_core::phones_match(phone, &order.customer_phone) {
            return Err(AutopierError::Forbidden(
                "this order belongs to another customer".to_string(),
            )
            .into());
        }
    }
    let car = state.chat.catalog().lookup(&order.car_id);
    let installment_value = if order.installments > 1 {
        order.total_price / order.installments as f64
    } else {
        order.total_price
    };
    Ok(Json(OrderDetail {
        order,
        car,
        installment_value,
    }))
}

/// PATCH /v1/orders/{id}
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<StatusUpdateRequest>,
) -> ApiResult<Json<Order>> {
    let status = OrderStatus::from_str(body.status.trim()).map_err(|_| {
        let mut errors = ValidationErrors::new();
        errors.push("status", format!("unknown status `{}`", body.status));
        AutopierError::Validation(errors)
    })?;
    let order = state.chat.update_order_status(&id, status).await?;
    Ok(Json(order))
}

/// GET /v1/orders/{id}/messages?phone=
pub async fn get_messages(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<PhoneQuery>,
) -> ApiResult<Json<Vec<Message>>> {
    let conversation = ConversationRef::Order(id);
    let messages = degrade_storage(
        state
            .chat
            .messages_for(&conversation, query.phone.as_deref())
            .await,
        "poll order messages",
    )?;
    Ok(Json(messages))
}

/// POST /v1/orders/{id}/messages
pub async fn post_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<SendMessageRequest>,
) -> ApiResult<impl IntoResponse> {
    let conversation = ConversationRef::Order(id);
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

/// GET /v1/dashboard/orders/{id}/messages
pub async fn staff_get_messages(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<Message>>> {
    let conversation = ConversationRef::Order(id);
    let messages = degrade_storage(
        state.chat.staff_messages(&conversation).await,
        "staff order messages",
    )?;
    Ok(Json(messages))
}

/// POST /v1/dashboard/orders/{id}/messages
pub async fn staff_post_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<SendMessageRequest>,
) -> ApiResult<impl IntoResponse> {
    let conversation = ConversationRef::Order(id);
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
