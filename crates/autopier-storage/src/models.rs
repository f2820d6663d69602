// SPDX-FileCopyrightText: 2026 AutoPier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Record types for the four persisted collections.
//!
//! JSON field names follow the external wire layout (camelCase, with
//! `type` for the conversation/negotiation discriminators). Timestamps are
//! the canonical RFC 3339 strings produced by `autopier_core::now_rfc3339`.

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use autopier_core::{
    ConversationKind, ConversationRef, NegotiationKind, NegotiationStatus, OrderStatus,
    PaymentMethod, SenderClass, SessionStatus,
};

/// A checkout-originated purchase intent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub car_id: String,
    pub customer_name: String,
    /// Government ID, normalized to exactly 6 digits.
    pub customer_rg: String,
    /// Customer phone, normalized to digits.
    pub customer_phone: String,
    pub payment_method: PaymentMethod,
    pub installments: i64,
    pub selected_color: String,
    pub total_price: f64,
    pub status: OrderStatus,
    pub created_at: String,
    pub updated_at: String,
}

/// A customer-initiated discussion about buying or selling a vehicle.
///
/// The vehicle snapshot fields are populated for SELL negotiations, where
/// no catalog vehicle exists.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Negotiation {
    pub id: String,
    /// Catalog vehicle id, or `generic` when the discussion is not tied to
    /// a catalog vehicle.
    pub car_id: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: String,
    #[serde(rename = "type")]
    pub kind: NegotiationKind,
    pub status: NegotiationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_year: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_mileage: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proposed_price: Option<f64>,
    pub created_at: String,
    pub updated_at: String,
}

/// An atomic chat utterance. Append-only: never mutated or deleted.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: String,
    /// The parent conversation: exactly one negotiation or order.
    pub conversation: ConversationRef,
    pub content: String,
    pub sender: SenderClass,
    pub sender_name: String,
    pub created_at: String,
}

// On the wire a message carries `negotiationId` or `orderId` (exactly one),
// so the sum type serializes through a hand-written impl.
impl Serialize for Message {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("Message", 6)?;
        state.serialize_field("id", &self.id)?;
        match &self.conversation {
            ConversationRef::Negotiation(reference_id) => {
                state.serialize_field("negotiationId", reference_id)?;
            }
            ConversationRef::Order(reference_id) => {
                state.serialize_field("orderId", reference_id)?;
            }
        }
        state.serialize_field("content", &self.content)?;
        state.serialize_field("sender", &self.sender)?;
        state.serialize_field("senderName", &self.sender_name)?;
        state.serialize_field("createdAt", &self.created_at)?;
        state.end()
    }
}

/// Derived per-conversation summary used for dashboards and badges.
///
/// Not the source of truth for message content; kept in sync procedurally
/// by the chat service.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    pub id: String,
    #[serde(rename = "type")]
    pub conversation_type: ConversationKind,
    pub reference_id: String,
    pub client_id: String,
    pub client_name: String,
    pub client_phone: String,
    pub vehicle_name: String,
    pub vehicle_price: f64,
    pub status: SessionStatus,
    pub last_message_at: String,
    pub last_message_preview: String,
    pub unread_count: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl ChatSession {
    pub fn conversation(&self) -> ConversationRef {
        ConversationRef::new(self.conversation_type, self.reference_id.clone())
    }
}

/// Parse a TEXT column into one of the domain enums, surfacing a proper
/// conversion error instead of a panic on unexpected stored values.
pub(crate) fn parse_enum<T>(idx: usize, raw: String) -> rusqlite::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            format!("{e}: `{raw}`").into(),
        )
    })
}
