// SPDX-FileCopyrightText: 2026 AutoPier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common domain types used across the AutoPier workspace.
//!
//! Wire vocabulary is fixed: sender classes serialize as `cliente` /
//! `funcionario`, conversation types as `negotiation` / `order`, lifecycle
//! statuses as upper snake case. Legacy Portuguese aliases are accepted on
//! input only.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Generate an opaque record identifier with a readable prefix,
/// e.g. `neg-6f9619ff-8b86-d011-b42d-00c04fc964ff`.
///
/// Ids are opaque to clients; ordering guarantees come from timestamps,
/// never from id comparison.
pub fn new_id(prefix: &str) -> String {
    format!("{prefix}-{}", uuid::Uuid::new_v4())
}

/// Which collection a conversation's parent record lives in.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ConversationKind {
    Negotiation,
    Order,
}

/// A message's parent conversation: exactly one of a negotiation or an
/// order, by construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConversationRef {
    Negotiation(String),
    Order(String),
}

impl ConversationRef {
    pub fn new(kind: ConversationKind, reference_id: impl Into<String>) -> Self {
        match kind {
            ConversationKind::Negotiation => Self::Negotiation(reference_id.into()),
            ConversationKind::Order => Self::Order(reference_id.into()),
        }
    }

    pub fn kind(&self) -> ConversationKind {
        match self {
            Self::Negotiation(_) => ConversationKind::Negotiation,
            Self::Order(_) => ConversationKind::Order,
        }
    }

    pub fn reference_id(&self) -> &str {
        match self {
            Self::Negotiation(id) | Self::Order(id) => id,
        }
    }
}

impl std::fmt::Display for ConversationRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.kind(), self.reference_id())
    }
}

/// Who authored a chat message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum SenderClass {
    #[strum(serialize = "cliente")]
    #[serde(rename = "cliente")]
    Customer,
    #[strum(serialize = "funcionario")]
    #[serde(rename = "funcionario")]
    Staff,
}

impl SenderClass {
    pub fn is_customer(self) -> bool {
        matches!(self, Self::Customer)
    }
}

/// What a negotiation is about, from the customer's perspective.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum NegotiationKind {
    #[strum(to_string = "BUY", serialize = "COMPRA")]
    #[serde(rename = "BUY", alias = "COMPRA")]
    Buy,
    #[strum(to_string = "SELL", serialize = "VENDA", serialize = "TROCA")]
    #[serde(rename = "SELL", alias = "VENDA", alias = "TROCA")]
    Sell,
}

/// Negotiation lifecycle.
///
/// Created `PENDING`; the first reply from either side moves it to
/// `IN_PROGRESS`; `COMPLETED` and `CANCELLED` are terminal and only reached
/// via explicit staff action.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NegotiationStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl NegotiationStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

/// Order lifecycle: `PENDING` -> `PROCESSING` -> `COMPLETED`, or
/// `CANCELLED` from any non-terminal state.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Processing,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

/// Payment method selected at checkout. Installments above 1 are only
/// valid for `CREDIT_CARD`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum PaymentMethod {
    #[strum(serialize = "PIX")]
    #[serde(rename = "PIX")]
    Pix,
    #[strum(to_string = "CASH", serialize = "DINHEIRO")]
    #[serde(rename = "CASH", alias = "DINHEIRO")]
    Cash,
    #[strum(to_string = "CREDIT_CARD", serialize = "CARTAO_CREDITO")]
    #[serde(rename = "CREDIT_CARD", alias = "CARTAO_CREDITO")]
    CreditCard,
}

/// Chat session status as shown on dashboards: `waiting_response` after a
/// client message, `active` after a staff reply or read-mark, `closed`
/// sessions stay queryable but drop out of active listings.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    WaitingResponse,
    Closed,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn new_ids_are_prefixed_and_unique() {
        let a = new_id("msg");
        let b = new_id("msg");
        assert!(a.starts_with("msg-"));
        assert_ne!(a, b);
    }

    #[test]
    fn conversation_ref_exposes_kind_and_id() {
        let conversation = ConversationRef::new(ConversationKind::Order, "ord-1");
        assert_eq!(conversation.kind(), ConversationKind::Order);
        assert_eq!(conversation.reference_id(), "ord-1");
        assert_eq!(conversation.to_string(), "order/ord-1");
    }

    #[test]
    fn sender_class_wire_names() {
        assert_eq!(SenderClass::Customer.to_string(), "cliente");
        assert_eq!(SenderClass::Staff.to_string(), "funcionario");
        assert_eq!(
            SenderClass::from_str("funcionario").unwrap(),
            SenderClass::Staff
        );
        let json = serde_json::to_string(&SenderClass::Customer).unwrap();
        assert_eq!(json, r#""cliente""#);
    }

    #[test]
    fn negotiation_kind_accepts_legacy_aliases() {
        assert_eq!(NegotiationKind::from_str("BUY").unwrap(), NegotiationKind::Buy);
        assert_eq!(NegotiationKind::from_str("COMPRA").unwrap(), NegotiationKind::Buy);
        assert_eq!(NegotiationKind::from_str("VENDA").unwrap(), NegotiationKind::Sell);
        assert_eq!(NegotiationKind::from_str("TROCA").unwrap(), NegotiationKind::Sell);
        // Output side never uses the aliases.
        assert_eq!(NegotiationKind::Sell.to_string(), "SELL");

        let parsed: NegotiationKind = serde_json::from_str(r#""COMPRA""#).unwrap();
        assert_eq!(parsed, NegotiationKind::Buy);
    }

    #[test]
    fn payment_method_accepts_legacy_aliases() {
        assert_eq!(PaymentMethod::from_str("CASH").unwrap(), PaymentMethod::Cash);
        assert_eq!(
            PaymentMethod::from_str("DINHEIRO").unwrap(),
            PaymentMethod::Cash
        );
        assert_eq!(
            PaymentMethod::from_str("CARTAO_CREDITO").unwrap(),
            PaymentMethod::CreditCard
        );
        assert_eq!(PaymentMethod::CreditCard.to_string(), "CREDIT_CARD");
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            NegotiationStatus::Pending,
            NegotiationStatus::InProgress,
            NegotiationStatus::Completed,
            NegotiationStatus::Cancelled,
        ] {
            let parsed = NegotiationStatus::from_str(&status.to_string()).unwrap();
            assert_eq!(parsed, status);
        }
        assert_eq!(NegotiationStatus::InProgress.to_string(), "IN_PROGRESS");
        assert_eq!(SessionStatus::WaitingResponse.to_string(), "waiting_response");
    }

    #[test]
    fn terminal_statuses() {
        assert!(NegotiationStatus::Completed.is_terminal());
        assert!(NegotiationStatus::Cancelled.is_terminal());
        assert!(!NegotiationStatus::Pending.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::Processing.is_terminal());
    }
}
