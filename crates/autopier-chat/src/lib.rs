// SPDX-FileCopyrightText: 2026 AutoPier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat, negotiation and order services for the AutoPier backend.
//!
//! This crate owns the domain logic on top of the storage layer: the
//! lifecycle manager for negotiations and orders (with field-keyed
//! validation), the message ledger orchestration that keeps the derived
//! chat-session index consistent, and the ephemeral typing-presence store
//! polled by clients.

pub mod service;
pub mod typing;
pub mod validation;

pub use service::{
    ChatService, ClientNegotiationSummary, ClientOrderSummary, ConversationRecord,
    NegotiationOverview, NewNegotiation, NewOrder, OrderOverview, QuickNegotiation,
    ReconnectQuery, ReconnectResult, STAFF_NAME,
};
pub use typing::{spawn_sweeper, TypingPresence, TypingStatus};
