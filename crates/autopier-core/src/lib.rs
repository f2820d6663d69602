// SPDX-FileCopyrightText: 2026 AutoPier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the AutoPier dealership backend.
//!
//! This crate provides the error taxonomy, domain types (conversation
//! references, sender classes, lifecycle statuses), phone normalization,
//! the injectable clock used by ephemeral state, and the read-only vehicle
//! catalog collaborator. All other workspace crates build on these types.

pub mod catalog;
pub mod clock;
pub mod error;
pub mod phone;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use catalog::{Vehicle, VehicleCatalog};
pub use clock::{now_rfc3339, Clock, SystemClock};
pub use error::{AutopierError, ValidationErrors};
pub use phone::{normalize_phone, phones_match};
pub use types::{
    new_id, ConversationKind, ConversationRef, NegotiationKind, NegotiationStatus, OrderStatus,
    PaymentMethod, SenderClass, SessionStatus,
};
