// SPDX-FileCopyrightText: 2026 AutoPier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for the AutoPier chat/negotiation core.
//!
//! Exposes the polling contract clients invoke on a 1.5-3s cadence:
//! full-list message reads, typing status, and active-chat lookups, plus
//! the mutating boundary operations (create negotiation/order, send
//! message, mark read, status updates). Handlers are thin: request
//! shaping, the phone-ownership check inputs, and error mapping live
//! here; domain rules live in `autopier-chat`.

pub mod chats;
pub mod clients;
pub mod error;
pub mod negotiations;
pub mod orders;
pub mod server;
pub mod typing;

pub use error::{ApiError, ApiResult};
pub use server::{router, start_server, AppState, ServerConfig};
