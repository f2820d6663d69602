// SPDX-FileCopyrightText: 2026 AutoPier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules, one per persisted collection.

pub mod chat_sessions;
pub mod messages;
pub mod negotiations;
pub mod orders;
