// SPDX-FileCopyrightText: 2026 AutoPier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Time sources.
//!
//! Persisted timestamps are RFC 3339 UTC strings with microsecond
//! precision and a trailing `Z`, so lexicographic order equals
//! chronological order and back-to-back writes practically never tie.
//! Ephemeral state (typing presence) takes a [`Clock`] so tests can
//! simulate time passing without real delays.

use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{SecondsFormat, Utc};

/// Current UTC time in the canonical persisted format,
/// e.g. `2026-08-06T14:03:21.412807Z`.
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Millisecond time source for ephemeral state.
pub trait Clock: Send + Sync + 'static {
    /// Milliseconds since the Unix epoch.
    fn now_millis(&self) -> u64;
}

/// The wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}
