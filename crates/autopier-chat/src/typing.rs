// SPDX-FileCopyrightText: 2026 AutoPier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ephemeral typing-presence store.
//!
//! A process-local map of "who is typing where", polled by clients on the
//! same cadence as messages. Entries are fresh for 5 seconds after the
//! last keystroke signal; reads check freshness themselves (no false
//! positives between sweeps) and a background sweep bounds memory growth.
//! Last write wins under concurrent signals for the same chat, which is
//! acceptable for a UX hint.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use autopier_core::{Clock, SystemClock};

/// Milliseconds after which a typing signal is considered stale.
pub const DEFAULT_STALE_MS: u64 = 5000;

/// Seconds between background sweeps of stale entries.
pub const DEFAULT_SWEEP_SECS: u64 = 10;

#[derive(Debug, Clone)]
struct TypingEntry {
    user_name: String,
    timestamp_ms: u64,
}

/// Typing status as reported to pollers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingStatus {
    pub typing: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
}

impl TypingStatus {
    fn idle() -> Self {
        Self {
            typing: false,
            user_name: None,
        }
    }
}

/// Shared in-memory typing-presence map keyed by chat id.
pub struct TypingPresence {
    entries: DashMap<String, TypingEntry>,
    clock: Arc<dyn Clock>,
    stale_after_ms: u64,
}

impl TypingPresence {
    /// Build a store with an injectable clock (tests simulate time passing
    /// without real delays).
    pub fn new(clock: Arc<dyn Clock>, stale_after_ms: u64) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
            stale_after_ms,
        }
    }

    /// Build a store on the wall clock with the default 5s freshness window.
    pub fn with_system_clock(stale_after_ms: u64) -> Self {
        Self::new(Arc::new(SystemClock), stale_after_ms)
    }

    /// Record that `user_name` is typing in `chat_id`. Overwrites any
    /// previous signal for the chat.
    pub fn set_typing(&self, chat_id: &str, user_name: &str) {
        self.entries.insert(
            chat_id.to_string(),
            TypingEntry {
                user_name: user_name.to_string(),
                timestamp_ms: self.clock.now_millis(),
            },
        );
    }

    /// Remove the typing signal for `chat_id` immediately.
    pub fn clear_typing(&self, chat_id: &str) {
        self.entries.remove(chat_id);
    }

    /// Current typing status for `chat_id`.
    ///
    /// Stale entries read as not-typing even before the sweep removes them.
    pub fn status(&self, chat_id: &str) -> TypingStatus {
        match self.entries.get(chat_id) {
            Some(entry) if self.is_fresh(entry.timestamp_ms) => TypingStatus {
                typing: true,
                user_name: Some(entry.user_name.clone()),
            },
            _ => TypingStatus::idle(),
        }
    }

    /// Drop all stale entries, returning how many were removed.
    pub fn sweep(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| self.is_fresh(entry.timestamp_ms));
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn is_fresh(&self, timestamp_ms: u64) -> bool {
        self.clock.now_millis().saturating_sub(timestamp_ms) < self.stale_after_ms
    }
}

/// Spawn the periodic garbage-collection pass over stale typing entries.
///
/// Runs until the cancellation token fires. The sweep is coarse by design;
/// read-time freshness checks keep results correct between passes.
pub fn spawn_sweeper(
    presence: Arc<TypingPresence>,
    interval: Duration,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // Skip the first immediate tick.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = presence.sweep();
                    if removed > 0 {
                        debug!(removed, "swept stale typing entries");
                    }
                }
                _ = cancel.cancelled() => {
                    info!("typing sweeper shutting down");
                    break;
                }
            }
        }
    })
}
