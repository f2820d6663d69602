// SPDX-FileCopyrightText: 2026 AutoPier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types shared across the AutoPier workspace.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

/// Field-keyed validation errors, collected before any record is created.
///
/// Backed by a `BTreeMap` so iteration (and therefore JSON output and error
/// messages) is deterministic regardless of insertion order.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a validation failure for a field. The first message for a
    /// field wins; later ones for the same field are ignored.
    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_insert_with(|| message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Convert into `Err(AutopierError::Validation)` if any error was
    /// recorded, `Ok(())` otherwise.
    pub fn into_result(self) -> Result<(), AutopierError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AutopierError::Validation(self))
        }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

/// The primary error type used across all AutoPier crates.
#[derive(Debug, Error)]
pub enum AutopierError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Bad input shape; the request is rejected with no side effects.
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    /// The referenced record does not exist. Absence is a normal outcome
    /// for callers, not an exceptional one.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A scoped fetch supplied a phone that does not own the record.
    /// Reported distinctly from `NotFound`.
    #[error("access denied: {0}")]
    Forbidden(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AutopierError {
    /// Shorthand for a not-found result.
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }
}
