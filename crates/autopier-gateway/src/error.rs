// SPDX-FileCopyrightText: 2026 AutoPier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error-to-response mapping for the gateway.
//!
//! Validation failures become 400 with the field-keyed error map;
//! not-found and ownership mismatches map to 404 and 403 (deliberately
//! distinguishable); storage and internal failures become a generic 500
//! with the detail kept in the logs, never in the response body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use autopier_core::{AutopierError, ValidationErrors};

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Human-readable error description.
    pub error: String,
    /// Field-keyed validation failures, when applicable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<ValidationErrors>,
}

/// Newtype bridging `AutopierError` into an axum response.
#[derive(Debug)]
pub struct ApiError(pub AutopierError);

pub type ApiResult<T> = Result<T, ApiError>;

impl From<AutopierError> for ApiError {
    fn from(err: AutopierError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self.0 {
            AutopierError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: "Invalid input".to_string(),
                    errors: Some(errors),
                },
            ),
            AutopierError::NotFound { entity, .. } => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    error: format!("{entity} not found"),
                    errors: None,
                },
            ),
            AutopierError::Forbidden(message) => (
                StatusCode::FORBIDDEN,
                ErrorBody {
                    error: format!("Access denied. {message}"),
                    errors: None,
                },
            ),
            err => {
                error!(error = %err, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        error: "Internal error".to_string(),
                        errors: None,
                    },
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

/// Degrade a failed list read to an empty result.
///
/// Best-effort chat UIs should render an empty list rather than an error
/// screen when the store hiccups; the failure is logged instead.
pub fn empty_on_error<T>(result: Result<Vec<T>, AutopierError>, context: &'static str) -> Vec<T> {
    match result {
        Ok(items) => items,
        Err(err) => {
            error!(error = %err, context, "list read degraded to empty result");
            Vec::new()
        }
    }
}

/// Degrade only storage failures to an empty result, letting domain
/// outcomes (not-found, forbidden) keep their status codes.
pub fn degrade_storage<T>(
    result: Result<Vec<T>, AutopierError>,
    context: &'static str,
) -> Result<Vec<T>, ApiError> {
    match result {
        Ok(items) => Ok(items),
        Err(err @ AutopierError::Storage { .. }) => {
            error!(error = %err, context, "storage read degraded to empty result");
            Ok(Vec::new())
        }
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_serialize_with_field_map() {
        let mut errors = ValidationErrors::new();
        errors.push("rg", "RG must have exactly 6 digits");
        let body = ErrorBody {
            error: "Invalid input".to_string(),
            errors: Some(errors),
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains(r#""errors":{"rg":"RG must have exactly 6 digits"}"#));
    }

    #[test]
    fn plain_errors_omit_the_field_map() {
        let body = ErrorBody {
            error: "negotiation not found".to_string(),
            errors: None,
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(!json.contains("errors"));
    }

    #[test]
    fn empty_on_error_swallows_failures() {
        let failed: Result<Vec<i32>, AutopierError> = Err(AutopierError::Storage {
            source: Box::new(std::io::Error::other("disk gone")),
        });
        assert!(empty_on_error(failed, "test").is_empty());

        let ok: Result<Vec<i32>, AutopierError> = Ok(vec![1, 2]);
        assert_eq!(empty_on_error(ok, "test"), vec![1, 2]);
    }
}
