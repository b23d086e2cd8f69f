//! Request error taxonomy
//!
//! Every failure mode the UI branches on is a distinct variant, so the
//! branching is exhaustive instead of relying on runtime shape inspection:
//! entity-validation errors map onto form fields, authentication errors
//! have already triggered the coordinated logout by the time the caller
//! sees them, and the server-rendering context surfaces the logout
//! hand-back as an explicit redirect.

use serde::{Deserialize, Serialize};
use validator::ValidationErrors;

/// Status code reserved for entity/field-validation errors
pub const ENTITY_ERROR_STATUS: u16 = 422;

/// Status code reserved for "credentials invalid/expired"
pub const AUTH_ERROR_STATUS: u16 = 401;

/// One field of an entity-validation error
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Errors produced by the request executor
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Entity-validation failure (status 422); recoverable locally by
    /// mapping `errors` onto the individual form fields
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        errors: Vec<FieldError>,
    },

    /// Authentication failure (status 401); the coordinated logout side
    /// effect has already run, the original result is discarded
    #[error("Authentication failed")]
    Auth,

    /// Any other non-2xx response
    #[error("Request failed with status {status}")]
    Http {
        status: u16,
        payload: serde_json::Value,
    },

    /// Server-rendering context: hand control back to the routing layer
    #[error("Redirect required: {0}")]
    Redirect(String),

    /// The request never produced a response
    #[error("Transport error: {0}")]
    Transport(String),
}

impl ApiError {
    /// Build a validation error from client-side `validator` output, so
    /// local validation failures surface through the same taxonomy as the
    /// backend's entity errors
    #[must_use]
    pub fn from_validation(errors: &ValidationErrors) -> Self {
        let errors = errors
            .field_errors()
            .iter()
            .map(|(field, errs)| FieldError {
                field: (*field).to_string(),
                message: errs
                    .first()
                    .and_then(|e| e.message.as_ref())
                    .map_or_else(|| "Invalid value".to_string(), ToString::to_string),
            })
            .collect();

        Self::Validation {
            message: "Validation failed".to_string(),
            errors,
        }
    }

    /// Per-field errors of a validation failure, empty otherwise
    #[must_use]
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            Self::Validation { errors, .. } => errors,
            _ => &[],
        }
    }
}

/// Wire shape of the backend's entity-error payload
#[derive(Debug, Deserialize)]
pub(crate) struct EntityErrorPayload {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub errors: Vec<FieldError>,
}
