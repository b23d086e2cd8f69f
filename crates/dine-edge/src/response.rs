//! Response types and error handling for the edge endpoints
//!
//! The routing layer mirrors the backend: entity and generic HTTP errors
//! re-emit the same status and payload shape they arrived with.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use dine_client::ApiError;
use dine_common::AppError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Edge endpoint error
#[derive(Debug, Error)]
pub enum EdgeError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("{0}")]
    App(#[from] AppError),

    #[error("Internal server error")]
    Internal(#[source] anyhow::Error),
}

impl IntoResponse for EdgeError {
    fn into_response(self) -> Response {
        match self {
            Self::Api(ApiError::Validation { message, errors }) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "message": message, "errors": errors })),
            )
                .into_response(),

            Self::Api(ApiError::Auth) => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "message": "Authentication failed" })),
            )
                .into_response(),

            Self::Api(ApiError::Http { status, payload }) => (
                StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                Json(payload),
            )
                .into_response(),

            Self::Api(ApiError::Redirect(location)) => {
                Redirect::temporary(&location).into_response()
            }

            Self::Api(ApiError::Transport(message)) => (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "message": message })),
            )
                .into_response(),

            Self::App(app) => (
                StatusCode::from_u16(app.status_code())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                Json(json!({ "message": app.to_string() })),
            )
                .into_response(),

            Self::Internal(e) => {
                error!(error = %e, "Edge handler failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "message": "Internal server error" })),
                )
                    .into_response()
            }
        }
    }
}

/// Result type for edge handlers
pub type EdgeResult<T> = Result<T, EdgeError>;
