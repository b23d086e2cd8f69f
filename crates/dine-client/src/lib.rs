//! # dine-client
//!
//! The request executor: a bearer-authenticated HTTP wrapper over the
//! backend API and the same-origin routing layer, with the error taxonomy
//! the UI code branches on, plus the typed auth endpoint wrappers.

pub mod auth;
pub mod dto;
pub mod error;
pub mod request;

// Re-export commonly used types at crate root
pub use dto::{
    AuthData, AuthPayload, ChangePasswordRequest, GuestAuthData, GuestAuthPayload,
    GuestLoginRequest, LoginRequest, MessagePayload, RefreshTokenRequest,
};
pub use error::{ApiError, FieldError, AUTH_ERROR_STATUS, ENTITY_ERROR_STATUS};
pub use request::{ApiClient, ApiResponse, Body, RequestOptions};
