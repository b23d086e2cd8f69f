//! Auth request/response DTOs
//!
//! Wire shapes of the identity endpoints. The backend wraps every payload
//! as `{ data, message }`.

use dine_core::{Account, GuestSession};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Staff login request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email"))]
    pub email: String,
    #[validate(length(min = 6, max = 100, message = "Password must be 6-100 characters"))]
    pub password: String,
}

/// Guest login request (QR-code table token)
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GuestLoginRequest {
    #[validate(length(min = 2, max = 50, message = "Name must be 2-50 characters"))]
    pub name: String,
    pub table_number: i32,
    #[validate(length(min = 1, message = "Table token is required"))]
    pub token: String,
}

/// Change-password request; the backend rotates the token pair on success
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[validate(length(min = 6, max = 100, message = "Password must be 6-100 characters"))]
    pub old_password: String,
    #[validate(length(min = 6, max = 100, message = "Password must be 6-100 characters"))]
    pub password: String,
    #[validate(must_match(other = "password", message = "Passwords do not match"))]
    pub confirm_password: String,
}

/// Refresh request body
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

/// Token pair plus staff profile, as returned by login and change-password
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthData {
    pub access_token: String,
    pub refresh_token: String,
    pub account: Account,
}

/// Envelope of the staff identity endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthPayload {
    pub message: String,
    pub data: AuthData,
}

/// Token pair plus guest profile, as returned by guest login
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestAuthData {
    pub access_token: String,
    pub refresh_token: String,
    pub guest: GuestSession,
}

/// Envelope of the guest identity endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuestAuthPayload {
    pub message: String,
    pub data: GuestAuthData,
}

/// Message-only envelope (logout and friends)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagePayload {
    pub message: String,
}
