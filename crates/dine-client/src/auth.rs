//! Typed auth endpoint wrappers
//!
//! Browser-side identity calls go through the same-origin routing layer so
//! the http-only cookie pair stays in step with the token store; the store
//! itself is kept in sync by the executor's identity-endpoint mirroring.

use dine_core::TokenKind;
use dine_common::endpoints::local;
use reqwest::Method;
use tracing::instrument;
use validator::Validate;

use crate::dto::{
    AuthPayload, ChangePasswordRequest, GuestAuthPayload, GuestLoginRequest, LoginRequest,
    MessagePayload,
};
use crate::error::ApiError;
use crate::request::{ApiClient, RequestOptions};

impl ApiClient {
    /// Staff login
    ///
    /// # Errors
    /// `Validation` on client-side or backend field errors; the usual
    /// executor taxonomy otherwise.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn login(&self, request: &LoginRequest) -> Result<AuthPayload, ApiError> {
        request
            .validate()
            .map_err(|e| ApiError::from_validation(&e))?;

        let body = serde_json::to_value(request).map_err(|e| ApiError::Transport(e.to_string()))?;
        let response = self
            .execute(Method::POST, local::LOGIN, RequestOptions::json(body).with_base(""))
            .await?;

        serde_json::from_value(response.payload).map_err(|e| ApiError::Transport(e.to_string()))
    }

    /// Guest login from a scanned table QR code
    #[instrument(skip(self, request), fields(table = request.table_number))]
    pub async fn guest_login(
        &self,
        request: &GuestLoginRequest,
    ) -> Result<GuestAuthPayload, ApiError> {
        request
            .validate()
            .map_err(|e| ApiError::from_validation(&e))?;

        let body = serde_json::to_value(request).map_err(|e| ApiError::Transport(e.to_string()))?;
        let response = self
            .execute(
                Method::POST,
                local::GUEST_LOGIN,
                RequestOptions::json(body).with_base(""),
            )
            .await?;

        serde_json::from_value(response.payload).map_err(|e| ApiError::Transport(e.to_string()))
    }

    /// Logout through the routing layer (clears cookies and, via the
    /// executor's mirroring, the token store)
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<MessagePayload, ApiError> {
        let response = self
            .execute(
                Method::POST,
                local::LOGOUT,
                RequestOptions::default().with_base(""),
            )
            .await?;

        serde_json::from_value(response.payload).map_err(|e| ApiError::Transport(e.to_string()))
    }

    /// Change the account password; the backend rotates the token pair as a
    /// side effect, which is mirrored into the store here
    #[instrument(skip(self, request))]
    pub async fn change_password(
        &self,
        request: &ChangePasswordRequest,
    ) -> Result<AuthPayload, ApiError> {
        request
            .validate()
            .map_err(|e| ApiError::from_validation(&e))?;

        let body = serde_json::to_value(request).map_err(|e| ApiError::Transport(e.to_string()))?;
        let response = self
            .execute(
                Method::PUT,
                local::CHANGE_PASSWORD,
                RequestOptions::json(body).with_base(""),
            )
            .await?;

        let payload: AuthPayload = serde_json::from_value(response.payload)
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        // The rotated pair replaces the stored one.
        self.session()
            .store()
            .set(TokenKind::Access, &payload.data.access_token);
        self.session()
            .store()
            .set(TokenKind::Refresh, &payload.data.refresh_token);

        Ok(payload)
    }
}
