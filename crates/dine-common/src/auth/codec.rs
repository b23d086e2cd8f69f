//! Bearer token codec
//!
//! The backend is the authority on signature validity; the client only needs
//! the claims to make local scheduling and routing decisions. Decoding here
//! is therefore structural only: the signature is not verified and local
//! expiry is NOT enforced by the decoder, because callers (refresh
//! coordinator, route guard) do their own expiry arithmetic against the
//! claims. A malformed token is a hard error, never a silent default.

use chrono::{Duration, Utc};
use dine_core::Role;
use jsonwebtoken::{
    decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Claims carried by both members of the token pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (account or guest ID)
    pub sub: String,
    /// Session role
    pub role: Role,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Total validity window of the token in seconds
    #[must_use]
    pub fn window(&self) -> i64 {
        self.exp - self.iat
    }

    /// Seconds until expiry relative to `now` (negative once past)
    #[must_use]
    pub fn remaining(&self, now: i64) -> i64 {
        self.exp - now
    }
}

/// Token pair as delivered by the identity endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Decode a bearer token without verifying its signature
///
/// # Errors
/// Returns `AppError::InvalidToken` if the token is structurally malformed
/// or its payload does not carry the expected claims.
pub fn decode_unverified(token: &str) -> Result<Claims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;

    let data = decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map_err(|_| AppError::InvalidToken)?;

    Ok(data.claims)
}

/// HMAC token issuer
///
/// The real pair is minted by the backend; this issuer exists so unit tests
/// and the integration mock backend can produce structurally identical
/// tokens with controlled `iat`/`exp` values.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    access_token_expiry: i64,
    refresh_token_expiry: i64,
}

impl TokenIssuer {
    /// Create a new issuer with the given secret and expiry times (seconds)
    #[must_use]
    pub fn new(secret: &str, access_token_expiry: i64, refresh_token_expiry: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            access_token_expiry,
            refresh_token_expiry,
        }
    }

    /// Encode a token with explicit `iat`/`exp` claims
    ///
    /// # Errors
    /// Returns an error if token encoding fails.
    pub fn issue(
        &self,
        sub: impl Into<String>,
        role: Role,
        iat: i64,
        exp: i64,
    ) -> Result<String, AppError> {
        let claims = Claims {
            sub: sub.into(),
            role,
            iat,
            exp,
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|_| AppError::Internal(anyhow::anyhow!("Failed to encode token")))
    }

    /// Issue an access/refresh pair anchored at the current time
    ///
    /// # Errors
    /// Returns an error if token encoding fails.
    pub fn issue_pair(&self, sub: impl Into<String>, role: Role) -> Result<TokenPair, AppError> {
        let sub = sub.into();
        let now = Utc::now();
        let access_token = self.issue(
            sub.clone(),
            role,
            now.timestamp(),
            (now + Duration::seconds(self.access_token_expiry)).timestamp(),
        )?;
        let refresh_token = self.issue(
            sub,
            role,
            now.timestamp(),
            (now + Duration::seconds(self.refresh_token_expiry)).timestamp(),
        )?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("access_token_expiry", &self.access_token_expiry)
            .field("refresh_token_expiry", &self.refresh_token_expiry)
            .finish_non_exhaustive()
    }
}
