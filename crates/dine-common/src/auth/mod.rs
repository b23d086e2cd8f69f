//! Token codec
//!
//! Structural decoding of bearer tokens and the HMAC issuer used by tests
//! and the integration mock backend.

mod codec;

pub use codec::{decode_unverified, Claims, TokenIssuer, TokenPair};
