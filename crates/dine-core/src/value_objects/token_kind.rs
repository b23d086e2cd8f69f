//! Token kind selector for the token store

use serde::{Deserialize, Serialize};

/// Which member of the token pair an operation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    /// Fixed storage key for this token kind
    ///
    /// These names double as the http-only cookie names set by the edge
    /// layer, so the two storage locations stay recognizably paired.
    #[must_use]
    pub fn storage_key(self) -> &'static str {
        match self {
            Self::Access => "accessToken",
            Self::Refresh => "refreshToken",
        }
    }
}
