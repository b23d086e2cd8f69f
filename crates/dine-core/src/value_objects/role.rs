//! Session role carried inside token claims
//!
//! The backend issues tokens for two identity domains: staff accounts
//! (Employee, Owner) and table guests (Guest). The role claim decides which
//! auth endpoints a session talks to and which path groups it may enter.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role of the authenticated identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// Table guest (QR-code session)
    Guest,
    /// Staff member without management rights
    Employee,
    /// Staff member with management rights
    Owner,
}

impl Role {
    /// Check if this role belongs to the staff identity domain
    #[must_use]
    pub fn is_staff(self) -> bool {
        matches!(self, Self::Employee | Self::Owner)
    }

    /// Check if this role belongs to the guest identity domain
    #[must_use]
    pub fn is_guest(self) -> bool {
        matches!(self, Self::Guest)
    }

    /// Wire representation used in claims and API payloads
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Guest => "Guest",
            Self::Employee => "Employee",
            Self::Owner => "Owner",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown role identifier
#[derive(Debug, thiserror::Error)]
#[error("Unknown role: {0}")]
pub struct RoleParseError(pub String);

impl FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Guest" => Ok(Self::Guest),
            "Employee" => Ok(Self::Employee),
            "Owner" => Ok(Self::Owner),
            other => Err(RoleParseError(other.to_string())),
        }
    }
}
