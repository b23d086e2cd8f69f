//! Guest session entity - a table guest authenticated through a QR code

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::Role;

/// A guest identity created when a table QR code is scanned
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestSession {
    pub id: i64,
    pub name: String,
    pub table_number: i32,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl GuestSession {
    /// Create a new guest session for a table
    pub fn new(id: i64, name: impl Into<String>, table_number: i32) -> Self {
        Self {
            id,
            name: name.into(),
            table_number,
            role: Role::Guest,
            created_at: Utc::now(),
        }
    }
}
