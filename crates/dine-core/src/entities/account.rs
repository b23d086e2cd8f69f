//! Account entity - a staff member of the restaurant

use serde::{Deserialize, Serialize};

use crate::value_objects::Role;

/// Staff account as returned by the backend profile endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl Account {
    /// Create a new Account with required fields
    pub fn new(id: i64, name: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
            role,
            avatar: None,
        }
    }

    /// Check if this account may enter the management area
    #[must_use]
    pub fn can_manage(&self) -> bool {
        self.role.is_staff()
    }
}
