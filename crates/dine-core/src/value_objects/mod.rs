//! Value objects for the session domain

mod execution_context;
mod role;
mod token_kind;

pub use execution_context::ExecutionContext;
pub use role::{Role, RoleParseError};
pub use token_kind::TokenKind;
