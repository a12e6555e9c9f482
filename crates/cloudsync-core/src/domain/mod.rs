//! Domain types
//!
//! - Newtypes for the identifiers handed out by the remote service
//! - Error enums shared across the port boundary

pub mod errors;
pub mod newtypes;

pub use errors::{ApiError, DomainError, TokenError};
pub use newtypes::*;
