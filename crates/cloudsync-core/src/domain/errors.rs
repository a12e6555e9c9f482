//! Domain error types
//!
//! This module defines the error types that cross the port boundary:
//! identifier validation failures, remote API failures and token lifecycle
//! failures.

use thiserror::Error;

/// Errors that can occur while constructing domain values
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The remote service returned an identifier that is not a valid file ID
    #[error("Invalid remote file ID: {0}")]
    InvalidRemoteId(String),
}

// ============================================================================
// ApiError
// ============================================================================

/// Errors returned by every remote API operation
///
/// `Status` is the distinguished "API error": the service answered, but with
/// a non-success status code. Everything below HTTP (DNS, TLS, connection
/// resets, body streaming failures) is reported as `Transport`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The service answered with a non-success status code
    #[error("API returned {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Raw response body, possibly empty
        body: String,
    },

    /// The request did not complete at the transport level
    #[error("Transport error: {0}")]
    Transport(String),

    /// The service answered successfully but the payload could not be understood
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// No bearer token could be obtained for the request
    #[error("Authentication failed: {0}")]
    Authentication(Box<TokenError>),
}

impl ApiError {
    /// Returns true if retrying the same request may succeed
    ///
    /// Status and transport failures are retried uniformly. Malformed
    /// responses and authentication failures are not: repeating the call
    /// yields the same outcome.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::Status { .. } | ApiError::Transport(_))
    }

    /// Returns the HTTP status code if the service answered
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        ApiError::Authentication(Box::new(err))
    }
}

// ============================================================================
// TokenError
// ============================================================================

/// Errors in the access-token lifecycle
#[derive(Debug, Error)]
pub enum TokenError {
    /// A refresh was attempted but no refresh token is held
    #[error("Refresh token is not available")]
    MissingRefreshToken,

    /// The token endpoint did not report a lifetime for the new token
    #[error("Token expiration time is not defined")]
    MissingExpiry,

    /// The token endpoint call itself failed
    #[error("Token exchange failed: {0}")]
    Exchange(#[from] ApiError),
}
