//! Access-token lifecycle
//!
//! [`TokenManager`] owns the single live access token for the process. It
//! acquires a token with the password grant the first time one is needed,
//! refreshes it with the refresh-token grant once it is within the expiry
//! tolerance, and falls back to the password grant when no refresh token is
//! held.
//!
//! ## Concurrency
//!
//! The token lives behind a `tokio::sync::Mutex` that is held across the
//! exchange call. Callers racing past expiry therefore queue on the lock, and
//! only the first one talks to the token endpoint; the rest observe the fresh
//! token once they acquire the lock. Tokens are always replaced whole.

use std::sync::Arc;
use std::time::Duration;

use cloudsync_core::domain::TokenError;
use cloudsync_core::ports::{Credentials, ITokenEndpoint, TokenGrant};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, error, info};

/// Default tolerance before expiry at which a token is treated as expired
pub const DEFAULT_EXPIRY_TOLERANCE: Duration = Duration::from_secs(30);

// ============================================================================
// AuthToken
// ============================================================================

/// The currently held token and its absolute expiry
#[derive(Clone)]
struct AuthToken {
    access_token: String,
    refresh_token: Option<String>,
    expires_at: Instant,
}

impl AuthToken {
    /// Builds a token from an endpoint grant, stamping the expiry from `now`
    fn from_grant(grant: TokenGrant, now: Instant) -> Result<Self, TokenError> {
        let expires_in = grant.expires_in.ok_or(TokenError::MissingExpiry)?;
        Ok(Self {
            access_token: grant.access_token,
            refresh_token: grant.refresh_token,
            expires_at: now + Duration::from_secs(expires_in),
        })
    }
}

/// Where the held token sits in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    /// No token has been acquired yet
    NoToken,
    /// The token is usable for at least the tolerance window
    Valid,
    /// The token has expired or will within the tolerance window
    ExpiredOrNear,
}

impl TokenState {
    fn of(token: Option<&AuthToken>, now: Instant, tolerance: Duration) -> Self {
        match token {
            None => TokenState::NoToken,
            Some(token) => match token.expires_at.checked_sub(tolerance) {
                Some(deadline) if now <= deadline => TokenState::Valid,
                _ => TokenState::ExpiredOrNear,
            },
        }
    }
}

// ============================================================================
// TokenManager
// ============================================================================

/// Keeps a valid bearer token available for outbound requests
pub struct TokenManager {
    endpoint: Arc<dyn ITokenEndpoint>,
    credentials: Credentials,
    tolerance: Duration,
    current: Mutex<Option<AuthToken>>,
}

impl TokenManager {
    /// Creates a manager with the default 30 second expiry tolerance
    ///
    /// # Arguments
    /// * `endpoint` - The service's token endpoint
    /// * `credentials` - Username and password for the password grant
    pub fn new(endpoint: Arc<dyn ITokenEndpoint>, credentials: Credentials) -> Self {
        Self {
            endpoint,
            credentials,
            tolerance: DEFAULT_EXPIRY_TOLERANCE,
            current: Mutex::new(None),
        }
    }

    /// Overrides the expiry tolerance
    pub fn with_tolerance(mut self, tolerance: Duration) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Reports the lifecycle state of the held token
    pub async fn state(&self) -> TokenState {
        let current = self.current.lock().await;
        TokenState::of(current.as_ref(), Instant::now(), self.tolerance)
    }

    /// Returns an access token that will not expire within the tolerance
    ///
    /// Acquires a token when none is held. Refreshes it when it is expired
    /// or about to expire and a refresh token is available, and otherwise
    /// falls back to a full credential exchange.
    pub async fn ensure_valid_token(&self) -> Result<String, TokenError> {
        let mut current = self.current.lock().await;

        let state = TokenState::of(current.as_ref(), Instant::now(), self.tolerance);
        let token = match (state, current.as_ref()) {
            (TokenState::Valid, Some(token)) => return Ok(token.access_token.clone()),
            (
                TokenState::ExpiredOrNear,
                Some(AuthToken {
                    refresh_token: Some(refresh),
                    ..
                }),
            ) if !refresh.is_empty() => self.exchange_refresh(refresh).await?,
            _ => self.exchange_credentials().await?,
        };

        let access_token = token.access_token.clone();
        *current = Some(token);
        Ok(access_token)
    }

    /// Performs a full credential exchange, replacing any held token
    pub async fn acquire_token(&self) -> Result<(), TokenError> {
        let mut current = self.current.lock().await;
        *current = Some(self.exchange_credentials().await?);
        Ok(())
    }

    /// Exchanges the held refresh token for a new token
    ///
    /// Fails with [`TokenError::MissingRefreshToken`] if no refresh token is
    /// held. The held token is left unchanged on failure.
    pub async fn refresh_token(&self) -> Result<(), TokenError> {
        let mut current = self.current.lock().await;
        let refresh = current
            .as_ref()
            .and_then(|t| t.refresh_token.as_deref())
            .ok_or(TokenError::MissingRefreshToken)?;
        let token = self.exchange_refresh(refresh).await?;
        *current = Some(token);
        Ok(())
    }

    async fn exchange_credentials(&self) -> Result<AuthToken, TokenError> {
        debug!("Acquiring token with credentials");
        let grant = self
            .endpoint
            .exchange_credentials(&self.credentials)
            .await
            .map_err(|err| {
                error!(status = ?err.status(), error = %err, "API error while acquiring token");
                TokenError::Exchange(err)
            })?;

        let expires_in = grant.expires_in;
        let token = AuthToken::from_grant(grant, Instant::now())?;
        info!(expires_in = ?expires_in, "Token acquired");
        Ok(token)
    }

    async fn exchange_refresh(&self, refresh_token: &str) -> Result<AuthToken, TokenError> {
        if refresh_token.is_empty() {
            return Err(TokenError::MissingRefreshToken);
        }

        debug!("Refreshing token");
        let grant = self
            .endpoint
            .exchange_refresh_token(refresh_token)
            .await
            .map_err(|err| {
                error!(status = ?err.status(), error = %err, "API error while refreshing token");
                TokenError::Exchange(err)
            })?;

        let expires_in = grant.expires_in;
        let token = AuthToken::from_grant(grant, Instant::now())?;
        info!(expires_in = ?expires_in, "Token refreshed");
        Ok(token)
    }
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("credentials", &self.credentials)
            .field("tolerance", &self.tolerance)
            .finish_non_exhaustive()
    }
}
