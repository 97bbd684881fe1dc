//! Identity collaborator seam and session gating.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use tutor_core::auth::{AuthState, RouteAccess, SessionUser, route_access};

use crate::error::AuthError;

/// Waits between `sign_in` attempts while the provider reports rate limiting.
pub const SIGN_IN_RETRY_DELAYS: [Duration; 3] = [
    Duration::from_secs(1),
    Duration::from_secs(2),
    Duration::from_secs(4),
];

/// Registration gets a single retry after a rate-limited attempt.
pub const SIGN_UP_RETRY_DELAYS: [Duration; 1] = [Duration::from_millis(1000)];

/// External account service.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Session restored from the provider, if any.
    async fn get_session(&self) -> Result<Option<SessionUser>, AuthError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<SessionUser, AuthError>;

    async fn sign_up(&self, email: &str, password: &str) -> Result<SessionUser, AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;
}

async fn with_backoff<F, Fut>(delays: &[Duration], op: &'static str, mut call: F) -> Result<SessionUser, AuthError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<SessionUser, AuthError>>,
{
    for (attempt, delay) in delays.iter().enumerate() {
        match call().await {
            Ok(user) => return Ok(user),
            Err(e) if e.failure().is_retryable() => {
                tracing::warn!(
                    op,
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "identity provider rate limited, retrying"
                );
                tokio::time::sleep(*delay).await;
            }
            Err(e) => return Err(e),
        }
    }
    call().await
}

/// Signs in, retrying rate-limited attempts with exponential backoff.
///
/// # Errors
///
/// Returns the first non-retryable `AuthError`, or the last one once the
/// retries are used up.
pub async fn sign_in_with_backoff(
    provider: &dyn IdentityProvider,
    email: &str,
    password: &str,
) -> Result<SessionUser, AuthError> {
    with_backoff(&SIGN_IN_RETRY_DELAYS, "sign_in", || provider.sign_in(email, password)).await
}

/// Registers an account, retrying once when the provider rate limits.
///
/// # Errors
///
/// Returns the first non-retryable `AuthError`, or the rate-limit error from
/// the second attempt.
pub async fn sign_up_with_backoff(
    provider: &dyn IdentityProvider,
    email: &str,
    password: &str,
) -> Result<SessionUser, AuthError> {
    with_backoff(&SIGN_UP_RETRY_DELAYS, "sign_up", || provider.sign_up(email, password)).await
}

/// Tracks the current auth state for protected views.
pub struct AuthSession {
    provider: Arc<dyn IdentityProvider>,
    state: AuthState,
}

impl AuthSession {
    /// Starts in `AuthState::Loading` until `restore` completes.
    #[must_use]
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self {
            provider,
            state: AuthState::Loading,
        }
    }

    #[must_use]
    pub fn state(&self) -> &AuthState {
        &self.state
    }

    #[must_use]
    pub fn access(&self) -> RouteAccess {
        route_access(&self.state)
    }

    /// Loads the provider's session. A lookup failure counts as signed out.
    pub async fn restore(&mut self) -> &AuthState {
        let session = match self.provider.get_session().await {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(error = %e, "session lookup failed");
                None
            }
        };
        self.state = AuthState::from_session(session);
        &self.state
    }

    /// # Errors
    ///
    /// Returns the provider's `AuthError`; the state is left unchanged.
    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<&AuthState, AuthError> {
        let user = sign_in_with_backoff(self.provider.as_ref(), email, password).await?;
        tracing::info!(user = %user.id, "signed in");
        self.state = AuthState::SignedIn(user);
        Ok(&self.state)
    }

    /// # Errors
    ///
    /// Returns the provider's `AuthError`; the state is left unchanged.
    pub async fn sign_up(&mut self, email: &str, password: &str) -> Result<&AuthState, AuthError> {
        let user = sign_up_with_backoff(self.provider.as_ref(), email, password).await?;
        tracing::info!(user = %user.id, "signed up");
        self.state = AuthState::SignedIn(user);
        Ok(&self.state)
    }

    /// # Errors
    ///
    /// Returns the provider's `AuthError`; the state is left unchanged.
    pub async fn sign_out(&mut self) -> Result<(), AuthError> {
        self.provider.sign_out().await?;
        self.state = AuthState::SignedOut;
        Ok(())
    }
}
