use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use services::error::AuthError;
use services::identity::{AuthSession, IdentityProvider, sign_in_with_backoff, sign_up_with_backoff};
use tutor_core::auth::{AuthFailure, AuthState, RouteAccess, SessionUser};
use tutor_core::model::UserId;

/// Rejects the first `rate_limited` calls with 429.
struct FlakyProvider {
    rate_limited: usize,
    calls: AtomicUsize,
    session: Option<SessionUser>,
}

impl FlakyProvider {
    fn new(rate_limited: usize) -> Self {
        Self {
            rate_limited,
            calls: AtomicUsize::new(0),
            session: None,
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn user(email: &str) -> SessionUser {
    SessionUser {
        id: UserId::new("user-001"),
        email: email.into(),
    }
}

#[async_trait]
impl IdentityProvider for FlakyProvider {
    async fn get_session(&self) -> Result<Option<SessionUser>, AuthError> {
        Ok(self.session.clone())
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<SessionUser, AuthError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.rate_limited {
            return Err(AuthError::new(Some(429), "over_request_rate_limit", "slow down"));
        }
        if password != "correct horse" {
            return Err(AuthError::new(Some(400), "invalid_credentials", "wrong password"));
        }
        Ok(user(email))
    }

    async fn sign_up(&self, email: &str, _password: &str) -> Result<SessionUser, AuthError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.rate_limited {
            return Err(AuthError::new(Some(429), "over_email_send_rate_limit", "slow down"));
        }
        if email == "ann@example.com" {
            return Err(AuthError::new(Some(422), "user_already_exists", "account exists"));
        }
        Ok(user(email))
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        Ok(())
    }
}

#[tokio::test(start_paused = true)]
async fn rate_limited_sign_in_is_retried() {
    let provider = FlakyProvider::new(2);

    let signed_in = sign_in_with_backoff(&provider, "ann@example.com", "correct horse")
        .await
        .unwrap();

    assert_eq!(signed_in.email, "ann@example.com");
    assert_eq!(provider.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn retries_stop_after_the_last_delay() {
    let provider = FlakyProvider::new(usize::MAX);

    let err = sign_in_with_backoff(&provider, "ann@example.com", "correct horse")
        .await
        .unwrap_err();

    assert_eq!(err.failure(), AuthFailure::RateLimited);
    assert_eq!(provider.calls(), 4);
}

#[tokio::test(start_paused = true)]
async fn bad_credentials_are_not_retried() {
    let provider = FlakyProvider::new(0);

    let err = sign_in_with_backoff(&provider, "ann@example.com", "nope")
        .await
        .unwrap_err();

    assert_eq!(err.failure(), AuthFailure::InvalidCredentials);
    assert_eq!(provider.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn rate_limited_sign_up_is_retried_once() {
    let provider = FlakyProvider::new(1);

    let created = sign_up_with_backoff(&provider, "bob@example.com", "pw")
        .await
        .unwrap();

    assert_eq!(created.email, "bob@example.com");
    assert_eq!(provider.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn sign_up_gives_up_after_two_attempts() {
    let provider = FlakyProvider::new(usize::MAX);

    let err = sign_up_with_backoff(&provider, "bob@example.com", "pw")
        .await
        .unwrap_err();

    assert_eq!(err.failure(), AuthFailure::RateLimited);
    assert_eq!(provider.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn duplicate_sign_up_is_not_retried() {
    let provider = FlakyProvider::new(0);

    let err = sign_up_with_backoff(&provider, "ann@example.com", "pw")
        .await
        .unwrap_err();

    assert_eq!(err.failure(), AuthFailure::DuplicateAccount);
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn session_moves_from_loading_to_signed_in() {
    let provider = Arc::new(FlakyProvider::new(0));
    let mut session = AuthSession::new(provider);
    assert_eq!(session.access(), RouteAccess::Wait);

    session.restore().await;
    assert_eq!(session.state(), &AuthState::SignedOut);
    assert_eq!(session.access(), RouteAccess::RedirectToLogin);

    session.sign_in("ann@example.com", "correct horse").await.unwrap();
    assert_eq!(session.access(), RouteAccess::Allow);

    let err = session.sign_up("ann@example.com", "x").await.unwrap_err();
    assert_eq!(err.failure(), AuthFailure::DuplicateAccount);
    assert_eq!(session.access(), RouteAccess::Allow);

    session.sign_out().await.unwrap();
    assert_eq!(session.state(), &AuthState::SignedOut);
}

#[tokio::test]
async fn restored_session_allows_access() {
    let provider = FlakyProvider {
        session: Some(user("ann@example.com")),
        ..FlakyProvider::new(0)
    };
    let mut session = AuthSession::new(Arc::new(provider));

    session.restore().await;

    assert_eq!(session.state().user().map(|u| u.email.as_str()), Some("ann@example.com"));
}
