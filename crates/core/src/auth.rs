//! Session gating shared by every protected view.

use crate::model::UserId;

/// Identity of the signed-in account as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub id: UserId,
    pub email: String,
}

/// Where the session lookup currently stands.
///
/// `Loading` and `SignedOut` are kept apart so a protected view waits instead
/// of bouncing the learner to the login page while the session is restored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthState {
    #[default]
    Loading,
    SignedOut,
    SignedIn(SessionUser),
}

impl AuthState {
    #[must_use]
    pub fn from_session(session: Option<SessionUser>) -> Self {
        session.map_or(Self::SignedOut, Self::SignedIn)
    }

    #[must_use]
    pub fn user(&self) -> Option<&SessionUser> {
        match self {
            Self::SignedIn(user) => Some(user),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAccess {
    Wait,
    RedirectToLogin,
    Allow,
}

#[must_use]
pub fn route_access(state: &AuthState) -> RouteAccess {
    match state {
        AuthState::Loading => RouteAccess::Wait,
        AuthState::SignedOut => RouteAccess::RedirectToLogin,
        AuthState::SignedIn(_) => RouteAccess::Allow,
    }
}

/// Failure categories derived from the status attached to identity errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    InvalidCredentials,
    DuplicateAccount,
    RateLimited,
    Other,
}

impl AuthFailure {
    #[must_use]
    pub fn from_status(status: Option<u16>) -> Self {
        match status {
            Some(400) => Self::InvalidCredentials,
            Some(422) => Self::DuplicateAccount,
            Some(429) => Self::RateLimited,
            _ => Self::Other,
        }
    }

    #[must_use]
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::RateLimited)
    }
}
