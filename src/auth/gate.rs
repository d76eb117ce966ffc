//! The auth gate decides whether the signed-in area or the sign-in screen
//! is shown.
//!
//! A gate starts in [AuthGate::Loading] until the stored session has been
//! read, then follows sign-in and sign-out events. Events that make no
//! sense in the current state are ignored.

use axum_extra::extract::PrivateCookieJar;

use crate::auth::{SessionEvent, UserID, cookie::get_token_from_cookies};

/// Which screen to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthGate {
    /// The stored session has not been checked yet, show neither screen.
    #[default]
    Loading,
    /// Show the sign-in screen.
    Unauthenticated,
    /// Show the signed-in area for this user.
    Authenticated(UserID),
}

impl AuthGate {
    /// Build a gate from the session cookie in `jar`.
    pub fn restore(jar: &PrivateCookieJar) -> Self {
        let user_id = get_token_from_cookies(jar).ok().map(|token| token.user_id);

        AuthGate::Loading.transition(SessionEvent::Restored(user_id))
    }

    /// The state after `event`.
    #[must_use]
    pub fn transition(self, event: SessionEvent) -> Self {
        match (self, event) {
            (AuthGate::Loading, SessionEvent::Restored(Some(user_id))) => {
                AuthGate::Authenticated(user_id)
            }
            (AuthGate::Loading, SessionEvent::Restored(None)) => AuthGate::Unauthenticated,
            (AuthGate::Unauthenticated, SessionEvent::SignedIn(user_id)) => {
                AuthGate::Authenticated(user_id)
            }
            (AuthGate::Authenticated(current), SessionEvent::SignedOut(user_id))
                if current == user_id =>
            {
                AuthGate::Unauthenticated
            }
            (state, event) => {
                tracing::trace!("Auth gate in state {state:?} ignored {event:?}");
                state
            }
        }
    }

    /// The signed-in user, if any.
    pub fn user_id(&self) -> Option<UserID> {
        match self {
            AuthGate::Authenticated(user_id) => Some(*user_id),
            AuthGate::Loading | AuthGate::Unauthenticated => None,
        }
    }
}
