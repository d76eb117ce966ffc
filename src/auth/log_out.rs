//! Log-out route handler that ends the session and redirects to the log-in page.

use std::sync::Arc;

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};

use crate::{
    AppState,
    auth::{AuthGate, AuthService, invalidate_auth_cookie},
    endpoints,
};

#[derive(Clone)]
pub struct LogOutState {
    pub cookie_key: Key,
    pub auth_service: Arc<dyn AuthService>,
}

impl FromRef<AppState> for LogOutState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            auth_service: state.auth_service.clone(),
        }
    }
}

impl FromRef<LogOutState> for Key {
    fn from_ref(state: &LogOutState) -> Self {
        state.cookie_key.clone()
    }
}

/// Invalidate the auth cookie and redirect the client to the log-in page.
pub async fn get_log_out(State(state): State<LogOutState>, jar: PrivateCookieJar) -> Response {
    if let AuthGate::Authenticated(user_id) = AuthGate::restore(&jar) {
        state.auth_service.sign_out(user_id);
    }

    (invalidate_auth_cookie(jar), Redirect::to(endpoints::LOG_IN_VIEW)).into_response()
}
