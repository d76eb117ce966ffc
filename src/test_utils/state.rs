use std::sync::{Arc, Mutex};

use email_address::EmailAddress;
use rusqlite::Connection;

use crate::{
    AppConfig, AppState,
    auth::{
        AuthError, AuthService, RecordingMailer, SessionSubscription, User, UserID, UserUpdate,
        ValidatedPassword,
    },
};

pub(crate) const TEST_EMAIL: &str = "siti@example.com";
pub(crate) const TEST_PASSWORD: &str = "rahasia123";

/// An [AppState] over a fresh in-memory database. Emails are kept by the
/// returned mailer instead of being sent.
pub(crate) fn test_app_state() -> (AppState, RecordingMailer) {
    let connection = Connection::open_in_memory().expect("Could not open in-memory database");
    let config = AppConfig {
        cookie_secret: "foobar".to_owned(),
        local_timezone: "Etc/UTC".to_owned(),
        public_url: "http://localhost:3000".to_owned(),
        password_hash_cost: 4,
    };
    let mailer = RecordingMailer::default();

    let state = AppState::new(connection, &config, Arc::new(mailer.clone()))
        .expect("Could not create app state");

    (state, mailer)
}

/// Register the account with [TEST_EMAIL] and [TEST_PASSWORD].
#[track_caller]
pub(crate) fn sign_up_test_user(state: &AppState) -> User {
    let email: EmailAddress = TEST_EMAIL.parse().expect("Invalid test email");

    state
        .auth_service
        .sign_up(&email, ValidatedPassword::new_unchecked(TEST_PASSWORD))
        .expect("Could not sign up test user")
}

/// Wraps a real [AuthService] and counts the calls to `update_user`, so tests
/// can check that rejected input never reaches the service.
#[derive(Clone)]
pub(crate) struct RecordingAuthService {
    inner: Arc<dyn AuthService>,
    updates: Arc<Mutex<Vec<UserID>>>,
}

impl RecordingAuthService {
    pub(crate) fn new(inner: Arc<dyn AuthService>) -> Self {
        Self {
            inner,
            updates: Arc::default(),
        }
    }

    pub(crate) fn update_calls(&self) -> usize {
        self.updates.lock().unwrap().len()
    }
}

impl AuthService for RecordingAuthService {
    fn sign_in(&self, email: &EmailAddress, password: &str) -> Result<User, AuthError> {
        self.inner.sign_in(email, password)
    }

    fn sign_up(
        &self,
        email: &EmailAddress,
        password: ValidatedPassword,
    ) -> Result<User, AuthError> {
        self.inner.sign_up(email, password)
    }

    fn sign_out(&self, user_id: UserID) {
        self.inner.sign_out(user_id)
    }

    fn get_user(&self, user_id: UserID) -> Result<User, AuthError> {
        self.inner.get_user(user_id)
    }

    fn send_password_reset(&self, email: &EmailAddress, reset_url: &str) -> Result<(), AuthError> {
        self.inner.send_password_reset(email, reset_url)
    }

    fn reset_password(&self, token: &str, password: ValidatedPassword) -> Result<User, AuthError> {
        self.inner.reset_password(token, password)
    }

    fn update_user(&self, user_id: UserID, update: UserUpdate) -> Result<User, AuthError> {
        self.updates.lock().unwrap().push(user_id);
        self.inner.update_user(user_id, update)
    }

    fn confirm_email_change(&self, token: &str) -> Result<User, AuthError> {
        self.inner.confirm_email_change(token)
    }

    fn subscribe(&self) -> SessionSubscription {
        self.inner.subscribe()
    }
}
