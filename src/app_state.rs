//! Implements a struct that holds the state of the server.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use rusqlite::Connection;
use sha2::{Digest, Sha512};
use time::Duration;

use crate::{
    Error,
    auth::{AuthService, DEFAULT_COOKIE_DURATION, Mailer, SQLiteAuthService, SessionEvents},
    db::initialize,
    transaction::{SQLiteTransactionStore, TransactionStore},
};

/// The state of the server.
#[derive(Clone)]
pub struct AppState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,

    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,

    /// The local timezone as a canonical timezone name, e.g. "Asia/Jakarta".
    pub local_timezone: String,

    /// The base URL users reach the server at, used in emailed links.
    pub public_url: String,

    pub transaction_store: Arc<dyn TransactionStore>,

    pub auth_service: Arc<dyn AuthService>,

    /// Session changes published by the auth service.
    pub session_events: SessionEvents,
}

/// The settings needed to build an [AppState].
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Hashed into the key that encrypts session cookies.
    pub cookie_secret: String,
    /// A canonical timezone name, e.g. "Asia/Jakarta".
    pub local_timezone: String,
    /// The base URL users reach the server at, e.g. "https://dompet.example.com".
    pub public_url: String,
    /// The bcrypt cost for new password hashes.
    pub password_hash_cost: u32,
}

impl AppState {
    /// Create a new [AppState] backed by the SQLite database `db_connection`.
    ///
    /// This function will initialize the database by adding the tables for
    /// users, emailed tokens and transactions.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(
        db_connection: Connection,
        config: &AppConfig,
        mailer: Arc<dyn Mailer>,
    ) -> Result<Self, Error> {
        initialize(&db_connection)?;

        let connection = Arc::new(Mutex::new(db_connection));
        let session_events = SessionEvents::new();
        let auth_service = SQLiteAuthService::new(
            connection.clone(),
            mailer,
            session_events.clone(),
            &config.public_url,
        )
        .with_password_hash_cost(config.password_hash_cost);

        Ok(Self {
            cookie_key: create_cookie_key(&config.cookie_secret),
            cookie_duration: DEFAULT_COOKIE_DURATION,
            local_timezone: config.local_timezone.clone(),
            public_url: config.public_url.trim_end_matches('/').to_owned(),
            transaction_store: Arc::new(SQLiteTransactionStore::new(connection)),
            auth_service: Arc::new(auth_service),
            session_events,
        })
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

/// Create a signing key for cookies from a `secret`s string.
pub fn create_cookie_key(secret: &str) -> Key {
    let hash = Sha512::digest(secret);

    Key::from(&hash)
}
