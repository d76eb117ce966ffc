//! The auth service: sign-up, sign-in, password resets and profile updates.
//!
//! Handlers talk to the [AuthService] trait so tests can swap in a fake.
//! [SQLiteAuthService] keeps users in the app database and sends links
//! through a [Mailer].

use std::sync::{Arc, Mutex};

use axum::http::StatusCode;
use email_address::EmailAddress;
use rusqlite::Connection;

use crate::{
    Error,
    auth::{
        PasswordHash, SessionEvent, SessionEvents, SessionSubscription, User, UserID,
        ValidatedPassword,
        mailer::{Email, Mailer},
        one_time_token::{TokenPurpose, issue_token, redeem_token},
        user::{
            create_user, find_user_by_email, get_user_by_id, set_display_name, set_email,
            set_password_hash,
        },
    },
    endpoints,
};

/// The errors reported by the auth service.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum AuthError {
    /// Unknown email or wrong password, deliberately not saying which.
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("An account with this email address already exists")]
    EmailTaken,

    #[error("The account could not be found")]
    UserNotFound,

    /// The emailed link is unknown, used or expired.
    #[error("This link is invalid or has expired, please request a new one")]
    InvalidToken,

    #[error("The email could not be sent, please try again later")]
    Mail(String),

    #[error("The account service is busy, please try again")]
    Unavailable,

    /// The string is for the server log only.
    #[error("The password could not be saved, please try again")]
    Hashing(String),

    #[error("An unexpected database error occurred")]
    Sql(rusqlite::Error),
}

impl AuthError {
    /// The HTTP status that best describes the error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::EmailTaken => StatusCode::CONFLICT,
            AuthError::UserNotFound => StatusCode::NOT_FOUND,
            AuthError::InvalidToken => StatusCode::BAD_REQUEST,
            AuthError::Mail(_) => StatusCode::BAD_GATEWAY,
            AuthError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            AuthError::Hashing(_) | AuthError::Sql(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<rusqlite::Error> for AuthError {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => AuthError::UserNotFound,
            rusqlite::Error::SqliteFailure(error, Some(ref message))
                if error.extended_code == 2067 && message.contains("user.email") =>
            {
                AuthError::EmailTaken
            }
            error => {
                tracing::error!("An unhandled SQL error occurred in the auth service: {error}");
                AuthError::Sql(error)
            }
        }
    }
}

impl From<Error> for AuthError {
    fn from(value: Error) -> Self {
        match value {
            Error::HashingError(error) => AuthError::Hashing(error),
            error => {
                tracing::error!("Unexpected error in the auth service: {error}");
                AuthError::Unavailable
            }
        }
    }
}

/// Changes to apply to a user's profile. `None` leaves a field as is.
#[derive(Debug, Default, Clone)]
pub struct UserUpdate {
    /// Already trimmed and length checked.
    pub display_name: Option<String>,
    /// Only takes effect once the link emailed to the new address is opened.
    pub email: Option<EmailAddress>,
    pub password: Option<ValidatedPassword>,
}

/// Account management used by the HTTP handlers.
pub trait AuthService: Send + Sync {
    /// Check `email` and `password` and start a session.
    fn sign_in(&self, email: &EmailAddress, password: &str) -> Result<User, AuthError>;

    /// Create an account and start a session for it.
    fn sign_up(&self, email: &EmailAddress, password: ValidatedPassword)
    -> Result<User, AuthError>;

    /// End the session of `user_id`.
    fn sign_out(&self, user_id: UserID);

    fn get_user(&self, user_id: UserID) -> Result<User, AuthError>;

    /// Email a password reset link to `email`. `reset_url` is the page the
    /// link points at, the token is appended as a query parameter.
    ///
    /// Succeeds without sending anything when no account uses `email`, so
    /// the response does not reveal which addresses are registered.
    fn send_password_reset(&self, email: &EmailAddress, reset_url: &str)
    -> Result<(), AuthError>;

    /// Set a new password using a token from a reset email.
    fn reset_password(&self, token: &str, password: ValidatedPassword)
    -> Result<User, AuthError>;

    /// Apply `update` to `user_id` and return the user as now stored.
    fn update_user(&self, user_id: UserID, update: UserUpdate) -> Result<User, AuthError>;

    /// Apply a pending email change using a token from a confirmation email.
    fn confirm_email_change(&self, token: &str) -> Result<User, AuthError>;

    /// Receive session events from now on.
    fn subscribe(&self) -> SessionSubscription;
}

/// An [AuthService] backed by the app's SQLite database.
pub struct SQLiteAuthService {
    connection: Arc<Mutex<Connection>>,
    mailer: Arc<dyn Mailer>,
    events: SessionEvents,
    public_url: String,
    password_hash_cost: u32,
}

impl SQLiteAuthService {
    /// `public_url` is the address users reach the server at, used to build
    /// the links in emails, e.g. "https://dompet.example.com".
    pub fn new(
        connection: Arc<Mutex<Connection>>,
        mailer: Arc<dyn Mailer>,
        events: SessionEvents,
        public_url: &str,
    ) -> Self {
        Self {
            connection,
            mailer,
            events,
            public_url: public_url.trim_end_matches('/').to_owned(),
            password_hash_cost: PasswordHash::DEFAULT_COST,
        }
    }

    /// Use a different bcrypt cost, tests use the minimum to stay fast.
    pub fn with_password_hash_cost(mut self, cost: u32) -> Self {
        self.password_hash_cost = cost;
        self
    }

    fn with_connection<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, AuthError>,
    ) -> Result<T, AuthError> {
        let connection = self.connection.lock().map_err(|error| {
            tracing::error!("Could not acquire database lock: {error}");
            AuthError::Unavailable
        })?;

        f(&connection)
    }

    /// Like `with_connection`, but the writes in `f` are rolled back if it
    /// returns an error.
    fn with_transaction<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, AuthError>,
    ) -> Result<T, AuthError> {
        self.with_connection(|connection| {
            let transaction = connection.unchecked_transaction()?;
            let value = f(&transaction)?;
            transaction.commit()?;

            Ok(value)
        })
    }

    fn hash(&self, password: ValidatedPassword) -> Result<PasswordHash, AuthError> {
        PasswordHash::new(password, self.password_hash_cost).map_err(AuthError::from)
    }
}

impl AuthService for SQLiteAuthService {
    fn sign_in(&self, email: &EmailAddress, password: &str) -> Result<User, AuthError> {
        let user = self
            .with_connection(|connection| find_user_by_email(email, connection))?
            .ok_or(AuthError::InvalidCredentials)?;

        let is_password_valid = user.password_hash.verify(password).map_err(|error| {
            tracing::error!("Could not verify password for user {}: {error}", user.id);
            AuthError::Hashing(error.to_string())
        })?;

        if !is_password_valid {
            return Err(AuthError::InvalidCredentials);
        }

        self.events.publish(SessionEvent::SignedIn(user.id));
        Ok(user)
    }

    fn sign_up(
        &self,
        email: &EmailAddress,
        password: ValidatedPassword,
    ) -> Result<User, AuthError> {
        let password_hash = self.hash(password)?;
        let user = self.with_connection(|connection| create_user(email, password_hash, connection))?;

        self.events.publish(SessionEvent::SignedIn(user.id));
        Ok(user)
    }

    fn sign_out(&self, user_id: UserID) {
        self.events.publish(SessionEvent::SignedOut(user_id));
    }

    fn get_user(&self, user_id: UserID) -> Result<User, AuthError> {
        self.with_connection(|connection| get_user_by_id(user_id, connection))
    }

    fn send_password_reset(
        &self,
        email: &EmailAddress,
        reset_url: &str,
    ) -> Result<(), AuthError> {
        let issued = self.with_connection(|connection| {
            let Some(user) = find_user_by_email(email, connection)? else {
                return Ok(None);
            };

            issue_token(user.id, TokenPurpose::PasswordReset, None, connection)
                .map(|token| Some((user, token)))
        })?;

        let Some((user, token)) = issued else {
            tracing::info!("Password reset requested for an unregistered email address");
            return Ok(());
        };

        self.mailer.send(Email {
            to: user.email,
            subject: "Reset your DompetKu password".to_owned(),
            body: format!(
                "Open this link within an hour to choose a new password:\n\n{reset_url}?token={token}\n\n\
                If you did not ask to reset your password you can ignore this email."
            ),
        })
    }

    fn reset_password(
        &self,
        token: &str,
        password: ValidatedPassword,
    ) -> Result<User, AuthError> {
        let password_hash = self.hash(password)?;

        let user = self.with_transaction(|connection| {
            let redeemed = redeem_token(token, TokenPurpose::PasswordReset, connection)?;
            set_password_hash(redeemed.user_id, &password_hash, connection)?;
            get_user_by_id(redeemed.user_id, connection)
        })?;

        self.events.publish(SessionEvent::PasswordChanged(user.id));
        Ok(user)
    }

    fn update_user(&self, user_id: UserID, update: UserUpdate) -> Result<User, AuthError> {
        let password_hash = update
            .password
            .map(|password| self.hash(password))
            .transpose()?;

        let (user, confirmation) = self.with_transaction(|connection| {
            let current = get_user_by_id(user_id, connection)?;

            if let Some(display_name) = &update.display_name {
                set_display_name(user_id, display_name, connection)?;
            }

            if let Some(password_hash) = &password_hash {
                set_password_hash(user_id, password_hash, connection)?;
            }

            let confirmation = match &update.email {
                Some(email) if email.as_str().eq_ignore_ascii_case(current.email.as_str()) => None,
                Some(email) => {
                    if let Some(other) = find_user_by_email(email, connection)?
                        && other.id != user_id
                    {
                        return Err(AuthError::EmailTaken);
                    }

                    let token =
                        issue_token(user_id, TokenPurpose::EmailChange, Some(email), connection)?;
                    Some((email.clone(), token))
                }
                None => None,
            };

            Ok((get_user_by_id(user_id, connection)?, confirmation))
        })?;

        if password_hash.is_some() {
            self.events.publish(SessionEvent::PasswordChanged(user_id));
        }

        if let Some((new_email, token)) = confirmation {
            self.mailer.send(Email {
                to: new_email,
                subject: "Confirm your new DompetKu email address".to_owned(),
                body: format!(
                    "Open this link within an hour to start signing in with this address:\n\n\
                    {}{}?token={token}\n\n\
                    Until then you can keep signing in with {}.",
                    self.public_url,
                    endpoints::CONFIRM_EMAIL_VIEW,
                    user.email
                ),
            })?;
        }

        Ok(user)
    }

    fn confirm_email_change(&self, token: &str) -> Result<User, AuthError> {
        let user = self.with_transaction(|connection| {
            let redeemed = redeem_token(token, TokenPurpose::EmailChange, connection)?;
            let new_email = redeemed.new_email.ok_or(AuthError::InvalidToken)?;

            set_email(redeemed.user_id, &new_email, connection)?;
            get_user_by_id(redeemed.user_id, connection)
        })?;

        self.events.publish(SessionEvent::EmailChanged(user.id));
        Ok(user)
    }

    fn subscribe(&self) -> SessionSubscription {
        self.events.subscribe()
    }
}
