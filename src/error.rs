//! Defines the app level error type and conversions to rendered HTML pages and alerts.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{
    alert::Alert,
    auth::AuthError,
    internal_server_error::InternalServerError,
    not_found::NotFoundError,
    transaction::StoreError,
};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A required form field was left empty.
    #[error("Please fill in all fields")]
    MissingFields,

    /// The amount could not be parsed as a number.
    #[error("\"{0}\" is not a valid amount")]
    InvalidAmount(String),

    /// Amounts record how much money moved, the direction is given by the
    /// transaction kind.
    #[error("Amounts cannot be negative")]
    NegativeAmount,

    /// Amounts are stored to the cent.
    #[error("Amounts can have at most two decimal places")]
    TooManyDecimalPlaces,

    /// The amount is larger than [crate::Amount::MAX].
    #[error("Amounts can be at most {0}")]
    AmountTooLarge(String),

    /// A month key was not in the "YYYY-MM" format.
    #[error("\"{0}\" is not a valid month, expected YYYY-MM")]
    InvalidMonth(String),

    /// The email address could not be parsed.
    #[error("\"{0}\" is not a valid email address")]
    InvalidEmail(String),

    /// The new password or its confirmation was left empty.
    #[error("Please enter the new password and confirm it")]
    MissingPassword,

    /// The password and its confirmation differ.
    #[error("Passwords do not match")]
    PasswordMismatch,

    /// The password has fewer characters than the given minimum.
    #[error("Password must be at least {0} characters")]
    PasswordTooShort(usize),

    /// The display name has more characters than the given maximum.
    #[error("Display names can be at most {0} characters")]
    DisplayNameTooLong(usize),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The auth cookie is missing, could not be decrypted or has expired.
    #[error("no valid auth cookie in the cookie jar")]
    CookieMissing,

    /// An error occurred while serializing a struct as JSON
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),

    /// The cookie expiry could not be computed.
    #[error("could not compute the cookie expiry")]
    InvalidDateTime,

    /// The requested resource was not found.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// The transaction store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The auth service failed.
    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl Error {
    /// Whether the error was caused by the user's input and was caught
    /// before reaching the store or auth service.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            Error::MissingFields
                | Error::InvalidAmount(_)
                | Error::NegativeAmount
                | Error::TooManyDecimalPlaces
                | Error::AmountTooLarge(_)
                | Error::InvalidMonth(_)
                | Error::InvalidEmail(_)
                | Error::MissingPassword
                | Error::PasswordMismatch
                | Error::PasswordTooShort(_)
                | Error::DisplayNameTooLong(_)
        )
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound | Error::Store(StoreError::NotFound) => NotFoundError.into_response(),
            Error::InvalidTimezoneError(timezone) => InternalServerError {
                description: "Invalid Timezone Settings",
                fix: &format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            }
            .into_response(),
            Error::Store(StoreError::Unavailable) | Error::DatabaseLockError => {
                InternalServerError {
                    description: "Database Unavailable",
                    fix: "The database is busy or unavailable. Try again in a moment.",
                }
                .into_response()
            }
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}

impl Error {
    /// Convert the error into an HTTP response with an HTML alert.
    pub fn into_alert_response(self) -> Response {
        let (status_code, alert) = match self {
            error if error.is_validation_error() => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Check your input".to_owned(),
                    details: error.to_string(),
                },
            ),
            Error::Store(error) => {
                let status_code = match error {
                    StoreError::NotFound => StatusCode::NOT_FOUND,
                    StoreError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
                    StoreError::Rejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
                    StoreError::Sql(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };

                (
                    status_code,
                    Alert::Error {
                        message: "Could not save your changes".to_owned(),
                        details: error.to_string(),
                    },
                )
            }
            Error::Auth(error) => (
                error.status_code(),
                Alert::Error {
                    message: "Request failed".to_owned(),
                    details: error.to_string(),
                },
            ),
            Error::InvalidTimezoneError(timezone) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::Error {
                    message: "Invalid Timezone Settings".to_owned(),
                    details: format!(
                        "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                    ),
                },
            ),
            Error::DatabaseLockError => (
                StatusCode::SERVICE_UNAVAILABLE,
                Alert::Error {
                    message: "Database unavailable".to_owned(),
                    details: "The database is busy or unavailable. Try again in a moment."
                        .to_owned(),
                },
            ),
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Alert::Error {
                        message: "Something went wrong".to_owned(),
                        details:
                            "An unexpected error occurred, check the server logs for more details."
                                .to_owned(),
                    },
                )
            }
        };

        (status_code, alert.into_html()).into_response()
    }
}
