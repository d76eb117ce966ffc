//! Code for creating the user table and reading and writing users.

use std::fmt::Display;

use email_address::EmailAddress;
use rusqlite::{Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::auth::{AuthError, PasswordHash};

/// A newtype wrapper for integer user IDs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A registered account.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: UserID,
    /// The confirmed email address used to sign in.
    pub email: EmailAddress,
    /// The name shown in the app, may be empty.
    pub display_name: String,
    pub password_hash: PasswordHash,
}

impl User {
    /// The display name, or the email address when no name has been set.
    pub fn greeting_name(&self) -> &str {
        if self.display_name.is_empty() {
            self.email.as_str()
        } else {
            &self.display_name
        }
    }
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                display_name TEXT NOT NULL DEFAULT '',
                password TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Email addresses are compared case-insensitively by storing them lowercased.
fn normalize_email(email: &EmailAddress) -> String {
    email.as_str().to_lowercase()
}

fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_email: String = row.get(1)?;
    let raw_password_hash: String = row.get(3)?;

    Ok(User {
        id: UserID::new(row.get(0)?),
        email: EmailAddress::new_unchecked(raw_email),
        display_name: row.get(2)?,
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
    })
}

/// Create and insert a new user into the database.
///
/// # Errors
///
/// Returns [AuthError::EmailTaken] if another account uses `email`.
pub fn create_user(
    email: &EmailAddress,
    password_hash: PasswordHash,
    connection: &Connection,
) -> Result<User, AuthError> {
    let email = normalize_email(email);

    connection.execute(
        "INSERT INTO user (email, password) VALUES (?1, ?2)",
        (&email, password_hash.as_ref()),
    )?;

    Ok(User {
        id: UserID::new(connection.last_insert_rowid()),
        email: EmailAddress::new_unchecked(email),
        display_name: String::new(),
        password_hash,
    })
}

/// Get the user with the ID `user_id`.
///
/// # Errors
///
/// Returns [AuthError::UserNotFound] if there is no such user.
pub fn get_user_by_id(user_id: UserID, connection: &Connection) -> Result<User, AuthError> {
    connection
        .prepare("SELECT id, email, display_name, password FROM user WHERE id = :id")?
        .query_row(&[(":id", &user_id.as_i64())], map_user_row)
        .map_err(AuthError::from)
}

/// Get the user registered with `email`, if any.
///
/// # Errors
///
/// Returns an error if the query failed.
pub fn find_user_by_email(
    email: &EmailAddress,
    connection: &Connection,
) -> Result<Option<User>, AuthError> {
    connection
        .prepare("SELECT id, email, display_name, password FROM user WHERE email = :email")?
        .query_row(&[(":email", &normalize_email(email))], map_user_row)
        .optional()
        .map_err(AuthError::from)
}

fn expect_one_row(rows_affected: usize) -> Result<(), AuthError> {
    if rows_affected == 0 {
        Err(AuthError::UserNotFound)
    } else {
        Ok(())
    }
}

/// Set the display name of `user_id`.
pub fn set_display_name(
    user_id: UserID,
    display_name: &str,
    connection: &Connection,
) -> Result<(), AuthError> {
    let rows_affected = connection.execute(
        "UPDATE user SET display_name = ?1 WHERE id = ?2",
        (display_name, user_id.as_i64()),
    )?;

    expect_one_row(rows_affected)
}

/// Set the sign-in email of `user_id`.
///
/// # Errors
///
/// Returns [AuthError::EmailTaken] if another account uses `email`.
pub fn set_email(
    user_id: UserID,
    email: &EmailAddress,
    connection: &Connection,
) -> Result<(), AuthError> {
    let rows_affected = connection.execute(
        "UPDATE user SET email = ?1 WHERE id = ?2",
        (normalize_email(email), user_id.as_i64()),
    )?;

    expect_one_row(rows_affected)
}

/// Replace the password hash of `user_id`.
pub fn set_password_hash(
    user_id: UserID,
    password_hash: &PasswordHash,
    connection: &Connection,
) -> Result<(), AuthError> {
    let rows_affected = connection.execute(
        "UPDATE user SET password = ?1 WHERE id = ?2",
        (password_hash.as_ref(), user_id.as_i64()),
    )?;

    expect_one_row(rows_affected)
}
