//! Password validation and hashing.
//!
//! [ValidatedPassword] holds a password that passed the length rule and
//! [PasswordHash] is what gets stored for a user.

use std::fmt::Display;

use bcrypt::{BcryptError, hash, verify};
use unicode_segmentation::UnicodeSegmentation;

use crate::Error;

/// The fewest characters a new password may have.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// A password that has been validated, but not yet hashed.
#[derive(Clone, PartialEq)]
pub struct ValidatedPassword(String);

impl ValidatedPassword {
    /// Validate a new password.
    ///
    /// Length is counted in user-perceived characters, so "ñ" typed as two
    /// code points still counts once.
    ///
    /// # Errors
    ///
    /// Returns [Error::PasswordTooShort] if the password has fewer than
    /// [MIN_PASSWORD_LENGTH] characters.
    pub fn new(raw_password: &str) -> Result<Self, Error> {
        if raw_password.graphemes(true).count() < MIN_PASSWORD_LENGTH {
            return Err(Error::PasswordTooShort(MIN_PASSWORD_LENGTH));
        }

        Ok(Self(raw_password.to_owned()))
    }

    /// Wrap a password without checking it.
    ///
    /// Not `unsafe`: a short password only weakens the account.
    pub fn new_unchecked(raw_password: &str) -> Self {
        Self(raw_password.to_owned())
    }
}

impl std::fmt::Debug for ValidatedPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ValidatedPassword(********)")
    }
}

impl Display for ValidatedPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("********")
    }
}

/// Check a new password and its confirmation, in the order the user
/// should see the problems: both filled in, both equal, long enough.
///
/// # Errors
///
/// Returns [Error::MissingPassword], [Error::PasswordMismatch] or
/// [Error::PasswordTooShort].
pub fn validate_new_password(password: &str, confirm: &str) -> Result<ValidatedPassword, Error> {
    if password.is_empty() || confirm.is_empty() {
        return Err(Error::MissingPassword);
    }

    if password != confirm {
        return Err(Error::PasswordMismatch);
    }

    ValidatedPassword::new(password)
}

/// A salted and hashed password.
#[derive(Debug, Clone, PartialEq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// The recommended bcrypt cost.
    pub const DEFAULT_COST: u32 = bcrypt::DEFAULT_COST;

    /// Hash `password` with the bcrypt `cost`.
    ///
    /// # Errors
    ///
    /// Returns [Error::HashingError] if bcrypt fails.
    pub fn new(password: ValidatedPassword, cost: u32) -> Result<Self, Error> {
        hash(&password.0, cost)
            .map(Self)
            .map_err(|error| Error::HashingError(error.to_string()))
    }

    /// Wrap a hash loaded from the database.
    pub fn new_unchecked(raw_password_hash: &str) -> Self {
        Self(raw_password_hash.to_owned())
    }

    /// Check that `raw_password` matches the stored hash.
    pub fn verify(&self, raw_password: &str) -> Result<bool, BcryptError> {
        verify(raw_password, &self.0)
    }
}

impl AsRef<str> for PasswordHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
