//! Single-use tokens sent by email for password resets and email changes.
//!
//! Only a SHA-256 digest of each token is stored, so a leaked database does
//! not leak working links.

use email_address::EmailAddress;
use rusqlite::{Connection, OptionalExtension};
use sha2::{Digest, Sha256};
use time::{Duration, OffsetDateTime};
use ulid::Ulid;

use crate::auth::{AuthError, UserID};

/// How long an emailed link stays valid.
pub const TOKEN_LIFETIME: Duration = Duration::hours(1);

/// What a token may be redeemed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenPurpose {
    PasswordReset,
    EmailChange,
}

impl TokenPurpose {
    fn as_str(&self) -> &'static str {
        match self {
            TokenPurpose::PasswordReset => "password_reset",
            TokenPurpose::EmailChange => "email_change",
        }
    }
}

/// The account a redeemed token belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct RedeemedToken {
    pub user_id: UserID,
    /// The address waiting for confirmation, set for [TokenPurpose::EmailChange].
    pub new_email: Option<EmailAddress>,
}

pub fn create_auth_token_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS auth_token (
                digest TEXT PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
                purpose TEXT NOT NULL,
                new_email TEXT,
                expires_at TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

fn digest(raw_token: &str) -> String {
    Sha256::digest(raw_token.as_bytes())
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect()
}

/// Issue a new token for `user_id`, replacing any earlier token with the
/// same purpose. Returns the raw token to put in the emailed link.
pub fn issue_token(
    user_id: UserID,
    purpose: TokenPurpose,
    new_email: Option<&EmailAddress>,
    connection: &Connection,
) -> Result<String, AuthError> {
    let raw_token = format!("{}{}", Ulid::new(), Ulid::new()).to_lowercase();
    let expires_at = OffsetDateTime::now_utc() + TOKEN_LIFETIME;

    connection.execute(
        "DELETE FROM auth_token WHERE user_id = ?1 AND purpose = ?2",
        (user_id.as_i64(), purpose.as_str()),
    )?;
    connection.execute(
        "INSERT INTO auth_token (digest, user_id, purpose, new_email, expires_at)
        VALUES (?1, ?2, ?3, ?4, ?5)",
        (
            digest(&raw_token),
            user_id.as_i64(),
            purpose.as_str(),
            new_email.map(|email| email.as_str().to_lowercase()),
            expires_at,
        ),
    )?;

    Ok(raw_token)
}

/// Consume `raw_token`. A token can be redeemed at most once, expired
/// tokens are deleted without being honoured.
///
/// # Errors
///
/// Returns [AuthError::InvalidToken] if the token is unknown, was issued
/// for another purpose or has expired.
pub fn redeem_token(
    raw_token: &str,
    purpose: TokenPurpose,
    connection: &Connection,
) -> Result<RedeemedToken, AuthError> {
    let digest = digest(raw_token.trim());

    let row = connection
        .query_row(
            "SELECT user_id, new_email, expires_at FROM auth_token
            WHERE digest = ?1 AND purpose = ?2",
            (&digest, purpose.as_str()),
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, OffsetDateTime>(2)?,
                ))
            },
        )
        .optional()?;

    let Some((user_id, new_email, expires_at)) = row else {
        return Err(AuthError::InvalidToken);
    };

    connection.execute("DELETE FROM auth_token WHERE digest = ?1", (&digest,))?;

    if expires_at <= OffsetDateTime::now_utc() {
        return Err(AuthError::InvalidToken);
    }

    Ok(RedeemedToken {
        user_id: UserID::new(user_id),
        new_email: new_email.map(EmailAddress::new_unchecked),
    })
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::{Duration, OffsetDateTime};

    use crate::{
        auth::{
            AuthError, PasswordHash, User, create_user,
            one_time_token::{TokenPurpose, issue_token, redeem_token},
        },
        db::initialize,
    };

    fn get_connection_and_user() -> (Connection, User) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let user = create_user(
            &"sari@example.com".parse().unwrap(),
            PasswordHash::new_unchecked("hash"),
            &connection,
        )
        .unwrap();

        (connection, user)
    }

    #[test]
    fn token_can_be_redeemed_once() {
        let (connection, user) = get_connection_and_user();
        let token = issue_token(user.id, TokenPurpose::PasswordReset, None, &connection).unwrap();

        let redeemed = redeem_token(&token, TokenPurpose::PasswordReset, &connection).unwrap();

        assert_eq!(redeemed.user_id, user.id);
        assert_eq!(
            redeem_token(&token, TokenPurpose::PasswordReset, &connection),
            Err(AuthError::InvalidToken)
        );
    }

    #[test]
    fn token_is_not_stored_in_plain_text() {
        let (connection, user) = get_connection_and_user();
        let token = issue_token(user.id, TokenPurpose::PasswordReset, None, &connection).unwrap();

        let stored: String = connection
            .query_row("SELECT digest FROM auth_token", [], |row| row.get(0))
            .unwrap();

        assert_ne!(stored, token);
    }

    #[test]
    fn token_for_other_purpose_is_rejected() {
        let (connection, user) = get_connection_and_user();
        let token = issue_token(user.id, TokenPurpose::PasswordReset, None, &connection).unwrap();

        assert_eq!(
            redeem_token(&token, TokenPurpose::EmailChange, &connection),
            Err(AuthError::InvalidToken)
        );
    }

    #[test]
    fn new_token_replaces_old_one() {
        let (connection, user) = get_connection_and_user();
        let first = issue_token(user.id, TokenPurpose::PasswordReset, None, &connection).unwrap();
        let second = issue_token(user.id, TokenPurpose::PasswordReset, None, &connection).unwrap();

        assert_eq!(
            redeem_token(&first, TokenPurpose::PasswordReset, &connection),
            Err(AuthError::InvalidToken)
        );
        assert!(redeem_token(&second, TokenPurpose::PasswordReset, &connection).is_ok());
    }

    #[test]
    fn expired_token_is_rejected() {
        let (connection, user) = get_connection_and_user();
        let token = issue_token(user.id, TokenPurpose::PasswordReset, None, &connection).unwrap();
        connection
            .execute(
                "UPDATE auth_token SET expires_at = ?1",
                (OffsetDateTime::now_utc() - Duration::minutes(1),),
            )
            .unwrap();

        assert_eq!(
            redeem_token(&token, TokenPurpose::PasswordReset, &connection),
            Err(AuthError::InvalidToken)
        );
    }

    #[test]
    fn email_change_token_carries_new_address() {
        let (connection, user) = get_connection_and_user();
        let new_email = "sari.baru@example.com".parse().unwrap();
        let token = issue_token(
            user.id,
            TokenPurpose::EmailChange,
            Some(&new_email),
            &connection,
        )
        .unwrap();

        let redeemed = redeem_token(&token, TokenPurpose::EmailChange, &connection).unwrap();

        assert_eq!(redeemed.new_email, Some(new_email));
    }
}
