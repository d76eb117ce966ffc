//! Delivery of out-of-band messages such as password reset and email
//! confirmation links.

use email_address::EmailAddress;

use crate::auth::AuthError;

/// A message to deliver to a user.
#[derive(Debug, Clone, PartialEq)]
pub struct Email {
    pub to: EmailAddress,
    pub subject: String,
    pub body: String,
}

/// Sends emails on behalf of the auth service.
pub trait Mailer: Send + Sync {
    /// Deliver `email`.
    ///
    /// # Errors
    ///
    /// Returns [AuthError::Mail] if the message could not be handed off.
    fn send(&self, email: Email) -> Result<(), AuthError>;
}

/// Writes emails to the server log instead of sending them.
///
/// Suitable for a self-hosted instance where the operator reads the log to
/// pass links on.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, email: Email) -> Result<(), AuthError> {
        tracing::info!(to = %email.to, subject = %email.subject, "{}", email.body);
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test_mailer {
    use std::sync::{Arc, Mutex};

    use super::{Email, Mailer};
    use crate::auth::AuthError;

    /// Keeps every sent email so tests can follow the links inside.
    #[derive(Debug, Default, Clone)]
    pub(crate) struct RecordingMailer {
        sent: Arc<Mutex<Vec<Email>>>,
    }

    impl RecordingMailer {
        pub(crate) fn sent(&self) -> Vec<Email> {
            self.sent.lock().unwrap().clone()
        }

        /// The token from the link in the most recent email.
        pub(crate) fn last_token(&self) -> String {
            let sent = self.sent();
            let body = &sent.last().expect("no email was sent").body;
            let (_, rest) = body.split_once("token=").expect("email has no token");

            rest.split_whitespace().next().unwrap_or_default().to_owned()
        }
    }

    impl Mailer for RecordingMailer {
        fn send(&self, email: Email) -> Result<(), AuthError> {
            self.sent.lock().unwrap().push(email);
            Ok(())
        }
    }
}
