//! User accounts, sessions and the pages for signing in and out.

mod cookie;
mod events;
mod forgot_password;
mod gate;
mod log_in;
mod log_out;
mod mailer;
mod middleware;
mod one_time_token;
mod password;
mod redirect;
mod register_user;
mod reset_password;
mod service;
mod user;

pub use cookie::{DEFAULT_COOKIE_DURATION, invalidate_auth_cookie, set_auth_cookie};
pub use events::{SessionEvent, SessionEvents, SessionSubscription, log_session_events};
pub use forgot_password::{get_forgot_password_page, post_forgot_password};
pub use gate::AuthGate;
pub use log_in::{get_log_in_page, post_log_in};
pub use log_out::get_log_out;
pub use mailer::{Email, LogMailer, Mailer};
pub use middleware::{AuthState, auth_guard, auth_guard_hx};
pub use one_time_token::create_auth_token_table;
pub use password::{MIN_PASSWORD_LENGTH, PasswordHash, ValidatedPassword, validate_new_password};
pub use register_user::{get_register_page, register_user};
pub use reset_password::{get_reset_password_page, post_reset_password};
pub use service::{AuthError, AuthService, SQLiteAuthService, UserUpdate};
pub use user::{User, UserID, create_user_table};

#[cfg(test)]
pub(crate) use cookie::COOKIE_TOKEN;

#[cfg(test)]
pub(crate) use user::create_user;

#[cfg(test)]
pub(crate) use mailer::test_mailer::RecordingMailer;
