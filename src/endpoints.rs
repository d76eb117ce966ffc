//! The URIs of every page and API route.
//!
//! For endpoints that take a parameter, e.g. '/api/transactions/{transaction_id}',
//! use [format_endpoint].

use std::fmt::Display;

/// Redirects to the tracker or the log-in page.
pub const ROOT: &str = "/";
/// The monthly view of a user's transactions, the landing page after log-in.
pub const TRACKER_VIEW: &str = "/tracker";
/// The page for editing one transaction.
pub const EDIT_TRANSACTION_VIEW: &str = "/transactions/{transaction_id}/edit";
/// The page for changing the display name, email and password.
pub const PROFILE_VIEW: &str = "/profile";
/// Where the link in an email change confirmation points.
pub const CONFIRM_EMAIL_VIEW: &str = "/profile/email/confirm";
pub const REGISTER_VIEW: &str = "/register";
pub const LOG_IN_VIEW: &str = "/log_in";
/// The page for requesting a password reset link.
pub const FORGOT_PASSWORD_VIEW: &str = "/forgot_password";
/// Where the link in a password reset email points.
pub const RESET_PASSWORD_VIEW: &str = "/reset_password";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";
/// The route for static files.
pub const STATIC: &str = "/static";

pub const LOG_IN_API: &str = "/api/log_in";
pub const LOG_OUT: &str = "/api/log_out";
/// Registers a new user.
pub const USERS: &str = "/api/users";
pub const FORGOT_PASSWORD_API: &str = "/api/forgot_password";
pub const RESET_PASSWORD_API: &str = "/api/reset_password";
/// Creates a transaction.
pub const TRANSACTIONS_API: &str = "/api/transactions";
/// Updates or deletes a transaction.
pub const TRANSACTION: &str = "/api/transactions/{transaction_id}";
pub const PROFILE_NAME_API: &str = "/api/profile/name";
pub const PROFILE_EMAIL_API: &str = "/api/profile/email";
pub const PROFILE_PASSWORD_API: &str = "/api/profile/password";

/// Replace the first `{parameter}` in `endpoint_path` with `id`.
///
/// Paths without a parameter are returned unchanged.
///
/// ```
/// use dompetku::endpoints::format_endpoint;
///
/// assert_eq!(
///     format_endpoint("/api/transactions/{transaction_id}", "01J0ABC"),
///     "/api/transactions/01J0ABC"
/// );
/// ```
pub fn format_endpoint(endpoint_path: &str, id: impl Display) -> String {
    let Some(start) = endpoint_path.find('{') else {
        return endpoint_path.to_owned();
    };

    let end = endpoint_path[start..]
        .find('}')
        .map_or(endpoint_path.len(), |offset| start + offset + 1);

    format!("{}{id}{}", &endpoint_path[..start], &endpoint_path[end..])
}
