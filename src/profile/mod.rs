//! The profile editor: display name, email address and password.
//!
//! Each field has its own form and endpoint, so a failed update leaves the
//! other fields alone.

mod page;
mod update_email;
mod update_name;
mod update_password;

pub use page::{ProfileState, get_profile_page};
pub use update_email::{ConfirmEmailState, get_confirm_email_page, update_email_endpoint};
pub use update_name::{MAX_DISPLAY_NAME_LENGTH, update_display_name_endpoint};
pub use update_password::update_password_endpoint;
