//! The page for requesting a password reset link and the handler that sends it.

use std::sync::Arc;

use axum::{
    Form,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use email_address::EmailAddress;
use maud::{Markup, html};
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    auth::AuthService,
    endpoints,
    html::{LINK_STYLE, base, email_input, log_in_register, submit_button},
};

fn forgot_password_form(email: &str, email_error: Option<&str>) -> Markup {
    html! {
        form
            hx-post=(endpoints::FORGOT_PASSWORD_API)
            hx-indicator="this"
            hx-disabled-elt="find button"
            hx-swap="outerHTML"
            hx-target-error="#alert-container"
            class="space-y-4 md:space-y-6"
        {
            p class="text-sm text-gray-500 dark:text-gray-400"
            {
                "Enter the email address you registered with and we will send you a link to choose a new password."
            }

            (email_input(email, email_error))

            (submit_button("Send reset link"))

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Remembered it? "
                a href=(endpoints::LOG_IN_VIEW) tabindex="0" class=(LINK_STYLE)
                {
                    "Log in here"
                }
            }
        }
    }
}

fn reset_link_sent(email: &str) -> Markup {
    html! {
        div id="reset-link-sent" class="space-y-4 text-gray-900 dark:text-white"
        {
            p
            {
                "If an account exists for " strong { (email) } ", we sent it a link to reset "
                "the password. The link stops working after one hour."
            }

            a href=(endpoints::LOG_IN_VIEW) tabindex="0" class=(LINK_STYLE)
            {
                "Back to log in"
            }
        }
    }
}

/// Renders the page for requesting a password reset email.
pub async fn get_forgot_password_page() -> Response {
    let form = forgot_password_form("", None);
    let content = log_in_register("Forgot your password?", &form);
    base("Forgot Password", &content).into_response()
}

/// The state needed to send password reset emails.
#[derive(Clone)]
pub struct ForgotPasswordState {
    pub auth_service: Arc<dyn AuthService>,
    /// The base URL the emailed link should point at.
    pub public_url: String,
}

impl FromRef<AppState> for ForgotPasswordState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            auth_service: state.auth_service.clone(),
            public_url: state.public_url.clone(),
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct ForgotPasswordForm {
    pub email: String,
}

/// Email a reset link if `email` belongs to an account.
///
/// The response is the same whether or not the address is registered.
pub async fn post_forgot_password(
    State(state): State<ForgotPasswordState>,
    Form(form): Form<ForgotPasswordForm>,
) -> Response {
    let email = form.email.trim();

    let Ok(parsed_email) = email.parse::<EmailAddress>() else {
        let message = Error::InvalidEmail(email.to_owned()).to_string();
        return forgot_password_form(email, Some(&message)).into_response();
    };

    let reset_url = format!("{}{}", state.public_url, endpoints::RESET_PASSWORD_VIEW);

    match state
        .auth_service
        .send_password_reset(&parsed_email, &reset_url)
    {
        Ok(()) => reset_link_sent(email).into_response(),
        Err(error) => {
            tracing::error!("Could not send password reset email: {error}");
            Error::Auth(error).into_alert_response()
        }
    }
}
