//! Changing the password of the signed-in user.

use axum::{
    Extension, Form,
    extract::State,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    auth::{MIN_PASSWORD_LENGTH, UserID, UserUpdate, validate_new_password},
    endpoints,
    html::{FORM_CONTAINER_STYLE, FORM_SUCCESS_STYLE, password_input, submit_button},
    profile::page::ProfileState,
};

/// Inline error messages for the password form, one per field.
#[derive(Default)]
pub(super) struct PasswordErrors<'a> {
    pub new_password: Option<&'a str>,
    pub confirm_password: Option<&'a str>,
}

pub(super) fn password_form(errors: PasswordErrors, success: Option<&str>) -> Markup {
    html! {
        form
            id="password-form"
            hx-post=(endpoints::PROFILE_PASSWORD_API)
            hx-indicator="this"
            hx-disabled-elt="find button"
            hx-swap="outerHTML"
            hx-target-error="#alert-container"
            class=(FORM_CONTAINER_STYLE)
        {
            h2 class="text-lg font-semibold" { "Password" }

            (password_input(
                "new_password",
                "New Password",
                MIN_PASSWORD_LENGTH,
                errors.new_password
            ))
            (password_input(
                "confirm_password",
                "Confirm New Password",
                MIN_PASSWORD_LENGTH,
                errors.confirm_password
            ))

            (submit_button("Change password"))

            @if let Some(message) = success {
                p class=(FORM_SUCCESS_STYLE) role="status" { (message) }
            }
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct PasswordForm {
    pub new_password: String,
    pub confirm_password: String,
}

/// Replace the signed-in user's password.
///
/// The confirmation and length rules are checked here, so a rejected
/// password never reaches the auth service.
pub async fn update_password_endpoint(
    State(state): State<ProfileState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<PasswordForm>,
) -> Response {
    let password = match validate_new_password(&form.new_password, &form.confirm_password) {
        Ok(password) => password,
        Err(error) => {
            let message = error.to_string();
            let errors = match error {
                Error::PasswordMismatch => PasswordErrors {
                    confirm_password: Some(&message),
                    ..Default::default()
                },
                _ => PasswordErrors {
                    new_password: Some(&message),
                    ..Default::default()
                },
            };

            return password_form(errors, None).into_response();
        }
    };

    let update = UserUpdate {
        password: Some(password),
        ..Default::default()
    };

    match state.auth_service.update_user(user_id, update) {
        Ok(_) => password_form(PasswordErrors::default(), Some("Password changed")).into_response(),
        Err(error) => {
            tracing::error!("Could not change password for user {user_id}: {error}");
            Error::Auth(error).into_alert_response()
        }
    }
}
