//! The registration page and the handler that creates accounts.

use std::sync::Arc;

use axum::{
    Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use email_address::EmailAddress;
use maud::{Markup, html};
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{
    AppState, Error,
    auth::{
        AuthError, AuthService, MIN_PASSWORD_LENGTH, set_auth_cookie, validate_new_password,
    },
    endpoints,
    html::{LINK_STYLE, base, email_input, log_in_register, password_input, submit_button},
    internal_server_error::get_internal_server_error_redirect,
};

/// Inline error messages for the registration form, one per field.
#[derive(Default)]
struct RegistrationErrors<'a> {
    email: Option<&'a str>,
    password: Option<&'a str>,
    confirm_password: Option<&'a str>,
}

fn registration_form(email: &str, errors: RegistrationErrors) -> Markup {
    html! {
        form
            hx-post=(endpoints::USERS)
            hx-indicator="this"
            hx-disabled-elt="find button"
            hx-swap="outerHTML"
            hx-target-error="#alert-container"
            class="space-y-4 md:space-y-6"
        {
            (email_input(email, errors.email))
            (password_input("password", "Password", MIN_PASSWORD_LENGTH, errors.password))
            (password_input(
                "confirm_password",
                "Confirm Password",
                MIN_PASSWORD_LENGTH,
                errors.confirm_password
            ))

            (submit_button("Create Account"))

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Already have an account? "
                a href=(endpoints::LOG_IN_VIEW) tabindex="0" class=(LINK_STYLE)
                {
                  "Log in here"
                }
            }
        }
    }
}

/// Display the registration page.
pub async fn get_register_page() -> Response {
    let form = registration_form("", RegistrationErrors::default());
    let content = log_in_register("Create an account", &form);
    base("Register", &content).into_response()
}

/// The state needed for creating a new user.
#[derive(Clone)]
pub struct RegistrationState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    pub auth_service: Arc<dyn AuthService>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            auth_service: state.auth_service.clone(),
        }
    }
}

impl FromRef<RegistrationState> for Key {
    fn from_ref(state: &RegistrationState) -> Self {
        state.cookie_key.clone()
    }
}

#[derive(Serialize, Deserialize)]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Create an account and sign the new user in.
pub async fn register_user(
    State(state): State<RegistrationState>,
    jar: PrivateCookieJar,
    Form(user_data): Form<RegisterForm>,
) -> Response {
    let email = user_data.email.trim();

    let Ok(parsed_email) = email.parse::<EmailAddress>() else {
        let message = Error::InvalidEmail(email.to_owned()).to_string();
        return registration_form(
            email,
            RegistrationErrors {
                email: Some(&message),
                ..Default::default()
            },
        )
        .into_response();
    };

    let password = match validate_new_password(&user_data.password, &user_data.confirm_password)
    {
        Ok(password) => password,
        Err(error) => {
            let message = error.to_string();
            let errors = match error {
                Error::PasswordMismatch => RegistrationErrors {
                    confirm_password: Some(&message),
                    ..Default::default()
                },
                _ => RegistrationErrors {
                    password: Some(&message),
                    ..Default::default()
                },
            };

            return registration_form(email, errors).into_response();
        }
    };

    let user = match state.auth_service.sign_up(&parsed_email, password) {
        Ok(user) => user,
        Err(error @ AuthError::EmailTaken) => {
            let message = error.to_string();
            return registration_form(
                email,
                RegistrationErrors {
                    email: Some(&message),
                    ..Default::default()
                },
            )
            .into_response();
        }
        Err(error) => {
            tracing::error!("Could not create user: {error}");
            return Error::Auth(error).into_alert_response();
        }
    };

    match set_auth_cookie(jar, user.id, state.cookie_duration) {
        Ok(jar) => (
            StatusCode::SEE_OTHER,
            HxRedirect(endpoints::TRACKER_VIEW.to_owned()),
            jar,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("Could not set auth cookie for new user {}: {error}", user.id);
            get_internal_server_error_redirect()
        }
    }
}

#[cfg(test)]
mod view_tests {
    use axum::http::StatusCode;

    use crate::{
        auth::register_user::get_register_page,
        endpoints,
        test_utils::{
            assert_form_input, assert_form_submit_button, assert_hx_endpoint, assert_valid_html,
            must_get_form, parse_html_document,
        },
    };

    #[tokio::test]
    async fn render_register_page() {
        let response = get_register_page().await;

        assert_eq!(response.status(), StatusCode::OK);
        let document = parse_html_document(response).await;
        assert_valid_html(&document);

        let form = must_get_form(&document);
        assert_hx_endpoint(&form, endpoints::USERS, "hx-post");
        assert_form_input(&form, "email", "email");
        assert_form_input(&form, "password", "password");
        assert_form_input(&form, "confirm_password", "password");
        assert_form_submit_button(&form);
    }
}

#[cfg(test)]
mod register_user_tests {
    use axum::{Router, http::StatusCode, routing::post};
    use axum_test::{TestResponse, TestServer};

    use crate::{
        Error,
        auth::{AuthError, COOKIE_TOKEN, MIN_PASSWORD_LENGTH, register_user::RegistrationState},
        endpoints,
        test_utils::{TEST_EMAIL, sign_up_test_user, test_app_state},
    };

    use super::register_user;

    fn get_server(with_existing_user: bool) -> TestServer {
        let (state, _) = test_app_state();
        if with_existing_user {
            sign_up_test_user(&state);
        }

        let state = RegistrationState {
            cookie_key: state.cookie_key,
            cookie_duration: state.cookie_duration,
            auth_service: state.auth_service,
        };
        let app = Router::new()
            .route(endpoints::USERS, post(register_user))
            .with_state(state);

        TestServer::try_new(app).expect("Could not create test server.")
    }

    #[track_caller]
    fn assert_field_error(response: &TestResponse, input_id: &str, want: &str) {
        let html = scraper::Html::parse_fragment(&response.text());
        let selector = scraper::Selector::parse(&format!("input#{input_id} + p")).unwrap();
        let error = html
            .select(&selector)
            .next()
            .unwrap_or_else(|| panic!("want an error message after #{input_id}"));

        assert_eq!(error.text().collect::<String>(), want);
    }

    #[tokio::test]
    async fn register_creates_user_and_signs_in() {
        let server = get_server(false);

        let response = server
            .post(endpoints::USERS)
            .form(&[
                ("email", "budi@example.com"),
                ("password", "rahasia"),
                ("confirm_password", "rahasia"),
            ])
            .await;

        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(response.header("hx-redirect"), endpoints::TRACKER_VIEW);
        assert!(response.maybe_cookie(COOKIE_TOKEN).is_some());
    }

    #[tokio::test]
    async fn mismatched_passwords_are_reported_on_confirmation() {
        let server = get_server(false);

        let response = server
            .post(endpoints::USERS)
            .form(&[
                ("email", "budi@example.com"),
                ("password", "rahasia"),
                ("confirm_password", "rahasia2"),
            ])
            .await;

        response.assert_status_ok();
        assert_field_error(
            &response,
            "confirm-password",
            &Error::PasswordMismatch.to_string(),
        );
    }

    #[tokio::test]
    async fn short_password_is_rejected() {
        let server = get_server(false);

        let response = server
            .post(endpoints::USERS)
            .form(&[
                ("email", "budi@example.com"),
                ("password", "abc"),
                ("confirm_password", "abc"),
            ])
            .await;

        assert_field_error(
            &response,
            "password",
            &Error::PasswordTooShort(MIN_PASSWORD_LENGTH).to_string(),
        );
    }

    #[tokio::test]
    async fn invalid_email_is_rejected() {
        let server = get_server(false);

        let response = server
            .post(endpoints::USERS)
            .form(&[
                ("email", "not an email"),
                ("password", "rahasia"),
                ("confirm_password", "rahasia"),
            ])
            .await;

        assert_field_error(
            &response,
            "email",
            &Error::InvalidEmail("not an email".to_owned()).to_string(),
        );
    }

    #[tokio::test]
    async fn taken_email_is_rejected() {
        let server = get_server(true);

        let response = server
            .post(endpoints::USERS)
            .form(&[
                ("email", TEST_EMAIL),
                ("password", "rahasia"),
                ("confirm_password", "rahasia"),
            ])
            .await;

        response.assert_status_ok();
        assert!(response.maybe_cookie(COOKIE_TOKEN).is_none());
        assert_field_error(&response, "email", &AuthError::EmailTaken.to_string());
    }
}
