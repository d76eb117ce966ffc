//! The page a password reset link opens and the handler that sets the new password.

use std::sync::Arc;

use axum::{
    Form,
    extract::{FromRef, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    auth::{AuthError, AuthService, MIN_PASSWORD_LENGTH, validate_new_password},
    endpoints,
    html::{LINK_STYLE, base, log_in_register, password_input, submit_button},
};

#[derive(Default)]
struct ResetPasswordErrors<'a> {
    token: Option<&'a str>,
    new_password: Option<&'a str>,
    confirm_password: Option<&'a str>,
}

fn reset_password_form(token: &str, errors: ResetPasswordErrors) -> Markup {
    html! {
        form
            hx-post=(endpoints::RESET_PASSWORD_API)
            hx-indicator="this"
            hx-disabled-elt="find button"
            hx-swap="outerHTML"
            hx-target-error="#alert-container"
            class="space-y-4 md:space-y-6"
        {
            input type="hidden" name="token" value=(token);

            @if let Some(token_error) = errors.token {
                p id="token-error" class="text-red-500 text-base"
                {
                    (token_error) " "
                    a href=(endpoints::FORGOT_PASSWORD_VIEW) tabindex="0" class=(LINK_STYLE)
                    {
                        "Request a new link"
                    }
                }
            }

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

            (submit_button("Set password"))
        }
    }
}

#[derive(Deserialize)]
pub struct ResetPasswordQuery {
    pub token: Option<String>,
}

/// Renders the form for choosing a new password. The token from the emailed
/// link is carried in a hidden input.
pub async fn get_reset_password_page(Query(query): Query<ResetPasswordQuery>) -> Response {
    let token = query.token.unwrap_or_default();
    let invalid_link = AuthError::InvalidToken.to_string();
    let errors = ResetPasswordErrors {
        token: token.is_empty().then_some(invalid_link.as_str()),
        ..Default::default()
    };

    let form = reset_password_form(&token, errors);
    let content = log_in_register("Choose a new password", &form);
    base("Reset Password", &content).into_response()
}

#[derive(Clone)]
pub struct ResetPasswordState {
    pub auth_service: Arc<dyn AuthService>,
}

impl FromRef<AppState> for ResetPasswordState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            auth_service: state.auth_service.clone(),
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct ResetPasswordForm {
    pub token: String,
    pub new_password: String,
    pub confirm_password: String,
}

/// Set a new password with the token from a reset email, then send the user
/// to the log-in page.
///
/// The passwords are checked before the token is looked at, so a typo does
/// not use up the link.
pub async fn post_reset_password(
    State(state): State<ResetPasswordState>,
    Form(form): Form<ResetPasswordForm>,
) -> Response {
    let password = match validate_new_password(&form.new_password, &form.confirm_password) {
        Ok(password) => password,
        Err(error) => {
            let message = error.to_string();
            let errors = match error {
                Error::PasswordMismatch => ResetPasswordErrors {
                    confirm_password: Some(&message),
                    ..Default::default()
                },
                _ => ResetPasswordErrors {
                    new_password: Some(&message),
                    ..Default::default()
                },
            };

            return reset_password_form(&form.token, errors).into_response();
        }
    };

    match state.auth_service.reset_password(&form.token, password) {
        Ok(user) => {
            tracing::info!("User {} reset their password", user.id);
            (
                HxRedirect(endpoints::LOG_IN_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error @ AuthError::InvalidToken) => {
            let message = error.to_string();
            reset_password_form(
                &form.token,
                ResetPasswordErrors {
                    token: Some(&message),
                    ..Default::default()
                },
            )
            .into_response()
        }
        Err(error) => {
            tracing::error!("Could not reset password: {error}");
            Error::Auth(error).into_alert_response()
        }
    }
}


#[cfg(test)]
mod reset_password_tests {
    use axum::{Router, http::StatusCode, routing::post};
    use axum_test::{TestResponse, TestServer};
    use email_address::EmailAddress;

    use crate::{
        Error,
        auth::{AuthService, MIN_PASSWORD_LENGTH, mailer::test_mailer::RecordingMailer},
        endpoints,
        test_utils::{TEST_EMAIL, TEST_PASSWORD, sign_up_test_user, test_app_state},
    };

    use super::{ResetPasswordState, post_reset_password};

    struct Fixture {
        server: TestServer,
        mailer: RecordingMailer,
        state: ResetPasswordState,
    }

    fn get_fixture() -> Fixture {
        let (state, mailer) = test_app_state();
        sign_up_test_user(&state);
        let state = ResetPasswordState {
            auth_service: state.auth_service,
        };
        let app = Router::new()
            .route(endpoints::RESET_PASSWORD_API, post(post_reset_password))
            .with_state(state.clone());

        Fixture {
            server: TestServer::try_new(app).expect("Could not create test server."),
            mailer,
            state,
        }
    }

    fn request_token(fixture: &Fixture) -> String {
        let email: EmailAddress = TEST_EMAIL.parse().unwrap();
        fixture
            .state
            .auth_service
            .send_password_reset(&email, "http://localhost/reset_password")
            .unwrap();

        fixture.mailer.last_token()
    }

    #[track_caller]
    fn assert_error_after(response: &TestResponse, selector: &str, want: &str) {
        let html = scraper::Html::parse_fragment(&response.text());
        let error = html
            .select(&scraper::Selector::parse(selector).unwrap())
            .next()
            .unwrap_or_else(|| panic!("want an error message at {selector}"));

        assert!(
            error.text().collect::<String>().contains(want),
            "want {want:?} in {:?}",
            error.text().collect::<String>()
        );
    }

    #[tokio::test]
    async fn valid_token_sets_new_password() {
        let fixture = get_fixture();
        let token = request_token(&fixture);

        let response = fixture
            .server
            .post(endpoints::RESET_PASSWORD_API)
            .form(&[
                ("token", token.as_str()),
                ("new_password", "kata-sandi-baru"),
                ("confirm_password", "kata-sandi-baru"),
            ])
            .await;

        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(response.header("hx-redirect"), endpoints::LOG_IN_VIEW);

        let email: EmailAddress = TEST_EMAIL.parse().unwrap();
        let auth_service = &fixture.state.auth_service;
        assert!(auth_service.sign_in(&email, "kata-sandi-baru").is_ok());
        assert!(auth_service.sign_in(&email, TEST_PASSWORD).is_err());
    }

    #[tokio::test]
    async fn mismatch_is_reported_and_token_is_kept() {
        let fixture = get_fixture();
        let token = request_token(&fixture);

        let response = fixture
            .server
            .post(endpoints::RESET_PASSWORD_API)
            .form(&[
                ("token", token.as_str()),
                ("new_password", "kata-sandi-baru"),
                ("confirm_password", "kata-sandi-lain"),
            ])
            .await;

        response.assert_status_ok();
        assert_error_after(
            &response,
            "input#confirm-password + p",
            &Error::PasswordMismatch.to_string(),
        );

        let retry = fixture
            .server
            .post(endpoints::RESET_PASSWORD_API)
            .form(&[
                ("token", token.as_str()),
                ("new_password", "kata-sandi-baru"),
                ("confirm_password", "kata-sandi-baru"),
            ])
            .await;
        retry.assert_status(StatusCode::SEE_OTHER);
    }

    #[tokio::test]
    async fn short_password_is_rejected() {
        let fixture = get_fixture();
        let token = request_token(&fixture);

        let response = fixture
            .server
            .post(endpoints::RESET_PASSWORD_API)
            .form(&[
                ("token", token.as_str()),
                ("new_password", "abc"),
                ("confirm_password", "abc"),
            ])
            .await;

        assert_error_after(
            &response,
            "input#new-password + p",
            &Error::PasswordTooShort(MIN_PASSWORD_LENGTH).to_string(),
        );
    }

    #[tokio::test]
    async fn unknown_token_is_reported() {
        let fixture = get_fixture();

        let response = fixture
            .server
            .post(endpoints::RESET_PASSWORD_API)
            .form(&[
                ("token", "bukan-token"),
                ("new_password", "kata-sandi-baru"),
                ("confirm_password", "kata-sandi-baru"),
            ])
            .await;

        response.assert_status_ok();
        assert_error_after(&response, "#token-error", "link");
    }

    #[tokio::test]
    async fn token_cannot_be_used_twice() {
        let fixture = get_fixture();
        let token = request_token(&fixture);
        let form = [
            ("token", token.as_str()),
            ("new_password", "kata-sandi-baru"),
            ("confirm_password", "kata-sandi-baru"),
        ];

        fixture
            .server
            .post(endpoints::RESET_PASSWORD_API)
            .form(&form)
            .await
            .assert_status(StatusCode::SEE_OTHER);

        let response = fixture
            .server
            .post(endpoints::RESET_PASSWORD_API)
            .form(&form)
            .await;

        response.assert_status_ok();
        assert_error_after(&response, "#token-error", "link");
    }
}
