//! The log-in page and the handler for log-in requests.

use std::sync::Arc;

use axum::{
    Form,
    extract::{FromRef, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
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
        AuthError, AuthGate, AuthService, invalidate_auth_cookie, redirect::normalize_redirect_url,
        set_auth_cookie,
    },
    endpoints,
    html::{
        FORM_LABEL_STYLE, LINK_STYLE, base, email_input, log_in_register, password_input,
        submit_button,
    },
};

/// Shown when either field is left empty.
pub const MISSING_CREDENTIALS_ERROR_MSG: &str = "Please enter your email and password";

/// How long the auth cookie should last if the user selects "remember me" at log-in.
const REMEMBER_ME_COOKIE_DURATION: Duration = Duration::days(7);

fn log_in_form(
    email: &str,
    email_error: Option<&str>,
    password_error: Option<&str>,
    redirect_url: Option<&str>,
) -> Markup {
    html! {
        form
            hx-post=(endpoints::LOG_IN_API)
            hx-indicator="this"
            hx-disabled-elt="find button"
            hx-swap="outerHTML"
            hx-target-error="#alert-container"
            class="space-y-4 md:space-y-6"
        {
            @if let Some(redirect_url) = redirect_url {
                input type="hidden" name="redirect_url" value=(redirect_url);
            }

            (email_input(email, email_error))
            (password_input("password", "Password", 0, password_error))

            div class="flex items-center gap-x-3"
            {
                input
                    type="checkbox"
                    name="remember_me"
                    id="remember_me"
                    tabindex="0"
                    class="rounded-xs";

                label for="remember_me" class=(FORM_LABEL_STYLE)
                {
                    "Keep me logged in for one week"
                }
            }

            (submit_button("Log in"))

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Forgot your password? "
                a href=(endpoints::FORGOT_PASSWORD_VIEW) tabindex="0" class=(LINK_STYLE)
                {
                    "Reset it here"
                }
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Don't have an account? "
                a href=(endpoints::REGISTER_VIEW) tabindex="0" class=(LINK_STYLE)
                {
                    "Register here"
                }
            }
        }
    }
}

fn parse_redirect_url(raw_url: Option<&str>, source: &str) -> Option<String> {
    let raw_url = raw_url.filter(|url| !url.is_empty())?;
    let redirect_url = normalize_redirect_url(raw_url);

    if redirect_url.is_none() {
        tracing::warn!("Invalid redirect URL from {source}: {raw_url}");
    }

    redirect_url
}

/// The state needed to log a user in.
#[derive(Clone)]
pub struct LogInState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    pub auth_service: Arc<dyn AuthService>,
}

impl FromRef<AppState> for LogInState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            auth_service: state.auth_service.clone(),
        }
    }
}

impl FromRef<LogInState> for Key {
    fn from_ref(state: &LogInState) -> Self {
        state.cookie_key.clone()
    }
}

#[derive(Deserialize)]
pub struct RedirectQuery {
    pub redirect_url: Option<String>,
}

/// Display the log-in page, or skip it if the user already has a session.
pub async fn get_log_in_page(jar: PrivateCookieJar, Query(query): Query<RedirectQuery>) -> Response {
    let redirect_url = parse_redirect_url(query.redirect_url.as_deref(), "log-in query");

    if let AuthGate::Authenticated(_) = AuthGate::restore(&jar) {
        return Redirect::to(redirect_url.as_deref().unwrap_or(endpoints::TRACKER_VIEW))
            .into_response();
    }

    let form = log_in_form("", None, None, redirect_url.as_deref());
    let content = log_in_register("Log in to your account", &form);
    base("Log In", &content).into_response()
}

/// The raw data entered by the user in the log-in form.
#[derive(Clone, Serialize, Deserialize)]
pub struct LogInData {
    pub email: String,

    pub password: String,

    /// Whether to extend the initial auth cookie duration.
    ///
    /// This value comes from a checkbox, so it either has a string value or is not set
    /// (see the [MDN docs](https://developer.mozilla.org/en-US/docs/Web/HTML/Element/input/checkbox#value_2)).
    /// Any `Some` value means `true`.
    pub remember_me: Option<String>,

    /// Optional URL to redirect to after logging in.
    pub redirect_url: Option<String>,
}

/// Handler for log-in requests via the POST method.
///
/// On success the auth cookie is set and the client is redirected to the
/// page they originally asked for, or the tracker. Otherwise the form is
/// returned with an error message explaining the problem.
pub async fn post_log_in(
    State(state): State<LogInState>,
    jar: PrivateCookieJar,
    Form(user_data): Form<LogInData>,
) -> Response {
    let redirect_url = parse_redirect_url(user_data.redirect_url.as_deref(), "log-in form");
    let redirect_url = redirect_url.as_deref();
    let email = user_data.email.trim();

    if email.is_empty() || user_data.password.is_empty() {
        return log_in_form(email, None, Some(MISSING_CREDENTIALS_ERROR_MSG), redirect_url)
            .into_response();
    }

    let Ok(parsed_email) = email.parse::<EmailAddress>() else {
        let message = Error::InvalidEmail(email.to_owned()).to_string();
        return log_in_form(email, Some(&message), None, redirect_url).into_response();
    };

    let user = match state.auth_service.sign_in(&parsed_email, &user_data.password) {
        Ok(user) => user,
        Err(error @ AuthError::InvalidCredentials) => {
            return log_in_form(email, None, Some(&error.to_string()), redirect_url)
                .into_response();
        }
        Err(error) => {
            tracing::error!("Unhandled error while verifying credentials: {error}");
            return Error::Auth(error).into_alert_response();
        }
    };

    let cookie_duration = if user_data.remember_me.is_some() {
        REMEMBER_ME_COOKIE_DURATION
    } else {
        state.cookie_duration
    };

    let redirect_url = redirect_url.unwrap_or(endpoints::TRACKER_VIEW);

    match set_auth_cookie(jar.clone(), user.id, cookie_duration) {
        Ok(updated_jar) => (
            StatusCode::SEE_OTHER,
            HxRedirect(redirect_url.to_owned()),
            updated_jar,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("Error setting auth cookie: {error}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                HxRedirect(endpoints::INTERNAL_ERROR_VIEW.to_owned()),
                invalidate_auth_cookie(jar),
            )
                .into_response()
        }
    }
}


#[cfg(test)]
mod log_in_tests {
    use axum::{Router, http::StatusCode, routing::post};
    use axum_test::{TestResponse, TestServer};
    use time::{Duration, OffsetDateTime};

    use crate::{
        auth::{AuthError, COOKIE_TOKEN},
        endpoints,
        test_utils::{TEST_EMAIL, TEST_PASSWORD, sign_up_test_user, test_app_state},
    };

    use super::{
        LogInState, MISSING_CREDENTIALS_ERROR_MSG, REMEMBER_ME_COOKIE_DURATION, post_log_in,
    };

    fn get_server() -> TestServer {
        let (state, _) = test_app_state();
        sign_up_test_user(&state);
        let state = LogInState {
            cookie_key: state.cookie_key,
            cookie_duration: state.cookie_duration,
            auth_service: state.auth_service,
        };
        let app = Router::new()
            .route(endpoints::LOG_IN_API, post(post_log_in))
            .with_state(state);

        TestServer::try_new(app).expect("Could not create test server.")
    }

    #[track_caller]
    fn assert_password_error(response: &TestResponse, want: &str) {
        let html = scraper::Html::parse_fragment(&response.text());
        let error = html
            .select(&scraper::Selector::parse("input#password + p.text-red-500.text-base").unwrap())
            .next()
            .expect("want an error message after the password input");

        assert_eq!(error.text().collect::<String>(), want);
    }

    #[tokio::test]
    async fn log_in_succeeds_with_valid_credentials() {
        let server = get_server();

        let response = server
            .post(endpoints::LOG_IN_API)
            .form(&[("email", TEST_EMAIL), ("password", TEST_PASSWORD)])
            .await;

        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(response.header("hx-redirect"), endpoints::TRACKER_VIEW);
        assert!(response.maybe_cookie(COOKIE_TOKEN).is_some());
    }

    #[tokio::test]
    async fn log_in_redirects_to_requested_url() {
        let server = get_server();
        let redirect_url = "/tracker?month=2025-03";

        let response = server
            .post(endpoints::LOG_IN_API)
            .form(&[
                ("email", TEST_EMAIL),
                ("password", TEST_PASSWORD),
                ("redirect_url", redirect_url),
            ])
            .await;

        assert_eq!(response.header("hx-redirect"), redirect_url);
    }

    #[tokio::test]
    async fn log_in_falls_back_on_invalid_redirect_url() {
        let server = get_server();

        let response = server
            .post(endpoints::LOG_IN_API)
            .form(&[
                ("email", TEST_EMAIL),
                ("password", TEST_PASSWORD),
                ("redirect_url", "https://example.com"),
            ])
            .await;

        assert_eq!(response.header("hx-redirect"), endpoints::TRACKER_VIEW);
    }

    #[tokio::test]
    async fn remember_me_extends_auth_cookie() {
        let server = get_server();

        let response = server
            .post(endpoints::LOG_IN_API)
            .form(&[
                ("email", TEST_EMAIL),
                ("password", TEST_PASSWORD),
                ("remember_me", "on"),
            ])
            .await;

        let expires = response.cookie(COOKIE_TOKEN).expires_datetime().unwrap();
        let want = OffsetDateTime::now_utc() + REMEMBER_ME_COOKIE_DURATION;
        assert!(
            (expires - want).abs() < Duration::seconds(2),
            "got expiry {expires:?}, want {want:?}"
        );
    }

    #[tokio::test]
    async fn empty_fields_show_missing_credentials_message() {
        let server = get_server();

        let response = server
            .post(endpoints::LOG_IN_API)
            .form(&[("email", TEST_EMAIL), ("password", "")])
            .await;

        response.assert_status_ok();
        assert_password_error(&response, MISSING_CREDENTIALS_ERROR_MSG);
    }

    #[tokio::test]
    async fn wrong_password_shows_invalid_credentials_message() {
        let server = get_server();

        let response = server
            .post(endpoints::LOG_IN_API)
            .form(&[("email", TEST_EMAIL), ("password", "salahsalah")])
            .await;

        response.assert_status_ok();
        assert!(response.maybe_cookie(COOKIE_TOKEN).is_none());
        assert_password_error(&response, &AuthError::InvalidCredentials.to_string());
    }

    #[tokio::test]
    async fn unknown_email_shows_the_same_message() {
        let server = get_server();

        let response = server
            .post(endpoints::LOG_IN_API)
            .form(&[("email", "budi@example.com"), ("password", TEST_PASSWORD)])
            .await;

        assert_password_error(&response, &AuthError::InvalidCredentials.to_string());
    }

    #[tokio::test]
    async fn missing_form_fields_are_rejected() {
        let server = get_server();

        server
            .post(endpoints::LOG_IN_API)
            .content_type("application/x-www-form-urlencoded")
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }
}
