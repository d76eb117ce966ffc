//! Changing the email address used to sign in.
//!
//! The new address only takes effect once the user opens the link mailed to
//! it, see [get_confirm_email_page].

use std::sync::Arc;

use axum::{
    Extension, Form,
    extract::{FromRef, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use email_address::EmailAddress;
use maud::{Markup, html};
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    auth::{AuthError, AuthService, UserID, UserUpdate},
    endpoints,
    html::{
        FORM_CONTAINER_STYLE, FORM_ERROR_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base,
        link, log_in_register, submit_button,
    },
    profile::page::{FormFeedback, ProfileState},
};

pub(super) fn email_form(email: &str, feedback: FormFeedback) -> Markup {
    html! {
        form
            id="email-form"
            hx-post=(endpoints::PROFILE_EMAIL_API)
            hx-indicator="this"
            hx-disabled-elt="find button"
            hx-swap="outerHTML"
            hx-target-error="#alert-container"
            class=(FORM_CONTAINER_STYLE)
        {
            h2 class="text-lg font-semibold" { "Email address" }

            div
            {
                label for="new-email" class=(FORM_LABEL_STYLE) { "Email" }

                input
                    type="email"
                    name="email"
                    id="new-email"
                    placeholder="name@example.com"
                    class=(FORM_TEXT_INPUT_STYLE)
                    required
                    value=(email);

                (feedback.error_html())
            }

            (submit_button("Change email"))
            (feedback.success_html())
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct EmailForm {
    pub email: String,
}

/// Start an email change by mailing a confirmation link to the new address.
pub async fn update_email_endpoint(
    State(state): State<ProfileState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<EmailForm>,
) -> Response {
    let email = form.email.trim();

    let Ok(new_email) = email.parse::<EmailAddress>() else {
        let message = Error::InvalidEmail(email.to_owned()).to_string();
        return email_form(email, FormFeedback::Error(&message)).into_response();
    };

    let update = UserUpdate {
        email: Some(new_email.clone()),
        ..Default::default()
    };

    match state.auth_service.update_user(user_id, update) {
        Ok(user) if user.email.as_str().eq_ignore_ascii_case(new_email.as_str()) => {
            email_form(
                user.email.as_str(),
                FormFeedback::Success("This is already your email address"),
            )
            .into_response()
        }
        Ok(user) => {
            let message = format!(
                "We sent a link to {new_email}. Your email address will change once you open it."
            );
            email_form(user.email.as_str(), FormFeedback::Success(&message)).into_response()
        }
        Err(error @ AuthError::EmailTaken) => {
            let message = error.to_string();
            email_form(email, FormFeedback::Error(&message)).into_response()
        }
        Err(error) => {
            tracing::error!("Could not start email change for user {user_id}: {error}");
            Error::Auth(error).into_alert_response()
        }
    }
}

/// The state needed to confirm an email change.
#[derive(Clone)]
pub struct ConfirmEmailState {
    pub auth_service: Arc<dyn AuthService>,
}

impl FromRef<AppState> for ConfirmEmailState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            auth_service: state.auth_service.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ConfirmEmailQuery {
    pub token: Option<String>,
}

/// Apply a pending email change from the link in a confirmation email.
///
/// Does not need a session, the link may be opened on another device. A
/// failed confirmation leaves the link usable until it expires.
pub async fn get_confirm_email_page(
    State(state): State<ConfirmEmailState>,
    Query(query): Query<ConfirmEmailQuery>,
) -> Response {
    let token = query.token.unwrap_or_default();

    let result = if token.is_empty() {
        Err(AuthError::InvalidToken)
    } else {
        state.auth_service.confirm_email_change(&token)
    };

    match result {
        Ok(user) => {
            let content = html! {
                p class="text-gray-900 dark:text-white"
                {
                    "You can now sign in with " strong { (user.email.as_str()) } "."
                }

                p { (link(endpoints::TRACKER_VIEW, "Go to your tracker")) }
            };

            base(
                "Email Confirmed",
                &log_in_register("Email address confirmed", &content),
            )
            .into_response()
        }
        Err(error) => {
            if !matches!(error, AuthError::InvalidToken) {
                tracing::error!("Could not confirm email change: {error}");
            }

            let content = html! {
                p class=(FORM_ERROR_STYLE) { (error.to_string()) }

                p { (link(endpoints::PROFILE_VIEW, "Back to your profile")) }
            };

            (
                error.status_code(),
                base(
                    "Email Not Confirmed",
                    &log_in_register("Could not confirm email", &content),
                ),
            )
                .into_response()
        }
    }
}


#[cfg(test)]
mod confirm_email_tests {
    use axum::{Router, http::StatusCode, routing::get};
    use axum_test::TestServer;
    use email_address::EmailAddress;

    use crate::{
        auth::{AuthError, AuthService, RecordingMailer, User, UserUpdate, ValidatedPassword},
        endpoints,
        test_utils::{sign_up_test_user, test_app_state},
    };

    use super::{ConfirmEmailState, get_confirm_email_page};

    fn get_fixture() -> (TestServer, ConfirmEmailState, RecordingMailer, User) {
        let (state, mailer) = test_app_state();
        let user = sign_up_test_user(&state);
        let new_email: EmailAddress = "siti.baru@example.com".parse().unwrap();
        state
            .auth_service
            .update_user(
                user.id,
                UserUpdate {
                    email: Some(new_email),
                    ..Default::default()
                },
            )
            .unwrap();

        let state = ConfirmEmailState {
            auth_service: state.auth_service,
        };
        let app = Router::new()
            .route(endpoints::CONFIRM_EMAIL_VIEW, get(get_confirm_email_page))
            .with_state(state.clone());

        (
            TestServer::try_new(app).expect("Could not create test server."),
            state,
            mailer,
            user,
        )
    }

    #[tokio::test]
    async fn link_applies_the_new_address_once() {
        let (server, state, mailer, user) = get_fixture();
        let token = mailer.last_token();

        let response = server
            .get(endpoints::CONFIRM_EMAIL_VIEW)
            .add_query_param("token", &token)
            .await;

        response.assert_status_ok();
        assert!(response.text().contains("siti.baru@example.com"));
        assert_eq!(
            state.auth_service.get_user(user.id).unwrap().email.as_str(),
            "siti.baru@example.com"
        );

        let reused = server
            .get(endpoints::CONFIRM_EMAIL_VIEW)
            .add_query_param("token", &token)
            .await;
        reused.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn address_taken_before_confirming_is_reported() {
        let (server, state, mailer, user) = get_fixture();
        let token = mailer.last_token();
        let taken: EmailAddress = "siti.baru@example.com".parse().unwrap();
        state
            .auth_service
            .sign_up(&taken, ValidatedPassword::new_unchecked("rahasia123"))
            .unwrap();

        let response = server
            .get(endpoints::CONFIRM_EMAIL_VIEW)
            .add_query_param("token", &token)
            .await;

        response.assert_status(StatusCode::CONFLICT);
        assert!(response.text().contains(&AuthError::EmailTaken.to_string()));
        assert_eq!(
            state.auth_service.get_user(user.id).unwrap().email,
            user.email
        );
    }

    #[tokio::test]
    async fn missing_token_is_rejected() {
        let (server, state, _, user) = get_fixture();

        let response = server.get(endpoints::CONFIRM_EMAIL_VIEW).await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(
            state.auth_service.get_user(user.id).unwrap().email,
            user.email
        );
    }
}
