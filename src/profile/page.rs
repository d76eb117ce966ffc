//! The profile page that holds the display name, email and password forms.

use std::sync::Arc;

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};

use crate::{
    AppState, Error,
    auth::{AuthService, UserID},
    endpoints,
    html::{FORM_ERROR_STYLE, FORM_SUCCESS_STYLE, PAGE_CONTAINER_STYLE, base},
    navigation::NavBar,
    profile::{
        update_email::email_form, update_name::display_name_form,
        update_password::{PasswordErrors, password_form},
    },
};

/// The state shared by the profile page and the profile update handlers.
#[derive(Clone)]
pub struct ProfileState {
    pub auth_service: Arc<dyn AuthService>,
}

impl FromRef<AppState> for ProfileState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            auth_service: state.auth_service.clone(),
        }
    }
}

/// The message shown at the bottom of a profile form after it was submitted.
pub(super) enum FormFeedback<'a> {
    None,
    Error(&'a str),
    Success(&'a str),
}

impl FormFeedback<'_> {
    /// The success message, if any.
    pub(super) fn success_html(&self) -> Markup {
        match self {
            FormFeedback::Success(message) => html! {
                p class=(FORM_SUCCESS_STYLE) role="status" { (message) }
            },
            FormFeedback::None | FormFeedback::Error(_) => html! {},
        }
    }

    /// The error message, if any. Placed right after the input it is about.
    pub(super) fn error_html(&self) -> Markup {
        match self {
            FormFeedback::Error(message) => html! {
                p class=(FORM_ERROR_STYLE) { (message) }
            },
            FormFeedback::None | FormFeedback::Success(_) => html! {},
        }
    }
}

/// Display the profile page for the signed-in user.
pub async fn get_profile_page(
    State(state): State<ProfileState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let user = state.auth_service.get_user(user_id).inspect_err(|error| {
        tracing::error!("Could not load profile for user {user_id}: {error}")
    })?;

    let content = html! {
        (NavBar::new(endpoints::PROFILE_VIEW).into_html())

        main class=(PAGE_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold" { "Profile" }

            (display_name_form(&user.display_name, FormFeedback::None))
            (email_form(user.email.as_str(), FormFeedback::None))
            (password_form(PasswordErrors::default(), None))
        }
    };

    Ok(base("Profile", &content).into_response())
}

#[cfg(test)]
mod tests {
    use axum::{Extension, extract::State, http::StatusCode};
    use scraper::Selector;

    use crate::{
        auth::UserUpdate,
        endpoints,
        test_utils::{
            TEST_EMAIL, assert_form_input, assert_form_input_with_value, assert_hx_endpoint,
            assert_valid_html, parse_html_document, sign_up_test_user, test_app_state,
        },
    };

    use super::{ProfileState, get_profile_page};

    #[tokio::test]
    async fn shows_three_independent_forms() {
        let (state, _) = test_app_state();
        let user = sign_up_test_user(&state);
        state
            .auth_service
            .update_user(
                user.id,
                UserUpdate {
                    display_name: Some("Siti".to_owned()),
                    ..Default::default()
                },
            )
            .unwrap();
        let state = ProfileState {
            auth_service: state.auth_service,
        };

        let response = get_profile_page(State(state), Extension(user.id))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let document = parse_html_document(response).await;
        assert_valid_html(&document);

        let forms: Vec<_> = document
            .select(&Selector::parse("form").unwrap())
            .collect();
        assert_eq!(forms.len(), 3, "want one form per profile field");

        assert_hx_endpoint(&forms[0], endpoints::PROFILE_NAME_API, "hx-post");
        let name_input = forms[0]
            .select(&Selector::parse("input[name=display_name]").unwrap())
            .next()
            .expect("want a display name input");
        assert_eq!(name_input.value().attr("value"), Some("Siti"));

        assert_hx_endpoint(&forms[1], endpoints::PROFILE_EMAIL_API, "hx-post");
        assert_form_input_with_value(&forms[1], "email", "email", TEST_EMAIL);

        assert_hx_endpoint(&forms[2], endpoints::PROFILE_PASSWORD_API, "hx-post");
        assert_form_input(&forms[2], "new_password", "password");
        assert_form_input(&forms[2], "confirm_password", "password");

        for form in forms {
            assert_eq!(form.value().attr("hx-swap"), Some("outerHTML"));
            assert_eq!(
                form.value().attr("hx-target-error"),
                Some("#alert-container")
            );
        }
    }
}
