//! Changing the name the app greets the user with.

use axum::{
    Extension, Form,
    extract::State,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use crate::{
    Error,
    auth::{UserID, UserUpdate},
    endpoints,
    html::{FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, submit_button},
    profile::page::{FormFeedback, ProfileState},
};

/// The most user-perceived characters a display name may have.
pub const MAX_DISPLAY_NAME_LENGTH: usize = 64;

pub(super) fn display_name_form(display_name: &str, feedback: FormFeedback) -> Markup {
    html! {
        form
            id="display-name-form"
            hx-post=(endpoints::PROFILE_NAME_API)
            hx-indicator="this"
            hx-disabled-elt="find button"
            hx-swap="outerHTML"
            hx-target-error="#alert-container"
            class=(FORM_CONTAINER_STYLE)
        {
            h2 class="text-lg font-semibold" { "Display name" }

            div
            {
                label for="display-name" class=(FORM_LABEL_STYLE) { "Name" }

                input
                    type="text"
                    name="display_name"
                    id="display-name"
                    placeholder="Leave empty to be greeted by email"
                    class=(FORM_TEXT_INPUT_STYLE)
                    value=(display_name);

                (feedback.error_html())
            }

            (submit_button("Save name"))
            (feedback.success_html())
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct DisplayNameForm {
    #[serde(default)]
    pub display_name: String,
}

/// Trim and save a new display name. An empty name is allowed.
pub async fn update_display_name_endpoint(
    State(state): State<ProfileState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<DisplayNameForm>,
) -> Response {
    let display_name = form.display_name.trim();

    if display_name.graphemes(true).count() > MAX_DISPLAY_NAME_LENGTH {
        let message = Error::DisplayNameTooLong(MAX_DISPLAY_NAME_LENGTH).to_string();
        return display_name_form(display_name, FormFeedback::Error(&message)).into_response();
    }

    let update = UserUpdate {
        display_name: Some(display_name.to_owned()),
        ..Default::default()
    };

    match state.auth_service.update_user(user_id, update) {
        Ok(user) => {
            display_name_form(&user.display_name, FormFeedback::Success("Display name saved"))
                .into_response()
        }
        Err(error) => {
            tracing::error!("Could not update display name for user {user_id}: {error}");
            Error::Auth(error).into_alert_response()
        }
    }
}
