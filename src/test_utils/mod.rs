pub(crate) mod form;
pub(crate) mod html;
pub(crate) mod http;
mod state;

pub(crate) use form::{
    assert_form_input, assert_form_input_with_value, assert_form_submit_button,
    assert_hx_endpoint, must_get_form,
};
pub(crate) use html::{assert_valid_html, parse_html_document, parse_html_fragment};
pub(crate) use http::{assert_content_type, assert_hx_redirect, get_header};
pub(crate) use state::{
    RecordingAuthService, TEST_EMAIL, TEST_PASSWORD, sign_up_test_user, test_app_state,
};
