//! Assertions about the forms rendered by page handlers.

use scraper::{ElementRef, Html, Selector};

fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|error| panic!("bad selector {css:?}: {error}"))
}

/// The first form in `html`.
#[track_caller]
pub(crate) fn must_get_form(html: &Html) -> ElementRef<'_> {
    html.select(&selector("form"))
        .next()
        .expect("want a form in the document")
}

/// Check that `form` sends its request to `endpoint` through the HTMX
/// attribute `attribute`, e.g. `hx-post`.
#[track_caller]
pub(crate) fn assert_hx_endpoint(form: &ElementRef<'_>, endpoint: &str, attribute: &str) {
    match form.value().attr(attribute) {
        Some(actual) => assert_eq!(actual, endpoint, "form has the wrong {attribute}"),
        None => panic!("form is missing {attribute}, want {attribute}=\"{endpoint}\""),
    }
}

#[track_caller]
fn must_get_required_input<'a>(
    form: &ElementRef<'a>,
    name: &str,
    input_type: &str,
) -> ElementRef<'a> {
    let input = form
        .select(&selector(&format!("input[name=\"{name}\"]")))
        .next()
        .unwrap_or_else(|| panic!("want an input named {name:?}"));

    assert_eq!(
        input.value().attr("type"),
        Some(input_type),
        "input {name:?} has the wrong type"
    );
    assert!(
        input.value().attr("required").is_some(),
        "want input {name:?} to be required"
    );

    input
}

/// Check that `form` has a required input called `name` of type `input_type`.
#[track_caller]
pub(crate) fn assert_form_input(form: &ElementRef<'_>, name: &str, input_type: &str) {
    must_get_required_input(form, name, input_type);
}

/// Like [assert_form_input], and also check the input's initial value.
#[track_caller]
pub(crate) fn assert_form_input_with_value(
    form: &ElementRef<'_>,
    name: &str,
    input_type: &str,
    value: &str,
) {
    let input = must_get_required_input(form, name, input_type);

    assert_eq!(
        input.value().attr("value").unwrap_or_default(),
        value,
        "input {name:?} has the wrong value"
    );
}

#[track_caller]
pub(crate) fn assert_form_submit_button(form: &ElementRef<'_>) {
    let has_submit_button = form
        .select(&selector("button"))
        .any(|button| button.value().attr("type") == Some("submit"));

    assert!(has_submit_button, "want a button with type=\"submit\"");
}
