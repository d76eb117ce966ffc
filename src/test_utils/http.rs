//! Header checks for responses from handlers called directly.

use axum::{body::Body, response::Response};

/// The value of the header `header_name`, panicking if it is missing or not
/// visible ASCII.
#[track_caller]
pub(crate) fn get_header(response: &Response<Body>, header_name: &str) -> String {
    let Some(value) = response.headers().get(header_name) else {
        panic!("want the header {header_name:?}, got {:?}", response.headers());
    };

    match value.to_str() {
        Ok(value) => value.to_owned(),
        Err(error) => panic!("header {header_name:?} is not a string: {error}"),
    }
}

#[track_caller]
pub(crate) fn assert_content_type(response: &Response<Body>, content_type: &str) {
    assert_eq!(get_header(response, "content-type"), content_type);
}

/// Check that an HTMX request is sent to `endpoint`.
#[track_caller]
pub(crate) fn assert_hx_redirect(response: &Response<Body>, endpoint: &str) {
    assert_eq!(get_header(response, "hx-redirect"), endpoint);
}
