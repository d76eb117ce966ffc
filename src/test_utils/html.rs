//! Parsing response bodies with `scraper`.

use axum::{body::Body, response::Response};
use scraper::Html;

async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("could not read the response body");

    String::from_utf8(bytes.to_vec()).expect("response body is not UTF-8")
}

/// Parse a full page, e.g. from a `GET` on a view.
pub(crate) async fn parse_html_document(response: Response<Body>) -> Html {
    Html::parse_document(&body_text(response).await)
}

/// Parse a partial page, e.g. a form swapped in by HTMX.
pub(crate) async fn parse_html_fragment(response: Response<Body>) -> Html {
    Html::parse_fragment(&body_text(response).await)
}

#[track_caller]
pub(crate) fn assert_valid_html(html: &Html) {
    if !html.errors.is_empty() {
        panic!("want valid HTML, got the parse errors {:?}", html.errors);
    }
}
