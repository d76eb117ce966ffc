//! The 404 page for unknown routes and records that do not exist.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::html::error_view;

const DESCRIPTION: &str = "Something's missing.";
const FIX: &str = "We couldn't find that page. Head back to your tracker to carry on.";

/// Renders the 404 page.
pub struct NotFoundError;

impl IntoResponse for NotFoundError {
    fn into_response(self) -> Response {
        let page = error_view("Not Found", "404", DESCRIPTION, FIX);

        (StatusCode::NOT_FOUND, Html(page.into_string())).into_response()
    }
}

/// The fallback handler for unknown routes.
pub async fn get_404_not_found() -> Response {
    NotFoundError.into_response()
}
