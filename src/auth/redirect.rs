//! Where to send a user after they sign in.
//!
//! When a signed-out user hits a protected page they are sent to the log-in
//! page with the page they wanted in `?redirect_url=`. Only paths on this
//! server are accepted so the parameter cannot be used to bounce users to
//! another site.

use axum::{extract::Request, http::Uri};

use crate::endpoints;

/// Pages that make no sense to return to after signing in.
const NON_RETURNABLE_PATHS: [&str; 2] = [endpoints::LOG_IN_VIEW, endpoints::LOG_OUT];

fn is_local_path(path_and_query: &str) -> bool {
    if !path_and_query.starts_with('/') || path_and_query.starts_with("//") {
        return false;
    }

    let path = path_and_query
        .split_once('?')
        .map_or(path_and_query, |(path, _)| path);

    !NON_RETURNABLE_PATHS.contains(&path)
}

/// Reduce `raw_url` to a path and query on this server, or `None` if it
/// points elsewhere.
pub fn normalize_redirect_url(raw_url: &str) -> Option<String> {
    let uri = raw_url.parse::<Uri>().ok()?;
    if uri.scheme().is_some() || uri.authority().is_some() {
        return None;
    }

    let path_and_query = uri.path_and_query()?.as_str();
    is_local_path(path_and_query).then(|| path_and_query.to_owned())
}

/// The `HX-Current-URL` header is always absolute, only its path is kept.
fn path_of_hx_current_url(raw_url: &str) -> Option<String> {
    let uri = raw_url.parse::<Uri>().ok()?;
    let path_and_query = uri.path_and_query()?.as_str();

    is_local_path(path_and_query).then(|| path_and_query.to_owned())
}

/// The log-in URL that returns the user to `target` afterwards.
pub fn log_in_url_returning_to(target: &str) -> Option<String> {
    match serde_urlencoded::to_string([("redirect_url", target)]) {
        Ok(query) => Some(format!("{}?{query}", endpoints::LOG_IN_VIEW)),
        Err(error) => {
            tracing::error!("Could not encode redirect URL {target}: {error}");
            None
        }
    }
}

/// The log-in URL for a request that was refused for lack of a session.
///
/// Page requests return to the requested URL. HTMX requests to `/api`
/// return to the page the request was made from.
pub fn build_log_in_redirect_url(request: &Request) -> Option<String> {
    let target = if request.uri().path().starts_with("/api") {
        page_of_hx_request(request)?
    } else {
        normalize_redirect_url(request.uri().path_and_query()?.as_str())?
    };

    log_in_url_returning_to(&target)
}

fn page_of_hx_request(request: &Request) -> Option<String> {
    let headers = request.headers();
    let is_hx_request = headers
        .get("hx-request")
        .and_then(|header| header.to_str().ok())
        .is_some_and(|header| header.eq_ignore_ascii_case("true"));

    if !is_hx_request {
        tracing::warn!("Missing HX-Request header for /api request.");
        return None;
    }

    let Some(current_url) = headers
        .get("hx-current-url")
        .and_then(|header| header.to_str().ok())
    else {
        tracing::warn!("Missing HX-Current-URL header for /api request.");
        return None;
    };

    let target = path_of_hx_current_url(current_url);
    if target.is_none() {
        tracing::warn!("Invalid HX-Current-URL header value: {current_url}");
    }

    target
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, extract::Request};

    use crate::{
        auth::redirect::{build_log_in_redirect_url, normalize_redirect_url},
        endpoints,
    };

    #[test]
    fn keeps_local_paths_with_query() {
        assert_eq!(
            normalize_redirect_url("/tracker?month=2025-03"),
            Some("/tracker?month=2025-03".to_owned())
        );
    }

    #[test]
    fn rejects_other_sites() {
        for url in ["https://example.com/tracker", "//example.com/tracker", "tracker"] {
            assert_eq!(normalize_redirect_url(url), None, "accepted {url}");
        }
    }

    #[test]
    fn rejects_log_in_and_log_out() {
        assert_eq!(normalize_redirect_url(endpoints::LOG_IN_VIEW), None);
        assert_eq!(normalize_redirect_url(endpoints::LOG_OUT), None);
    }

    #[test]
    fn page_request_returns_to_itself() {
        let request = Request::get("/profile").body(Body::empty()).unwrap();

        assert_eq!(
            build_log_in_redirect_url(&request),
            Some(format!("{}?redirect_url=%2Fprofile", endpoints::LOG_IN_VIEW))
        );
    }

    #[test]
    fn api_request_returns_to_current_page() {
        let request = Request::post("/api/transactions")
            .header("HX-Request", "true")
            .header("HX-Current-URL", "http://localhost:3000/tracker?month=2025-03")
            .body(Body::empty())
            .unwrap();

        assert_eq!(
            build_log_in_redirect_url(&request),
            Some(format!(
                "{}?redirect_url=%2Ftracker%3Fmonth%3D2025-03",
                endpoints::LOG_IN_VIEW
            ))
        );
    }

    #[test]
    fn api_request_without_htmx_headers_has_no_target() {
        let request = Request::post("/api/transactions")
            .body(Body::empty())
            .unwrap();

        assert_eq!(build_log_in_redirect_url(&request), None);
    }
}
