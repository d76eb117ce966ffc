//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router, middleware,
    response::Redirect,
    routing::{get, post, put},
};
use axum_extra::extract::PrivateCookieJar;
use tower_http::services::ServeDir;

use crate::{
    AppState,
    auth::{
        AuthGate, auth_guard, auth_guard_hx, get_forgot_password_page, get_log_in_page,
        get_log_out, get_register_page, get_reset_password_page, post_forgot_password,
        post_log_in, post_reset_password, register_user,
    },
    endpoints,
    internal_server_error::get_internal_server_error_page,
    not_found::get_404_not_found,
    profile::{
        get_confirm_email_page, get_profile_page, update_display_name_endpoint,
        update_email_endpoint, update_password_endpoint,
    },
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, edit_transaction_endpoint,
        get_edit_transaction_page, get_tracker_page,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::ROOT, get(get_root))
        .route(endpoints::LOG_IN_VIEW, get(get_log_in_page))
        .route(endpoints::LOG_IN_API, post(post_log_in))
        .route(endpoints::LOG_OUT, get(get_log_out))
        .route(endpoints::REGISTER_VIEW, get(get_register_page))
        .route(endpoints::USERS, post(register_user))
        .route(
            endpoints::FORGOT_PASSWORD_VIEW,
            get(get_forgot_password_page),
        )
        .route(endpoints::FORGOT_PASSWORD_API, post(post_forgot_password))
        .route(endpoints::RESET_PASSWORD_VIEW, get(get_reset_password_page))
        .route(endpoints::RESET_PASSWORD_API, post(post_reset_password))
        // Opened from an email, possibly on a device without a session.
        .route(endpoints::CONFIRM_EMAIL_VIEW, get(get_confirm_email_page))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        );

    let protected_routes = Router::new()
        .route(endpoints::TRACKER_VIEW, get(get_tracker_page))
        .route(
            endpoints::EDIT_TRANSACTION_VIEW,
            get(get_edit_transaction_page),
        )
        .route(endpoints::PROFILE_VIEW, get(get_profile_page))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    // These routes need to use the HX-REDIRECT header for auth redirects to work properly for HTMX requests.
    let protected_routes = protected_routes.merge(
        Router::new()
            .route(
                endpoints::TRANSACTIONS_API,
                post(create_transaction_endpoint),
            )
            .route(
                endpoints::TRANSACTION,
                put(edit_transaction_endpoint).delete(delete_transaction_endpoint),
            )
            .route(
                endpoints::PROFILE_NAME_API,
                post(update_display_name_endpoint),
            )
            .route(endpoints::PROFILE_EMAIL_API, post(update_email_endpoint))
            .route(
                endpoints::PROFILE_PASSWORD_API,
                post(update_password_endpoint),
            )
            .layer(middleware::from_fn_with_state(state.clone(), auth_guard_hx)),
    );

    protected_routes
        .merge(unprotected_routes)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The root path '/' shows the tracker to signed-in users and the log-in
/// page to everyone else.
async fn get_root(jar: PrivateCookieJar) -> Redirect {
    match AuthGate::restore(&jar) {
        AuthGate::Authenticated(_) => Redirect::to(endpoints::TRACKER_VIEW),
        AuthGate::Loading | AuthGate::Unauthenticated => Redirect::to(endpoints::LOG_IN_VIEW),
    }
}
