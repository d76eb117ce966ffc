//! Defines the endpoint for creating a new transaction.
use std::sync::Arc;

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
// Must use axum_extra's Form since that parses an empty string as None instead
// of crashing like axum::Form.
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;

use crate::{
    AppState, Error,
    auth::UserID,
    transaction::{
        TransactionStore,
        form::TransactionForm,
        tracker_page::{Notice, tracker_url},
    },
};

/// The state needed to create a transaction.
#[derive(Clone)]
pub struct CreateTransactionState {
    pub transaction_store: Arc<dyn TransactionStore>,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            transaction_store: state.transaction_store.clone(),
        }
    }
}

/// A route handler for creating a new transaction owned by the signed-in
/// user, redirects to the tracker for the transaction's month on success.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<TransactionForm>,
) -> Response {
    let fields = match form.validate() {
        Ok(fields) => fields,
        Err(error) => return error.into_alert_response(),
    };

    match state.transaction_store.create(user_id, fields) {
        Ok(transaction) => (
            HxRedirect(tracker_url(transaction.month, Some(Notice::Created))),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("Could not create transaction: {error}");
            Error::from(error).into_alert_response()
        }
    }
}
