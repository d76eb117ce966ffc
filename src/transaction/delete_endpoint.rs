use std::sync::Arc;

use axum::{
    Extension,
    extract::{FromRef, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use serde::Deserialize;

use crate::{
    AppState, Error,
    auth::UserID,
    endpoints,
    transaction::{
        MonthKey, TransactionId, TransactionStore,
        tracker_page::{Notice, tracker_url},
    },
};

/// The state needed to delete a transaction.
#[derive(Clone)]
pub struct DeleteTransactionState {
    pub transaction_store: Arc<dyn TransactionStore>,
}

impl FromRef<AppState> for DeleteTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            transaction_store: state.transaction_store.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    /// The tracker month to return to.
    pub month: Option<String>,
}

/// A route handler for deleting one of the signed-in user's transactions.
///
/// Redirects back to the tracker month the request came from, or responds
/// with an alert if no transaction matches both the ID and the user.
pub async fn delete_transaction_endpoint(
    State(state): State<DeleteTransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<String>,
    Query(query): Query<DeleteQuery>,
) -> Response {
    let transaction_id = TransactionId::new_unchecked(&transaction_id);

    if let Err(error) = state.transaction_store.delete(&transaction_id, user_id) {
        tracing::error!("Could not delete transaction {transaction_id}: {error}");
        return Error::from(error).into_alert_response();
    }

    let redirect_url = match query.month.as_deref().map(str::parse::<MonthKey>) {
        Some(Ok(month)) => tracker_url(month, Some(Notice::Deleted)),
        _ => format!("{}?notice=deleted", endpoints::TRACKER_VIEW),
    };

    (HxRedirect(redirect_url), StatusCode::SEE_OTHER).into_response()
}
