use std::sync::Arc;

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;

use crate::{
    AppState, Error,
    auth::UserID,
    transaction::{
        TransactionId, TransactionStore,
        form::TransactionForm,
        tracker_page::{Notice, tracker_url},
    },
};

/// The state needed to edit a transaction.
#[derive(Clone)]
pub struct EditTransactionState {
    pub transaction_store: Arc<dyn TransactionStore>,
}

impl FromRef<AppState> for EditTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            transaction_store: state.transaction_store.clone(),
        }
    }
}

/// Replace the fields of one of the signed-in user's transactions, then
/// redirect to the tracker for the transaction's new month.
pub async fn edit_transaction_endpoint(
    State(state): State<EditTransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<String>,
    Form(form): Form<TransactionForm>,
) -> Response {
    let transaction_id = TransactionId::new_unchecked(&transaction_id);

    let fields = match form.validate() {
        Ok(fields) => fields,
        Err(error) => return error.into_alert_response(),
    };

    match state
        .transaction_store
        .update(&transaction_id, user_id, fields)
    {
        Ok(transaction) => (
            HxRedirect(tracker_url(transaction.month, Some(Notice::Updated))),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("Could not update transaction {transaction_id}: {error}");
            Error::from(error).into_alert_response()
        }
    }
}
