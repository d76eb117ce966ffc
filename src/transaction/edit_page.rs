use std::sync::Arc;

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use maud::html;

use crate::{
    AppState, Error,
    auth::UserID,
    endpoints::{self, format_endpoint},
    html::{FORM_CONTAINER_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, base, submit_button},
    navigation::NavBar,
    transaction::{
        TransactionId, TransactionStore,
        form::{TransactionFormDefaults, transaction_form_fields},
        tracker_page::tracker_url,
    },
};

/// The state needed for the edit transaction page.
#[derive(Clone)]
pub struct EditTransactionPageState {
    pub transaction_store: Arc<dyn TransactionStore>,
}

impl FromRef<AppState> for EditTransactionPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            transaction_store: state.transaction_store.clone(),
        }
    }
}

/// Renders the page for editing a transaction. Transactions owned by someone
/// else are reported as not found.
pub async fn get_edit_transaction_page(
    State(state): State<EditTransactionPageState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<String>,
) -> Result<Response, Error> {
    let transaction_id = TransactionId::new_unchecked(&transaction_id);

    let transaction = state
        .transaction_store
        .get(&transaction_id, user_id)
        .inspect_err(|error| {
            tracing::warn!("Could not get transaction {transaction_id} for editing: {error}")
        })?;

    let defaults = TransactionFormDefaults {
        kind: transaction.kind,
        amount: Some(transaction.amount),
        date: transaction.date,
        description: Some(&transaction.description),
        autofocus_amount: true,
    };
    let back_url = tracker_url(transaction.month, None);

    let content = html! {
        (NavBar::new(endpoints::EDIT_TRANSACTION_VIEW).into_html())

        main class=(PAGE_CONTAINER_STYLE)
        {
            form
                hx-put=(format_endpoint(endpoints::TRANSACTION, &transaction.id))
                hx-indicator="this"
                hx-disabled-elt="find button"
                hx-target-error="#alert-container"
                class=(FORM_CONTAINER_STYLE)
            {
                h1 class="text-xl font-bold" { "Edit transaction" }

                (transaction_form_fields(&defaults))

                (submit_button("Save changes"))

                a href=(back_url) class=(LINK_STYLE) { "Cancel" }
            }
        }
    };

    Ok(base("Edit Transaction", &content).into_response())
}
