//! The tracker page: a month's totals, the new transaction form and the
//! month's transactions.

use std::sync::Arc;

use axum::{
    Extension,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    AppState, Error,
    alert::Alert,
    auth::{AuthService, UserID},
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_DELETE_STYLE, FORM_CONTAINER_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE,
        TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, format_currency,
        submit_button,
    },
    navigation::NavBar,
    timezone::local_today,
    transaction::{
        MonthKey, MonthlySummary, Transaction, TransactionKind, TransactionStore,
        form::{TransactionFormDefaults, transaction_form_fields},
        summarize,
    },
};

/// A one-shot message shown after a change redirects back to the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Notice {
    Created,
    Updated,
    Deleted,
}

impl Notice {
    fn as_str(self) -> &'static str {
        match self {
            Notice::Created => "created",
            Notice::Updated => "updated",
            Notice::Deleted => "deleted",
        }
    }

    fn message(self) -> &'static str {
        match self {
            Notice::Created => "Transaction added",
            Notice::Updated => "Transaction updated",
            Notice::Deleted => "Transaction deleted",
        }
    }
}

/// The URL of the tracker page for `month`.
pub fn tracker_url(month: MonthKey, notice: Option<Notice>) -> String {
    match notice {
        Some(notice) => format!(
            "{}?month={month}&notice={}",
            endpoints::TRACKER_VIEW,
            notice.as_str()
        ),
        None => format!("{}?month={month}", endpoints::TRACKER_VIEW),
    }
}

/// The state needed for the tracker page.
#[derive(Clone)]
pub struct TrackerState {
    pub transaction_store: Arc<dyn TransactionStore>,
    pub auth_service: Arc<dyn AuthService>,
    /// The local timezone as a canonical timezone name, e.g. "Asia/Jakarta".
    pub local_timezone: String,
}

impl FromRef<AppState> for TrackerState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            transaction_store: state.transaction_store.clone(),
            auth_service: state.auth_service.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct TrackerQuery {
    /// The month to show as "YYYY-MM", defaults to the current month.
    pub month: Option<String>,
    pub notice: Option<Notice>,
}

fn selected_month(raw_month: Option<&str>, today: Date) -> MonthKey {
    let current_month = MonthKey::from_date(today);

    match raw_month.filter(|month| !month.is_empty()) {
        None => current_month,
        Some(raw_month) => raw_month.parse().unwrap_or_else(|error| {
            tracing::warn!("{error}, showing the current month instead");
            current_month
        }),
    }
}

/// Render the selected month's totals and transactions for the signed-in user.
pub async fn get_tracker_page(
    State(state): State<TrackerState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<TrackerQuery>,
) -> Result<Response, Error> {
    let Some(today) = local_today(&state.local_timezone) else {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        return Err(Error::InvalidTimezoneError(state.local_timezone));
    };

    let month = selected_month(query.month.as_deref(), today);

    let user = state
        .auth_service
        .get_user(user_id)
        .inspect_err(|error| tracing::error!("Could not get user {user_id}: {error}"))?;

    let transactions = state
        .transaction_store
        .list(user_id)
        .inspect_err(|error| tracing::error!("Could not list transactions: {error}"))?;

    let summary = summarize(&transactions, month);
    let month_transactions: Vec<&Transaction> = transactions
        .iter()
        .filter(|transaction| transaction.month == month)
        .collect();

    let form_date = if month == MonthKey::from_date(today) {
        today
    } else {
        month.first_day().unwrap_or(today)
    };

    let content = html! {
        (NavBar::new(endpoints::TRACKER_VIEW).into_html())

        main class=(PAGE_CONTAINER_STYLE)
        {
            header class="w-full max-w-5xl"
            {
                h1 class="text-xl font-bold" { "Hi, " (user.greeting_name()) }
            }

            @if let Some(notice) = query.notice {
                div class="w-full max-w-5xl" id="notice"
                {
                    (Alert::Success { message: notice.message().to_owned() }.into_html())
                }
            }

            (month_selector(month))
            (summary_cards(&summary))

            div class="w-full max-w-5xl flex flex-col lg:flex-row gap-6 items-start"
            {
                (new_transaction_form(form_date))
                (transactions_table(&month_transactions, month))
            }
        }
    };

    Ok(base("Tracker", &content).into_response())
}

fn month_selector(selected: MonthKey) -> Markup {
    let month_link_style = |is_selected: bool| {
        if is_selected {
            "block rounded px-2 py-1 text-center text-sm font-semibold bg-blue-600 text-white"
        } else {
            "block rounded px-2 py-1 text-center text-sm text-gray-700 hover:bg-gray-100 \
            dark:text-gray-300 dark:hover:bg-gray-700"
        }
    };

    html! {
        nav class="w-full max-w-5xl space-y-2" aria-label="Month"
        {
            div class="flex items-center justify-between"
            {
                @if let Some(previous) = selected.previous_year() {
                    a href=(tracker_url(previous, None)) class=(LINK_STYLE)
                    {
                        "‹ " (previous.year())
                    }
                } @else {
                    span {}
                }

                span class="text-lg font-semibold" { (selected.year()) }

                @if let Some(next) = selected.next_year() {
                    a href=(tracker_url(next, None)) class=(LINK_STYLE)
                    {
                        (next.year()) " ›"
                    }
                } @else {
                    span {}
                }
            }

            ul class="grid grid-cols-6 lg:grid-cols-12 gap-1"
            {
                @for month in selected.months_of_year() {
                    li
                    {
                        a
                            href=(tracker_url(month, None))
                            class=(month_link_style(month == selected))
                            aria-current=[(month == selected).then_some("page")]
                        {
                            (short_month_name(month))
                        }
                    }
                }
            }
        }
    }
}

fn short_month_name(month: MonthKey) -> String {
    month.month().to_string().chars().take(3).collect()
}

fn summary_cards(summary: &MonthlySummary) -> Markup {
    let balance_class = if summary.balance < Decimal::ZERO {
        "text-2xl font-bold tabular-nums text-red-700 dark:text-red-300"
    } else {
        "text-2xl font-bold tabular-nums text-gray-900 dark:text-white"
    };

    html! {
        section class="w-full max-w-5xl grid grid-cols-1 sm:grid-cols-3 gap-4" id="summary"
        {
            (summary_card(
                "Income",
                "income-total",
                summary.total_income,
                "text-2xl font-bold tabular-nums text-green-700 dark:text-green-300",
            ))
            (summary_card(
                "Expense",
                "expense-total",
                summary.total_expense,
                "text-2xl font-bold tabular-nums text-red-700 dark:text-red-300",
            ))
            (summary_card("Balance", "balance-total", summary.balance, balance_class))
        }
    }
}

fn summary_card(title: &str, id: &str, amount: Decimal, amount_class: &str) -> Markup {
    html! {
        div class="rounded border border-gray-200 bg-white p-4 shadow-sm dark:border-gray-700 dark:bg-gray-800"
        {
            p class="text-sm text-gray-500 dark:text-gray-400" { (title) }
            p id=(id) class=(amount_class) { (format_currency(amount)) }
        }
    }
}

fn new_transaction_form(date: Date) -> Markup {
    let defaults = TransactionFormDefaults {
        kind: TransactionKind::Expense,
        amount: None,
        date,
        description: None,
        autofocus_amount: false,
    };

    html! {
        form
            hx-post=(endpoints::TRANSACTIONS_API)
            hx-indicator="this"
            hx-disabled-elt="find button"
            hx-target-error="#alert-container"
            class=(FORM_CONTAINER_STYLE)
        {
            h2 class="text-lg font-semibold" { "New transaction" }

            (transaction_form_fields(&defaults))

            (submit_button("Add transaction"))
        }
    }
}

fn transactions_table(transactions: &[&Transaction], month: MonthKey) -> Markup {
    html! {
        section class="w-full overflow-x-auto rounded bg-white shadow dark:bg-gray-800"
        {
            table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Amount" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                    }
                }

                tbody
                {
                    @for transaction in transactions {
                        (transaction_row(transaction, month))
                    }

                    @if transactions.is_empty() {
                        tr class=(TABLE_ROW_STYLE)
                        {
                            td colspan="4" class=(TABLE_CELL_STYLE)
                            {
                                "No transactions in " (month) " yet."
                            }
                        }
                    }
                }
            }
        }
    }
}

fn transaction_row(transaction: &Transaction, month: MonthKey) -> Markup {
    let (sign, amount_class) = match transaction.kind {
        TransactionKind::Income => ("+", "tabular-nums text-green-700 dark:text-green-300"),
        TransactionKind::Expense => ("-", "tabular-nums text-red-700 dark:text-red-300"),
    };
    let edit_url = format_endpoint(endpoints::EDIT_TRANSACTION_VIEW, &transaction.id);
    let delete_url = format!(
        "{}?month={month}",
        format_endpoint(endpoints::TRANSACTION, &transaction.id)
    );

    html! {
        tr class=(TABLE_ROW_STYLE) data-transaction-id=(transaction.id)
        {
            td class=(TABLE_CELL_STYLE) { (transaction.date) }
            td class=(TABLE_CELL_STYLE) { (transaction.description) }
            td class=(TABLE_CELL_STYLE)
            {
                span class=(amount_class)
                {
                    (sign) (format_currency(transaction.amount.as_decimal()))
                }
            }
            td class=(TABLE_CELL_STYLE)
            {
                div class="flex gap-4"
                {
                    a href=(edit_url) class=(LINK_STYLE) { "Edit" }

                    button
                        hx-delete=(delete_url)
                        hx-confirm={
                            "Are you sure you want to delete '" (transaction.description) "'?"
                        }
                        hx-target-error="#alert-container"
                        class=(BUTTON_DELETE_STYLE)
                    {
                        "Delete"
                    }
                }
            }
        }
    }
}
