//! Income and expense tracking.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and the value types it is built from
//! - The `TransactionStore` that keeps each user's transactions in SQLite
//! - The monthly summary shown on the tracker
//! - Handlers for the tracker page and the create, edit and delete routes

mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod edit_page;
mod form;
mod store;
mod summary;
mod tracker_page;

pub use core::{
    Amount, MonthKey, Transaction, TransactionFields, TransactionId, TransactionKind,
    create_transaction_table,
};
pub use create_endpoint::{CreateTransactionState, create_transaction_endpoint};
pub use delete_endpoint::{DeleteTransactionState, delete_transaction_endpoint};
pub use edit_endpoint::{EditTransactionState, edit_transaction_endpoint};
pub use edit_page::{EditTransactionPageState, get_edit_transaction_page};
pub use store::{SQLiteTransactionStore, StoreError, TransactionStore};
pub use summary::{MonthlySummary, summarize};
pub use tracker_page::{Notice, TrackerState, get_tracker_page, tracker_url};
