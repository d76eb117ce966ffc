//! The transaction store: every query is scoped to the owning user.

use std::sync::{Arc, Mutex};

use rusqlite::{Connection, Row};
use time::OffsetDateTime;

use crate::{
    auth::UserID,
    transaction::{Transaction, TransactionFields, TransactionId},
};

/// The errors a [TransactionStore] may return.
///
/// The `Display` text is shown to the user as is.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum StoreError {
    /// No transaction matches both the ID and the owner.
    #[error("The transaction could not be found. It may have been deleted already.")]
    NotFound,

    /// The database could not be reached.
    #[error("The database is unavailable right now. Please try again.")]
    Unavailable,

    /// The database refused to store the row, e.g. a constraint failed.
    #[error("The transaction was rejected: {0}")]
    Rejected(String),

    /// An unhandled SQL error.
    #[error("An unexpected database error occurred: {0}")]
    Sql(rusqlite::Error),
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
            // 787 is a failed FOREIGN KEY constraint, 275 a failed CHECK constraint.
            rusqlite::Error::SqliteFailure(sql_error, description)
                if sql_error.extended_code == 787 || sql_error.extended_code == 275 =>
            {
                StoreError::Rejected(description.unwrap_or_else(|| sql_error.to_string()))
            }
            error => {
                tracing::error!("an unhandled SQL error occurred: {error}");
                StoreError::Sql(error)
            }
        }
    }
}

/// Create, read, update and delete transactions on behalf of an owner.
///
/// Every operation takes the owner explicitly and implementations must apply
/// it as a predicate, so a caller can never reach another user's rows.
pub trait TransactionStore: Send + Sync {
    /// All of the owner's transactions, newest date first.
    fn list(&self, owner: UserID) -> Result<Vec<Transaction>, StoreError>;

    /// The transaction with `id`, if `owner` owns it.
    fn get(&self, id: &TransactionId, owner: UserID) -> Result<Transaction, StoreError>;

    /// Insert a new transaction with a fresh ID.
    fn create(&self, owner: UserID, fields: TransactionFields) -> Result<Transaction, StoreError>;

    /// Replace the mutable fields of the transaction with `id` owned by
    /// `owner`. The ID and owner never change.
    fn update(
        &self,
        id: &TransactionId,
        owner: UserID,
        fields: TransactionFields,
    ) -> Result<Transaction, StoreError>;

    /// Delete the single transaction matching both `id` and `owner`.
    fn delete(&self, id: &TransactionId, owner: UserID) -> Result<(), StoreError>;
}

/// A [TransactionStore] backed by the app's SQLite database.
#[derive(Debug, Clone)]
pub struct SQLiteTransactionStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteTransactionStore {
    /// Create a store that shares `connection`.
    ///
    /// The `transactions` table must already exist, see [crate::initialize_db].
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }

    fn with_connection<T>(
        &self,
        operation: impl FnOnce(&Connection) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let connection = self.connection.lock().map_err(|error| {
            tracing::error!("could not acquire database lock: {error}");
            StoreError::Unavailable
        })?;

        operation(&connection)
    }
}

const SELECT_TRANSACTION: &str = "SELECT id, user_id, type, amount, description, date, month, created_at \
    FROM transactions";

fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        owner: UserID::new(row.get(1)?),
        kind: row.get(2)?,
        amount: row.get(3)?,
        description: row.get(4)?,
        date: row.get(5)?,
        month: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn get_transaction(
    id: &TransactionId,
    owner: UserID,
    connection: &Connection,
) -> Result<Transaction, StoreError> {
    connection
        .prepare(&format!(
            "{SELECT_TRANSACTION} WHERE id = :id AND user_id = :user_id"
        ))?
        .query_row(
            rusqlite::named_params! {":id": id, ":user_id": owner.as_i64()},
            map_transaction_row,
        )
        .map_err(StoreError::from)
}

impl TransactionStore for SQLiteTransactionStore {
    fn list(&self, owner: UserID) -> Result<Vec<Transaction>, StoreError> {
        self.with_connection(|connection| {
            connection
                .prepare(&format!(
                    "{SELECT_TRANSACTION} WHERE user_id = :user_id \
                    ORDER BY date DESC, created_at DESC, id DESC"
                ))?
                .query_map(
                    rusqlite::named_params! {":user_id": owner.as_i64()},
                    map_transaction_row,
                )?
                .map(|row| row.map_err(StoreError::from))
                .collect()
        })
    }

    fn get(&self, id: &TransactionId, owner: UserID) -> Result<Transaction, StoreError> {
        self.with_connection(|connection| get_transaction(id, owner, connection))
    }

    fn create(&self, owner: UserID, fields: TransactionFields) -> Result<Transaction, StoreError> {
        let transaction = Transaction {
            id: TransactionId::generate(),
            owner,
            kind: fields.kind,
            amount: fields.amount,
            month: fields.month(),
            description: fields.description,
            date: fields.date,
            created_at: OffsetDateTime::now_utc(),
        };

        self.with_connection(|connection| {
            connection.execute(
                "INSERT INTO transactions \
                (id, user_id, type, amount, description, date, month, created_at) \
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                (
                    &transaction.id,
                    transaction.owner.as_i64(),
                    transaction.kind,
                    transaction.amount,
                    &transaction.description,
                    transaction.date,
                    transaction.month,
                    transaction.created_at,
                ),
            )?;

            get_transaction(&transaction.id, owner, connection)
        })
    }

    fn update(
        &self,
        id: &TransactionId,
        owner: UserID,
        fields: TransactionFields,
    ) -> Result<Transaction, StoreError> {
        self.with_connection(|connection| {
            let rows_affected = connection.execute(
                "UPDATE transactions \
                SET type = ?1, amount = ?2, description = ?3, date = ?4, month = ?5 \
                WHERE id = ?6 AND user_id = ?7",
                (
                    fields.kind,
                    fields.amount,
                    &fields.description,
                    fields.date,
                    fields.month(),
                    id,
                    owner.as_i64(),
                ),
            )?;

            if rows_affected == 0 {
                return Err(StoreError::NotFound);
            }

            get_transaction(id, owner, connection)
        })
    }

    fn delete(&self, id: &TransactionId, owner: UserID) -> Result<(), StoreError> {
        self.with_connection(|connection| {
            let rows_affected = connection.execute(
                "DELETE FROM transactions WHERE id = ?1 AND user_id = ?2",
                (id, owner.as_i64()),
            )?;

            match rows_affected {
                0 => Err(StoreError::NotFound),
                _ => Ok(()),
            }
        })
    }
}
