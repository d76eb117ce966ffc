//! The core transaction types and the `transactions` table schema.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::{Date, Month, OffsetDateTime};

use crate::{Error, auth::UserID};

/// The opaque, unique identifier of a transaction.
///
/// New IDs are ULIDs, so they sort roughly by creation time, but callers
/// should not rely on their structure.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(String);

impl TransactionId {
    /// Generate a fresh ID.
    pub fn generate() -> Self {
        Self(ulid::Ulid::new().to_string())
    }

    /// Wrap an existing ID, e.g. one taken from a URL path.
    pub fn new_unchecked(id: &str) -> Self {
        Self(id.to_owned())
    }

    /// The ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl ToSql for TransactionId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        self.0.to_sql()
    }
}

impl FromSql for TransactionId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        String::column_result(value).map(Self)
    }
}

/// Whether money came in or went out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money received.
    Income,
    /// Money spent.
    Expense,
}

impl TransactionKind {
    /// The name used in forms and in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }
}

impl Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionKind::Income => write!(f, "Income"),
            TransactionKind::Expense => write!(f, "Expense"),
        }
    }
}

impl ToSql for TransactionKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "income" => Ok(TransactionKind::Income),
            "expense" => Ok(TransactionKind::Expense),
            _ => Err(FromSqlError::InvalidType),
        }
    }
}

/// A non-negative amount of money with at most two decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Amount(Decimal);

impl Amount {
    /// The amount zero.
    pub const ZERO: Amount = Amount(Decimal::ZERO);

    /// The number of decimal places that amounts may have.
    pub const DECIMAL_PLACES: u32 = 2;

    /// The largest amount of a single transaction, 999,999,999,999.99.
    pub const MAX: Amount = Amount(Decimal::from_parts(
        276_447_231,
        23_283,
        0,
        false,
        Self::DECIMAL_PLACES,
    ));

    /// Create an amount from a decimal.
    ///
    /// # Errors
    ///
    /// Returns [Error::NegativeAmount] if `value` is less than zero,
    /// [Error::AmountTooLarge] if it is greater than [Amount::MAX] and
    /// [Error::TooManyDecimalPlaces] if `value` has more than
    /// [Amount::DECIMAL_PLACES] significant decimal places.
    pub fn new(value: Decimal) -> Result<Self, Error> {
        if value < Decimal::ZERO {
            return Err(Error::NegativeAmount);
        }

        if value > Self::MAX.0 {
            return Err(Error::AmountTooLarge(Self::MAX.to_string()));
        }

        if value.normalize().scale() > Self::DECIMAL_PLACES {
            return Err(Error::TooManyDecimalPlaces);
        }

        Ok(Self(value))
    }

    /// Parse an amount typed in by a user.
    ///
    /// # Errors
    ///
    /// Returns [Error::MissingFields] for an empty string,
    /// [Error::InvalidAmount] if the text is not a number, and the errors of
    /// [Amount::new] otherwise.
    pub fn parse(raw_amount: &str) -> Result<Self, Error> {
        let trimmed = raw_amount.trim();

        if trimmed.is_empty() {
            return Err(Error::MissingFields);
        }

        let value = Decimal::from_str(trimmed)
            .map_err(|_| Error::InvalidAmount(raw_amount.to_owned()))?;

        Self::new(value)
    }

    /// The amount as a decimal.
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl ToSql for Amount {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0.to_string()))
    }
}

impl FromSql for Amount {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        Decimal::from_str(value.as_str()?)
            .map(Self)
            .map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

/// A year-month bucket used to group transactions, e.g. "2025-03".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    year: i32,
    month: Month,
}

impl MonthKey {
    /// Create a month key for `month` of `year`.
    pub fn new(year: i32, month: Month) -> Self {
        Self { year, month }
    }

    /// The month that `date` falls in.
    pub fn from_date(date: Date) -> Self {
        Self::new(date.year(), date.month())
    }

    /// The calendar year.
    pub fn year(&self) -> i32 {
        self.year
    }

    /// The calendar month.
    pub fn month(&self) -> Month {
        self.month
    }

    /// The first day of the month, or `None` if the year is out of range.
    pub fn first_day(&self) -> Option<Date> {
        Date::from_calendar_date(self.year, self.month, 1).ok()
    }

    /// The twelve months of this month's year, January first.
    pub fn months_of_year(&self) -> Vec<MonthKey> {
        let mut months = Vec::with_capacity(12);
        let mut month = Month::January;

        for _ in 0..12 {
            months.push(MonthKey::new(self.year, month));
            month = month.next();
        }

        months
    }

    /// The same month one year earlier, or `None` before year 0.
    pub fn previous_year(&self) -> Option<Self> {
        Self::in_range(self.year - 1, self.month)
    }

    /// The same month one year later, or `None` after year 9999.
    pub fn next_year(&self) -> Option<Self> {
        Self::in_range(self.year + 1, self.month)
    }

    /// Only four digit years can be written as a key.
    fn in_range(year: i32, month: Month) -> Option<Self> {
        (0..=9999)
            .contains(&year)
            .then(|| Self::new(year, month))
    }
}

impl Display for MonthKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month as u8)
    }
}

impl FromStr for MonthKey {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidMonth(text.to_owned());

        let (year, month) = text.split_once('-').ok_or_else(invalid)?;

        let is_number = |part: &str, len: usize| {
            part.len() == len && part.bytes().all(|byte| byte.is_ascii_digit())
        };

        if !is_number(year, 4) || !is_number(month, 2) {
            return Err(invalid());
        }

        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u8 = month.parse().map_err(|_| invalid())?;
        let month = Month::try_from(month).map_err(|_| invalid())?;

        Ok(Self::new(year, month))
    }
}

impl ToSql for MonthKey {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_string()))
    }
}

impl FromSql for MonthKey {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: Error| FromSqlError::Other(Box::new(error)))
    }
}

/// The fields of a transaction that the owner may set and change.
///
/// The month bucket is not a field: it is always derived from `date`.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionFields {
    /// Income or expense.
    pub kind: TransactionKind,
    /// How much money moved.
    pub amount: Amount,
    /// Text detailing the transaction.
    pub description: String,
    /// The date when the transaction occurred.
    pub date: Date,
}

impl TransactionFields {
    /// The month bucket the transaction belongs to.
    pub fn month(&self) -> MonthKey {
        MonthKey::from_date(self.date)
    }
}

/// An income or expense record owned by a single user.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The user the transaction belongs to.
    pub owner: UserID,
    /// Income or expense.
    pub kind: TransactionKind,
    /// How much money moved.
    pub amount: Amount,
    /// Text detailing the transaction.
    pub description: String,
    /// The date when the transaction occurred.
    pub date: Date,
    /// The year-month of `date`.
    pub month: MonthKey,
    /// When the transaction was first recorded.
    pub created_at: OffsetDateTime,
}

impl Transaction {
    /// The owner-editable fields of the transaction.
    pub fn fields(&self) -> TransactionFields {
        TransactionFields {
            kind: self.kind,
            amount: self.amount,
            description: self.description.clone(),
            date: self.date,
        }
    }
}

/// Create the `transactions` table.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS transactions (
            id TEXT PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            type TEXT NOT NULL CHECK (type IN ('income', 'expense')),
            amount TEXT NOT NULL,
            description TEXT NOT NULL,
            date TEXT NOT NULL,
            month TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_transactions_user_date ON transactions(user_id, date);",
    )
}
