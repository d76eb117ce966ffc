//! Monthly totals for the tracker page.

use rust_decimal::Decimal;

use crate::transaction::{MonthKey, Transaction, TransactionKind};

/// The income, expense and balance of a single month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MonthlySummary {
    /// The sum of all income in the month.
    pub total_income: Decimal,
    /// The sum of all expenses in the month.
    pub total_expense: Decimal,
    /// Income minus expenses, may be negative.
    pub balance: Decimal,
}

/// Sum the transactions that fall in `month`.
///
/// Transactions from other months are ignored, so an empty slice or a month
/// with no transactions gives all-zero totals. Totals saturate instead of
/// overflowing.
pub fn summarize(transactions: &[Transaction], month: MonthKey) -> MonthlySummary {
    let (total_income, total_expense) = transactions
        .iter()
        .filter(|transaction| transaction.month == month)
        .fold(
            (Decimal::ZERO, Decimal::ZERO),
            |(income, expense), transaction| match transaction.kind {
                TransactionKind::Income => (
                    income.saturating_add(transaction.amount.as_decimal()),
                    expense,
                ),
                TransactionKind::Expense => (
                    income,
                    expense.saturating_add(transaction.amount.as_decimal()),
                ),
            },
        );

    MonthlySummary {
        total_income,
        total_expense,
        balance: total_income.saturating_sub(total_expense),
    }
}
