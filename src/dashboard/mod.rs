//! Dashboard module
//!
//! Provides an overview of the user's income, expenses and savings over the
//! last twelve months.

mod aggregation;
mod handlers;
mod models;
mod transaction;

pub use handlers::get_transaction_overview;
pub use models::{MonthlyAmount, RecurringData, TransactionOverview};
