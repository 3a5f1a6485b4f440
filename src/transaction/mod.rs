//! Transaction management for the expense tracker.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and the validated `NewTransaction` fields
//! - Database functions for storing, querying, and soft deleting transactions
//! - The JSON endpoints for creating, updating, deleting and listing transactions

mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod list_endpoint;
mod models;
mod query;

#[cfg(test)]
mod test_utils;

pub use core::{
    NewTransaction, Transaction, create_transaction, create_transaction_table,
    map_transaction_row, soft_delete_transaction, TRANSACTION_COLUMNS,
};
pub use create_endpoint::create_transaction_endpoint;
pub use delete_endpoint::delete_transaction_endpoint;
pub use edit_endpoint::edit_transaction_endpoint;
pub use list_endpoint::list_transactions_endpoint;
pub use models::{TransactionPage, TransactionResponse};

#[cfg(test)]
pub use core::{count_transactions, get_transaction, update_transaction};
