//! Creates the application's database schema and seeds the reference data.

use rusqlite::{
    Connection, Transaction as SqlTransaction, TransactionBehavior, functions::FunctionFlags,
};
use time::OffsetDateTime;

use crate::{
    Error,
    category::{create_category_table, seed_categories},
    timestamp::to_epoch_millis,
    transaction::create_transaction_table,
    transaction_type::{create_transaction_type_table, seed_transaction_types},
};

/// The name of the SQL function that lowercases text by Unicode rules, not just ASCII.
pub const UNICODE_LOWER: &str = "unicode_lower";

/// Create the tables for the domain models and seed the transaction types and
/// categories if they have not been seeded yet.
///
/// Foreign key enforcement is enabled on `connection`, since transactions
/// reference the category and transaction type tables. The [UNICODE_LOWER]
/// function is registered on `connection` for case-insensitive text search.
///
/// # Errors
/// Returns an error if a table cannot be created or if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.pragma_update(None, "foreign_keys", "ON")?;
    register_functions(connection)?;

    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_transaction_type_table(&transaction)?;
    create_category_table(&transaction)?;
    create_transaction_table(&transaction)?;

    seed_transaction_types(&transaction)?;
    seed_categories(to_epoch_millis(OffsetDateTime::now_utc()), &transaction)?;

    transaction.commit()?;

    Ok(())
}

/// Register the application's SQL functions on `connection`.
///
/// SQLite's `lower()`, `LIKE` and `NOCASE` only fold ASCII letters.
fn register_functions(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.create_scalar_function(
        UNICODE_LOWER,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |context| {
            let text: Option<String> = context.get(0)?;
            Ok(text.map(|text| text.to_lowercase()))
        },
    )
}
