//! The transaction type reference table, which holds exactly "income" and "expense".

use rusqlite::Connection;

use crate::Error;

/// The type of transactions where money was earned.
pub const INCOME: &str = "income";
/// The type of transactions where money was spent.
pub const EXPENSE: &str = "expense";

/// Create the transaction type table.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_type_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS transaction_type (
                type TEXT PRIMARY KEY NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Insert the income and expense types if the table is empty.
///
/// Returns the number of rows inserted.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn seed_transaction_types(connection: &Connection) -> Result<usize, Error> {
    let count: i64 =
        connection.query_row("SELECT COUNT(*) FROM transaction_type", [], |row| row.get(0))?;

    if count > 0 {
        tracing::info!("Transaction types already exist, skipping seeding...");
        return Ok(0);
    }

    let mut statement = connection.prepare("INSERT INTO transaction_type (type) VALUES (?1)")?;
    for transaction_type in [INCOME, EXPENSE] {
        statement.execute((transaction_type,))?;
    }

    tracing::info!("Seeded 2 transaction types");

    Ok(2)
}

/// Check whether `transaction_type` exists in the transaction type table.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn transaction_type_exists(
    transaction_type: &str,
    connection: &Connection,
) -> Result<bool, Error> {
    connection
        .query_row(
            "SELECT EXISTS(SELECT 1 FROM transaction_type WHERE type = ?1)",
            (transaction_type,),
            |row| row.get(0),
        )
        .map_err(Error::from)
}
