//! Database queries for retrieving dashboard transaction data.
//!
//! This module provides a simplified transaction view optimized for dashboard
//! aggregations, containing only the fields needed for the overview (amount,
//! date, type and category).

use rusqlite::Connection;
use rust_decimal::Decimal;

use crate::{
    Error, UserId, database_id::CategoryId, timestamp::EpochMillis,
    transaction::TRANSACTION_COLUMNS, transaction::map_transaction_row,
};

/// A simplified transaction view for dashboard aggregations.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct Transaction {
    pub amount: Decimal,
    pub transaction_date: EpochMillis,
    pub transaction_type: String,
    pub category_id: CategoryId,
}

/// Gets the live transactions owned by `user_id` with a transaction date in
/// `[start, end)`, ordered by transaction date.
///
/// # Errors
/// Returns [Error::SqlError] if:
/// - SQL query preparation or execution fails
/// - Transaction row mapping fails
pub(super) fn get_transactions_in_date_range(
    user_id: &UserId,
    start: EpochMillis,
    end: EpochMillis,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let query = format!(
        "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\"
        WHERE user_id = ?1 AND is_deleted = 0
            AND transaction_date >= ?2 AND transaction_date < ?3
        ORDER BY transaction_date ASC, id ASC"
    );

    let mut stmt = connection.prepare(&query)?;
    stmt.query_map((user_id.as_str(), start, end), |row| {
        let transaction = map_transaction_row(row)?;

        Ok(Transaction {
            amount: transaction.amount,
            transaction_date: transaction.transaction_date,
            transaction_type: transaction.transaction_type,
            category_id: transaction.category_id,
        })
    })?
    .collect::<Result<Vec<Transaction>, rusqlite::Error>>()
    .map_err(|error| error.into())
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use rust_decimal::Decimal;

    use crate::{
        UserId,
        db::initialize,
        transaction::{NewTransaction, create_transaction, soft_delete_transaction},
    };

    use super::get_transactions_in_date_range;

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn insert(user_id: &UserId, transaction_date: i64, conn: &Connection) -> uuid::Uuid {
        let fields = NewTransaction::new(
            "Salary",
            None,
            Decimal::ONE,
            transaction_date,
            "income",
            "salary",
        )
        .unwrap();

        create_transaction(user_id, fields, 0, conn).unwrap().id
    }

    #[test]
    fn returns_owned_live_transactions_in_half_open_range() {
        let conn = get_test_connection();
        let alice = UserId::new("alice");
        for date in [99, 100, 150, 199, 200] {
            insert(&alice, date, &conn);
        }
        insert(&UserId::new("bob"), 150, &conn);
        let deleted = insert(&alice, 120, &conn);
        soft_delete_transaction(deleted, &alice, 0, &conn).unwrap();

        let got = get_transactions_in_date_range(&alice, 100, 200, &conn).unwrap();

        let dates: Vec<_> = got.iter().map(|t| t.transaction_date).collect();
        assert_eq!(dates, vec![100, 150, 199]);
    }
}
