//! Defines the core data models and database queries for transactions.

use rusqlite::{Connection, Row, params, types::Type};
use rust_decimal::{Decimal, prelude::ToPrimitive};
use uuid::Uuid;

use crate::{
    Error, UserId,
    category::category_exists,
    database_id::{CategoryId, TransactionId},
    timestamp::{EpochMillis, from_epoch_millis},
    transaction_type::transaction_type_exists,
};

// ============================================================================
// MODELS
// ============================================================================

/// The maximum length of a transaction title in characters.
pub const MAX_TITLE_LENGTH: usize = 64;
/// The maximum length of a transaction description in characters.
pub const MAX_DESCRIPTION_LENGTH: usize = 256;

/// An expense or income, i.e. an event where money was either spent or earned.
///
/// To create a new `Transaction`, validate the fields with [NewTransaction::new]
/// and pass them to [create_transaction].
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The user that owns the transaction.
    pub user_id: UserId,
    /// A short summary of the transaction, e.g. "Weekly groceries".
    pub title: String,
    /// Optional free text with more detail.
    pub description: Option<String>,
    /// The amount of money spent or earned, never negative.
    pub amount: Decimal,
    /// When the transaction happened.
    pub transaction_date: EpochMillis,
    /// Either "income" or "expense".
    pub transaction_type: String,
    /// The category the transaction belongs to.
    pub category_id: CategoryId,
    /// When the transaction was created.
    pub created_at: EpochMillis,
    /// When the transaction was last changed.
    pub updated_at: EpochMillis,
    /// Whether the transaction has been soft deleted.
    pub is_deleted: bool,
}

/// The validated, user-editable fields of a transaction.
///
/// The same fields are used for creating and updating transactions.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    title: String,
    description: Option<String>,
    amount: Decimal,
    transaction_date: EpochMillis,
    transaction_type: String,
    category_id: CategoryId,
}

impl NewTransaction {
    /// Validate the fields of a transaction.
    ///
    /// The title must have 1 to 64 characters, the description at most 256
    /// characters, and the amount must be non-negative with at most two
    /// decimal places. Lengths count Unicode scalar values. The transaction
    /// date must be a representable date-time. Whether the type and category
    /// exist is checked when the transaction is written to the database.
    ///
    /// # Errors
    /// Returns [Error::Validation] describing the first invalid field.
    pub fn new(
        title: &str,
        description: Option<&str>,
        amount: Decimal,
        transaction_date: EpochMillis,
        transaction_type: &str,
        category_id: &str,
    ) -> Result<Self, Error> {
        if title.trim().is_empty() {
            return Err(Error::Validation("title is required".to_owned()));
        }

        if title.chars().count() > MAX_TITLE_LENGTH {
            return Err(Error::Validation(format!(
                "title must be at most {MAX_TITLE_LENGTH} characters"
            )));
        }

        if description.is_some_and(|description| {
            description.chars().count() > MAX_DESCRIPTION_LENGTH
        }) {
            return Err(Error::Validation(format!(
                "description must be at most {MAX_DESCRIPTION_LENGTH} characters"
            )));
        }

        amount_to_cents(amount)?;

        if from_epoch_millis(transaction_date).is_err() {
            return Err(Error::Validation(format!(
                "transactionDate {transaction_date} is out of range"
            )));
        }

        if transaction_type.trim().is_empty() {
            return Err(Error::Validation("type is required".to_owned()));
        }

        if category_id.trim().is_empty() {
            return Err(Error::Validation("categoryId is required".to_owned()));
        }

        Ok(Self {
            title: title.to_owned(),
            description: description.map(str::to_owned),
            amount,
            transaction_date,
            transaction_type: transaction_type.to_owned(),
            category_id: category_id.to_owned(),
        })
    }
}

/// Convert a monetary amount to whole cents, the unit amounts are stored in.
///
/// # Errors
/// Returns [Error::Validation] if `amount` is negative, has more than two
/// decimal places, or is too large to store.
pub fn amount_to_cents(amount: Decimal) -> Result<i64, Error> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(Error::Validation("amount must not be negative".to_owned()));
    }

    if amount.normalize().scale() > 2 {
        return Err(Error::Validation(
            "amount must have at most 2 decimal places".to_owned(),
        ));
    }

    amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|cents| cents.to_i64())
        .ok_or_else(|| Error::Validation("amount is too large".to_owned()))
}

/// Convert whole cents to a monetary amount with two decimal places.
pub fn cents_to_amount(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// The columns selected for a [Transaction], in the order [map_transaction_row] expects.
pub const TRANSACTION_COLUMNS: &str = "id, user_id, title, description, amount, \
    transaction_date, type, category_id, created_at, updated_at, is_deleted";

/// Create a new transaction owned by `user_id` in the database.
///
/// The transaction is given a new random ID, and both `created_at` and
/// `updated_at` are set to `now`.
///
/// # Errors
/// This function will return a:
/// - [Error::TransactionTypeNotFound] if the type does not exist,
/// - or [Error::CategoryNotFound] if the category does not exist,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    user_id: &UserId,
    transaction: NewTransaction,
    now: EpochMillis,
    connection: &Connection,
) -> Result<Transaction, Error> {
    check_references_exist(&transaction, connection)?;

    let id = Uuid::new_v4();

    connection
        .prepare(&format!(
            "INSERT INTO \"transaction\" ({TRANSACTION_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9, 0)
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            params![
                id.to_string(),
                user_id.as_str(),
                transaction.title,
                transaction.description,
                amount_to_cents(transaction.amount)?,
                transaction.transaction_date,
                transaction.transaction_type,
                transaction.category_id,
                now,
            ],
            map_transaction_row,
        )
        .map_err(Error::from)
}

/// Retrieve a transaction owned by `user_id` that has not been deleted.
///
/// # Errors
/// This function will return a:
/// - [Error::TransactionNotFound] if `id` does not refer to a live transaction owned by `user_id`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(
    id: TransactionId,
    user_id: &UserId,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\"
             WHERE id = ?1 AND user_id = ?2 AND is_deleted = 0"
        ))?
        .query_row((id.to_string(), user_id.as_str()), map_transaction_row)
        .map_err(|error| not_found_or(error, id))
}

/// Replace the user-editable fields of a transaction and refresh `updated_at`.
///
/// # Errors
/// This function will return a:
/// - [Error::TransactionNotFound] if `id` does not refer to a live transaction owned by `user_id`,
/// - or [Error::TransactionTypeNotFound] if the new type does not exist,
/// - or [Error::CategoryNotFound] if the new category does not exist,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_transaction(
    id: TransactionId,
    user_id: &UserId,
    transaction: NewTransaction,
    now: EpochMillis,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let existing = get_transaction(id, user_id, connection)?;
    check_references_exist(&transaction, connection)?;

    connection
        .prepare(&format!(
            "UPDATE \"transaction\"
             SET title = ?1,
                 description = ?2,
                 amount = ?3,
                 transaction_date = ?4,
                 type = ?5,
                 category_id = ?6,
                 updated_at = ?7
             WHERE id = ?8 AND user_id = ?9 AND is_deleted = 0
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            params![
                transaction.title,
                transaction.description,
                amount_to_cents(transaction.amount)?,
                transaction.transaction_date,
                transaction.transaction_type,
                transaction.category_id,
                now.max(existing.created_at),
                id.to_string(),
                user_id.as_str(),
            ],
            map_transaction_row,
        )
        .map_err(|error| not_found_or(error, id))
}

/// Mark a transaction as deleted and refresh `updated_at`.
///
/// The row is kept in the database, but it is no longer returned by any query.
///
/// # Errors
/// This function will return a:
/// - [Error::TransactionNotFound] if `id` does not refer to a live transaction owned by `user_id`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn soft_delete_transaction(
    id: TransactionId,
    user_id: &UserId,
    now: EpochMillis,
    connection: &Connection,
) -> Result<TransactionId, Error> {
    let existing = get_transaction(id, user_id, connection)?;

    let rows_affected = connection.execute(
        "UPDATE \"transaction\"
         SET is_deleted = 1, updated_at = ?1
         WHERE id = ?2 AND user_id = ?3 AND is_deleted = 0",
        params![now.max(existing.created_at), id.to_string(), user_id.as_str()],
    )?;

    if rows_affected == 0 {
        return Err(Error::TransactionNotFound(id.to_string()));
    }

    Ok(id)
}

/// Get the total number of transactions in the database, including deleted ones.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
#[cfg(test)]
pub fn count_transactions(connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM \"transaction\";", [], |row| {
            row.get(0)
        })
        .map_err(|error| error.into())
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id TEXT PRIMARY KEY NOT NULL,
                user_id TEXT NOT NULL,
                title TEXT NOT NULL,
                description TEXT,
                amount INTEGER NOT NULL CHECK (amount >= 0),
                transaction_date INTEGER NOT NULL,
                type TEXT NOT NULL,
                category_id TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL CHECK (updated_at >= created_at),
                is_deleted INTEGER NOT NULL DEFAULT 0,
                FOREIGN KEY(type) REFERENCES transaction_type(type) ON UPDATE CASCADE,
                FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE
                )",
        (),
    )?;

    // Index used by the dashboard and for filtering by date.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_date \
        ON \"transaction\"(user_id, is_deleted, transaction_date);",
        (),
    )?;

    // Index used by the default sort order of the transaction list.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_updated \
        ON \"transaction\"(user_id, updated_at);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
///
/// The row must contain the columns in [TRANSACTION_COLUMNS].
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id: String = row.get(0)?;
    let id = Uuid::try_parse(&id)
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(error)))?;
    let user_id: String = row.get(1)?;
    let title = row.get(2)?;
    let description = row.get(3)?;
    let amount: i64 = row.get(4)?;
    let transaction_date = row.get(5)?;
    let transaction_type = row.get(6)?;
    let category_id = row.get(7)?;
    let created_at = row.get(8)?;
    let updated_at = row.get(9)?;
    let is_deleted = row.get(10)?;

    Ok(Transaction {
        id,
        user_id: UserId::new(&user_id),
        title,
        description,
        amount: cents_to_amount(amount),
        transaction_date,
        transaction_type,
        category_id,
        created_at,
        updated_at,
        is_deleted,
    })
}

fn check_references_exist(
    transaction: &NewTransaction,
    connection: &Connection,
) -> Result<(), Error> {
    if !transaction_type_exists(&transaction.transaction_type, connection)? {
        return Err(Error::TransactionTypeNotFound(
            transaction.transaction_type.clone(),
        ));
    }

    if !category_exists(&transaction.category_id, connection)? {
        return Err(Error::CategoryNotFound(transaction.category_id.clone()));
    }

    Ok(())
}

fn not_found_or(error: rusqlite::Error, id: TransactionId) -> Error {
    match error {
        rusqlite::Error::QueryReturnedNoRows => Error::TransactionNotFound(id.to_string()),
        error => error.into(),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod model_tests {
    use rust_decimal::Decimal;

    use crate::Error;

    use super::{NewTransaction, amount_to_cents, cents_to_amount};

    fn new_transaction(title: &str, description: Option<&str>, amount: Decimal) -> Result<NewTransaction, Error> {
        NewTransaction::new(title, description, amount, 0, "expense", "groceries")
    }

    #[test]
    fn accepts_valid_fields() {
        let result = new_transaction("Groceries", Some("Weekly shop"), Decimal::new(12_345, 2));

        assert!(result.is_ok());
    }

    #[test]
    fn rejects_empty_title() {
        assert_eq!(
            new_transaction("  ", None, Decimal::ONE),
            Err(Error::Validation("title is required".to_owned()))
        );
    }

    #[test]
    fn title_length_counts_characters_not_bytes() {
        let title = "é".repeat(64);
        assert!(new_transaction(&title, None, Decimal::ONE).is_ok());

        let title = "a".repeat(65);
        assert!(matches!(
            new_transaction(&title, None, Decimal::ONE),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn combining_marks_count_towards_title_length() {
        let title = format!("a{}", "\u{0301}".repeat(5_000));

        assert_eq!(
            new_transaction(&title, None, Decimal::ONE),
            Err(Error::Validation(
                "title must be at most 64 characters".to_owned()
            ))
        );

        let title = format!("e{}", "\u{0301}".repeat(63));
        assert!(new_transaction(&title, None, Decimal::ONE).is_ok());
    }

    #[test]
    fn rejects_unrepresentable_transaction_date() {
        let result =
            NewTransaction::new("Rent", None, Decimal::ONE, 300_000_000_000_000, "expense", "rent");

        assert!(matches!(result, Err(Error::Validation(message)) if message.contains("transactionDate")));
        assert!(NewTransaction::new("Rent", None, Decimal::ONE, -1_000, "expense", "rent").is_ok());
    }

    #[test]
    fn rejects_long_description() {
        let description = "a".repeat(257);

        assert!(matches!(
            new_transaction("Rent", Some(&description), Decimal::ONE),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn rejects_negative_amount() {
        assert_eq!(
            new_transaction("Rent", None, Decimal::new(-1, 2)),
            Err(Error::Validation("amount must not be negative".to_owned()))
        );
    }

    #[test]
    fn rejects_fractional_cents() {
        assert!(matches!(
            new_transaction("Rent", None, Decimal::new(1_001, 3)),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn trailing_zeros_do_not_count_as_decimal_places() {
        assert_eq!(amount_to_cents(Decimal::new(1_500, 3)), Ok(150));
    }

    #[test]
    fn converts_cents_to_amount() {
        assert_eq!(cents_to_amount(12_345), Decimal::new(12_345, 2));
        assert_eq!(amount_to_cents(Decimal::ZERO), Ok(0));
    }
}

#[cfg(test)]
mod database_tests {
    use std::collections::HashSet;

    use rusqlite::Connection;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    use crate::{
        Error, UserId,
        db::initialize,
        transaction::{
            NewTransaction, count_transactions, create_transaction, get_transaction,
            soft_delete_transaction, update_transaction,
        },
    };

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn groceries(amount: i64) -> NewTransaction {
        NewTransaction::new(
            "Groceries",
            None,
            Decimal::new(amount, 2),
            1_700_000_000_000,
            "expense",
            "groceries",
        )
        .unwrap()
    }

    #[test]
    fn create_succeeds() {
        let conn = get_test_connection();
        let user_id = UserId::new("alice");

        let transaction = create_transaction(&user_id, groceries(1_230), 42, &conn)
            .expect("Could not create transaction");

        assert_eq!(transaction.amount, Decimal::new(1_230, 2));
        assert_eq!(transaction.user_id, user_id);
        assert_eq!(transaction.created_at, 42);
        assert_eq!(transaction.created_at, transaction.updated_at);
        assert!(!transaction.is_deleted);
    }

    #[test]
    fn create_assigns_unique_ids() {
        let conn = get_test_connection();
        let user_id = UserId::new("alice");

        let ids: HashSet<_> = (0..20)
            .map(|i| {
                create_transaction(&user_id, groceries(i), 42, &conn)
                    .unwrap()
                    .id
            })
            .collect();

        assert_eq!(ids.len(), 20);
    }

    #[test]
    fn create_fails_on_missing_type() {
        let conn = get_test_connection();
        let transaction =
            NewTransaction::new("Loan", None, Decimal::ONE, 0, "transfer", "groceries").unwrap();

        let result = create_transaction(&UserId::new("alice"), transaction, 42, &conn);

        assert_eq!(
            result,
            Err(Error::TransactionTypeNotFound("transfer".to_owned()))
        );
        assert_eq!(count_transactions(&conn), Ok(0));
    }

    #[test]
    fn create_fails_on_missing_category() {
        let conn = get_test_connection();
        let transaction =
            NewTransaction::new("Ticket", None, Decimal::ONE, 0, "income", "lottery").unwrap();

        let result = create_transaction(&UserId::new("alice"), transaction, 42, &conn);

        assert_eq!(result, Err(Error::CategoryNotFound("lottery".to_owned())));
    }

    #[test]
    fn get_is_owner_scoped() {
        let conn = get_test_connection();
        let transaction =
            create_transaction(&UserId::new("alice"), groceries(100), 42, &conn).unwrap();

        let result = get_transaction(transaction.id, &UserId::new("bob"), &conn);

        assert_eq!(
            result,
            Err(Error::TransactionNotFound(transaction.id.to_string()))
        );
    }

    #[test]
    fn update_replaces_fields_and_refreshes_updated_at() {
        let conn = get_test_connection();
        let user_id = UserId::new("alice");
        let created = create_transaction(&user_id, groceries(100), 42, &conn).unwrap();
        let fields = NewTransaction::new(
            "Salary",
            Some("March"),
            Decimal::new(500_000, 2),
            1_700_000_000_001,
            "income",
            "salary",
        )
        .unwrap();

        let updated = update_transaction(created.id, &user_id, fields, 100, &conn).unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.title, "Salary");
        assert_eq!(updated.description.as_deref(), Some("March"));
        assert_eq!(updated.amount, Decimal::new(500_000, 2));
        assert_eq!(updated.transaction_type, "income");
        assert_eq!(updated.category_id, "salary");
        assert_eq!(updated.created_at, 42);
        assert_eq!(updated.updated_at, 100);
        assert_eq!(get_transaction(created.id, &user_id, &conn), Ok(updated));
    }

    #[test]
    fn update_never_moves_updated_at_before_created_at() {
        let conn = get_test_connection();
        let user_id = UserId::new("alice");
        let created = create_transaction(&user_id, groceries(100), 42, &conn).unwrap();

        let updated = update_transaction(created.id, &user_id, groceries(200), 7, &conn).unwrap();

        assert_eq!(updated.updated_at, 42);
    }

    #[test]
    fn update_fails_on_missing_transaction() {
        let conn = get_test_connection();
        let id = Uuid::new_v4();

        let result = update_transaction(id, &UserId::new("alice"), groceries(100), 42, &conn);

        assert_eq!(result, Err(Error::TransactionNotFound(id.to_string())));
    }

    #[test]
    fn update_checks_not_found_before_references() {
        let conn = get_test_connection();
        let id = Uuid::new_v4();
        let fields =
            NewTransaction::new("Ticket", None, Decimal::ONE, 0, "income", "lottery").unwrap();

        let result = update_transaction(id, &UserId::new("alice"), fields, 42, &conn);

        assert_eq!(result, Err(Error::TransactionNotFound(id.to_string())));
    }

    #[test]
    fn update_fails_on_missing_category() {
        let conn = get_test_connection();
        let user_id = UserId::new("alice");
        let created = create_transaction(&user_id, groceries(100), 42, &conn).unwrap();
        let fields =
            NewTransaction::new("Ticket", None, Decimal::ONE, 0, "income", "lottery").unwrap();

        let result = update_transaction(created.id, &user_id, fields, 50, &conn);

        assert_eq!(result, Err(Error::CategoryNotFound("lottery".to_owned())));
    }

    #[test]
    fn soft_delete_hides_transaction_but_keeps_row() {
        let conn = get_test_connection();
        let user_id = UserId::new("alice");
        let created = create_transaction(&user_id, groceries(100), 42, &conn).unwrap();

        let deleted_id = soft_delete_transaction(created.id, &user_id, 50, &conn).unwrap();

        assert_eq!(deleted_id, created.id);
        assert_eq!(
            get_transaction(created.id, &user_id, &conn),
            Err(Error::TransactionNotFound(created.id.to_string()))
        );
        assert_eq!(count_transactions(&conn), Ok(1));
        let (is_deleted, updated_at): (bool, i64) = conn
            .query_row(
                "SELECT is_deleted, updated_at FROM \"transaction\" WHERE id = ?1",
                (created.id.to_string(),),
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert!(is_deleted);
        assert_eq!(updated_at, 50);
    }

    #[test]
    fn update_fails_on_deleted_transaction() {
        let conn = get_test_connection();
        let user_id = UserId::new("alice");
        let created = create_transaction(&user_id, groceries(100), 42, &conn).unwrap();
        soft_delete_transaction(created.id, &user_id, 50, &conn).unwrap();

        let result = update_transaction(created.id, &user_id, groceries(200), 60, &conn);

        assert_eq!(
            result,
            Err(Error::TransactionNotFound(created.id.to_string()))
        );
    }

    #[test]
    fn delete_twice_fails() {
        let conn = get_test_connection();
        let user_id = UserId::new("alice");
        let created = create_transaction(&user_id, groceries(100), 42, &conn).unwrap();
        soft_delete_transaction(created.id, &user_id, 50, &conn).unwrap();

        let result = soft_delete_transaction(created.id, &user_id, 60, &conn);

        assert_eq!(
            result,
            Err(Error::TransactionNotFound(created.id.to_string()))
        );
    }

    #[test]
    fn delete_is_owner_scoped() {
        let conn = get_test_connection();
        let created =
            create_transaction(&UserId::new("alice"), groceries(100), 42, &conn).unwrap();

        let result = soft_delete_transaction(created.id, &UserId::new("bob"), 50, &conn);

        assert_eq!(
            result,
            Err(Error::TransactionNotFound(created.id.to_string()))
        );
    }
}
