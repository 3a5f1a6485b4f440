//! The category reference table, e.g. "salary", "rent" or "groceries".
//!
//! Every transaction belongs to exactly one category. Categories are seeded once
//! when the database is initialized and are not changed by the API.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
};
use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{AppState, Error, database_id::CategoryId, timestamp::EpochMillis};

/// Categories for transactions where money was earned.
pub const INCOME_CATEGORIES: [&str; 9] = [
    "salary",
    "freelance",
    "investments",
    "business_revenue",
    "gifts",
    "refunds",
    "bonuses",
    "rental_income",
    "other_income",
];

/// Categories for transactions where money was spent.
pub const EXPENSE_CATEGORIES: [&str; 47] = [
    "rent",
    "mortgage",
    "property_taxes",
    "home_insurance",
    "electricity",
    "water",
    "gas",
    "internet",
    "phone_bill",
    "groceries",
    "restaurants",
    "coffee_shops",
    "fast_food",
    "fuel",
    "public_transport",
    "car_maintenance",
    "parking",
    "ride_sharing",
    "medical_bills",
    "health_insurance",
    "gym_membership",
    "pharmacy",
    "streaming_services",
    "movies",
    "concerts",
    "gaming",
    "clothing",
    "accessories",
    "electronics",
    "home_decor",
    "courses",
    "books",
    "subscriptions",
    "school_fees",
    "credit_card_payments",
    "student_loans",
    "personal_loans",
    "retirement_fund",
    "stocks",
    "emergency_fund",
    "flights",
    "hotels",
    "transportation",
    "tourist_activities",
    "charity",
    "gifts_expenses",
    "miscellaneous",
];

/// A category for expenses and income.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// The key of the category, e.g. "salary".
    pub id: CategoryId,
    /// When the category was created.
    pub created_at: EpochMillis,
    /// When the category was last changed.
    pub updated_at: EpochMillis,
    /// Whether the category has been soft deleted.
    pub is_deleted: bool,
}

/// Create the category table.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS category (
                id TEXT PRIMARY KEY NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                is_deleted INTEGER NOT NULL DEFAULT 0
                )",
        (),
    )?;

    Ok(())
}

/// Insert the default income and expense categories if the table is empty.
///
/// Returns the number of rows inserted.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn seed_categories(now: EpochMillis, connection: &Connection) -> Result<usize, Error> {
    let count: i64 = connection.query_row("SELECT COUNT(*) FROM category", [], |row| row.get(0))?;

    if count > 0 {
        tracing::info!("Categories already exist, skipping seeding...");
        return Ok(0);
    }

    let mut statement = connection.prepare(
        "INSERT INTO category (id, created_at, updated_at, is_deleted) VALUES (?1, ?2, ?2, 0)",
    )?;

    let mut inserted = 0;
    for id in INCOME_CATEGORIES.iter().chain(EXPENSE_CATEGORIES.iter()) {
        inserted += statement.execute((id, now))?;
    }

    tracing::info!("Seeded {inserted} categories");

    Ok(inserted)
}

/// Check whether a category with `id` exists.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn category_exists(id: &str, connection: &Connection) -> Result<bool, Error> {
    connection
        .query_row(
            "SELECT EXISTS(SELECT 1 FROM category WHERE id = ?1)",
            (id,),
            |row| row.get(0),
        )
        .map_err(Error::from)
}

/// Retrieve all categories that have not been deleted, ordered by ID.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn get_all_categories(connection: &Connection) -> Result<Vec<Category>, Error> {
    connection
        .prepare(
            "SELECT id, created_at, updated_at, is_deleted FROM category \
            WHERE is_deleted = 0 ORDER BY id ASC",
        )?
        .query_map([], map_category_row)?
        .collect::<Result<Vec<Category>, rusqlite::Error>>()
        .map_err(Error::from)
}

/// The state needed to list categories.
#[derive(Debug, Clone)]
pub struct CategoriesState {
    /// The database connection for reading categories.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CategoriesState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler that responds with all categories as JSON.
pub async fn get_categories_endpoint(
    State(state): State<CategoriesState>,
) -> Result<Json<Vec<Category>>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    get_all_categories(&connection)
        .inspect_err(|error| tracing::error!("could not get categories: {error}"))
        .map(Json)
}

fn map_category_row(row: &Row) -> Result<Category, rusqlite::Error> {
    Ok(Category {
        id: row.get(0)?,
        created_at: row.get(1)?,
        updated_at: row.get(2)?,
        is_deleted: row.get(3)?,
    })
}
