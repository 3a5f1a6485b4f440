//! Dashboard HTTP handlers.
//!
//! This module contains:
//! - The route handler for the income, expense and savings overview
//! - The function that builds the overview from the database

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;
use time::OffsetDateTime;

use crate::{
    AppState, Error, UserId,
    dashboard::{
        aggregation::{
            OverviewWindow, aggregate_by_month, calculate_monthly_savings,
            calculate_recurring_data,
        },
        models::TransactionOverview,
        transaction::get_transactions_in_date_range,
    },
    transaction_type::{EXPENSE, INCOME},
};

/// The state needed for the dashboard overview.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Respond with the user's income, expenses and savings for the last twelve months.
pub async fn get_transaction_overview(
    State(state): State<DashboardState>,
    Extension(user_id): Extension<UserId>,
) -> Result<Json<TransactionOverview>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    build_transaction_overview(&user_id, OffsetDateTime::now_utc(), &connection)
        .inspect_err(|error| tracing::error!("Failed to get transaction overview: {error}"))
        .map(Json)
}

/// Builds the overview of the twelve months ending with the month of `now`.
///
/// # Errors
/// Returns an error if the transactions cannot be read or a month boundary
/// cannot be computed.
pub(super) fn build_transaction_overview(
    user_id: &UserId,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<TransactionOverview, Error> {
    let window = OverviewWindow::new(now)?;
    let (start, end) = window.fetch_range();
    let transactions = get_transactions_in_date_range(user_id, start, end, connection)?;
    let months = window.months()?;

    let income = aggregate_by_month(
        transactions
            .iter()
            .filter(|transaction| transaction.transaction_type == INCOME),
        &months,
    )?;
    let expenses = aggregate_by_month(
        transactions
            .iter()
            .filter(|transaction| transaction.transaction_type == EXPENSE),
        &months,
    )?;
    let savings = calculate_monthly_savings(&income, &expenses);

    Ok(TransactionOverview {
        user_id: user_id.clone(),
        recurring_revenue: calculate_recurring_data(income),
        recurring_expenses: calculate_recurring_data(expenses),
        savings: calculate_recurring_data(savings),
    })
}
