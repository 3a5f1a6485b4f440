//! The JSON response bodies of the dashboard.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{UserId, database_id::CategoryId};

/// The total amount for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyAmount {
    /// The month and year, e.g. "Jan 2025".
    pub month: String,
    /// The sum of the amounts in the month.
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

/// A monthly series along with its latest value and growth over the series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringData {
    /// The amount of the last month, or zero for an empty series.
    #[serde(with = "rust_decimal::serde::float")]
    pub current_value: Decimal,
    /// The change from the first to the last month as a percentage of the
    /// first month, or zero if the first month is not positive.
    #[serde(with = "rust_decimal::serde::float")]
    pub growth_percentage: Decimal,
    /// The amounts for each month, oldest first.
    pub monthly_data: Vec<MonthlyAmount>,
}

/// Income, expenses and savings over the last twelve months.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionOverview {
    /// The user the overview was computed for.
    pub user_id: UserId,
    /// Income per month.
    pub recurring_revenue: RecurringData,
    /// Expenses per month.
    pub recurring_expenses: RecurringData,
    /// Income minus expenses per month.
    pub savings: RecurringData,
}

/// How often a category was used, and the total amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryFrequency {
    pub category_id: CategoryId,
    pub count: u64,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

/// Activity over the last three months compared to the three months before.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentTransactions {
    /// The number of transactions in the last three months.
    pub total_transactions: u64,
    /// The change in the number of transactions compared to the previous
    /// three months, as a percentage.
    #[serde(with = "rust_decimal::serde::float")]
    pub growth_percentage: Decimal,
    /// Recent transactions grouped by category, most frequent first.
    pub category_breakdown: Vec<CategoryFrequency>,
}
