//! Transaction data aggregation for the dashboard overview.
//!
//! Provides functions to bucket transactions by calendar month, derive the
//! monthly savings, and summarise a monthly series with its latest value and
//! growth.

use std::collections::HashMap;

use rust_decimal::Decimal;
use time::{Date, Month, OffsetDateTime};

use crate::{
    Error,
    dashboard::{
        models::{CategoryFrequency, MonthlyAmount, RecentTransactions, RecurringData},
        transaction::Transaction,
    },
    timestamp::{EpochMillis, from_epoch_millis, to_epoch_millis},
};

/// The number of months in the overview.
pub(super) const OVERVIEW_MONTHS: i32 = 12;

/// The number of extra months fetched before the overview for comparisons.
pub(super) const LOOKBACK_MONTHS: i32 = 3;

/// The months covered by the dashboard overview.
///
/// All dates are the first day of a month in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct OverviewWindow {
    /// The first month of the overview.
    pub start: Date,
    /// The first month after the overview, i.e. the month after the current month.
    pub end: Date,
    /// The first month fetched from the database, [LOOKBACK_MONTHS] before `start`.
    pub fetch_start: Date,
}

impl OverviewWindow {
    /// The twelve months ending with the month of `now`.
    ///
    /// # Errors
    /// Returns [Error::InvalidDate] if a month boundary is out of range.
    pub fn new(now: OffsetDateTime) -> Result<Self, Error> {
        let current_month = first_of_month(now.date())?;
        let end = add_months(current_month, 1)?;
        let start = add_months(end, -OVERVIEW_MONTHS)?;
        let fetch_start = add_months(start, -LOOKBACK_MONTHS)?;

        Ok(Self {
            start,
            end,
            fetch_start,
        })
    }

    /// The range of transaction dates to fetch, as `[start, end)` in epoch milliseconds.
    pub fn fetch_range(&self) -> (EpochMillis, EpochMillis) {
        (
            to_epoch_millis(self.fetch_start.midnight().assume_utc()),
            to_epoch_millis(self.end.midnight().assume_utc()),
        )
    }

    /// The first day of each month in the overview, oldest first.
    pub fn months(&self) -> Result<Vec<Date>, Error> {
        (0..OVERVIEW_MONTHS)
            .map(|offset| add_months(self.start, offset))
            .collect()
    }
}

/// The first day of the month that `date` falls in.
pub(super) fn first_of_month(date: Date) -> Result<Date, Error> {
    date.replace_day(1)
        .map_err(|error| Error::InvalidDate(error.to_string()))
}

/// Move `month` by `offset` months, keeping the day of the month at one.
pub(super) fn add_months(month: Date, offset: i32) -> Result<Date, Error> {
    let month_index = month.year() * 12 + i32::from(u8::from(month.month())) - 1 + offset;
    let year = month_index.div_euclid(12);
    let month_number = (month_index.rem_euclid(12) + 1) as u8;

    let month = Month::try_from(month_number).map_err(|error| Error::InvalidDate(error.to_string()))?;

    Date::from_calendar_date(year, month, 1).map_err(|error| Error::InvalidDate(error.to_string()))
}

/// Formats a month as its three-letter abbreviation and year, e.g. "Jan 2025".
pub(super) fn format_month_label(month: Date) -> String {
    let abbreviation = match month.month() {
        Month::January => "Jan",
        Month::February => "Feb",
        Month::March => "Mar",
        Month::April => "Apr",
        Month::May => "May",
        Month::June => "Jun",
        Month::July => "Jul",
        Month::August => "Aug",
        Month::September => "Sep",
        Month::October => "Oct",
        Month::November => "Nov",
        Month::December => "Dec",
    };

    format!("{abbreviation} {:04}", month.year())
}

/// Sums transaction amounts by the UTC month of their transaction date.
///
/// # Returns
/// One entry per month in `months`, in the same order. Months without
/// transactions have an amount of zero and transactions outside `months` are
/// left out.
pub(super) fn aggregate_by_month<'a>(
    transactions: impl IntoIterator<Item = &'a Transaction>,
    months: &[Date],
) -> Result<Vec<MonthlyAmount>, Error> {
    let mut totals: HashMap<Date, Decimal> = HashMap::new();

    for transaction in transactions {
        let date = from_epoch_millis(transaction.transaction_date)?.date();
        *totals.entry(first_of_month(date)?).or_insert(Decimal::ZERO) += transaction.amount;
    }

    Ok(months
        .iter()
        .map(|month| MonthlyAmount {
            month: format_month_label(*month),
            amount: totals.get(month).copied().unwrap_or(Decimal::ZERO),
        })
        .collect())
}

/// Calculates income minus expenses for each month.
///
/// `income` and `expenses` must cover the same months in the same order.
pub(super) fn calculate_monthly_savings(
    income: &[MonthlyAmount],
    expenses: &[MonthlyAmount],
) -> Vec<MonthlyAmount> {
    income
        .iter()
        .zip(expenses)
        .map(|(income, expenses)| MonthlyAmount {
            month: income.month.clone(),
            amount: income.amount - expenses.amount,
        })
        .collect()
}

/// Summarises a monthly series with its last value and growth from the first month.
pub(super) fn calculate_recurring_data(monthly_data: Vec<MonthlyAmount>) -> RecurringData {
    let first = monthly_data.first().map(|month| month.amount);
    let last = monthly_data.last().map(|month| month.amount);

    let growth_percentage = match (first, last) {
        (Some(first), Some(last)) if first > Decimal::ZERO => percentage_change(first, last),
        _ => Decimal::ZERO,
    };

    RecurringData {
        current_value: last.unwrap_or(Decimal::ZERO),
        growth_percentage,
        monthly_data,
    }
}

/// Counts the transactions in the three months before the current month and
/// breaks them down by category.
///
/// Growth compares that count with the three months before them, and is zero
/// when there were no transactions in the earlier period.
#[allow(dead_code)]
pub(super) fn calculate_recent_transactions(
    transactions: &[Transaction],
    now: OffsetDateTime,
) -> Result<RecentTransactions, Error> {
    let recent_start = add_months(first_of_month(now.date())?, -LOOKBACK_MONTHS)?;
    let previous_start = add_months(recent_start, -LOOKBACK_MONTHS)?;
    let recent_start = to_epoch_millis(recent_start.midnight().assume_utc());
    let previous_start = to_epoch_millis(previous_start.midnight().assume_utc());

    let recent: Vec<&Transaction> = transactions
        .iter()
        .filter(|transaction| transaction.transaction_date >= recent_start)
        .collect();

    let previous_count = transactions
        .iter()
        .filter(|transaction| {
            (previous_start..recent_start).contains(&transaction.transaction_date)
        })
        .count();

    let mut breakdown: HashMap<&str, CategoryFrequency> = HashMap::new();
    for transaction in &recent {
        let entry = breakdown
            .entry(transaction.category_id.as_str())
            .or_insert_with(|| CategoryFrequency {
                category_id: transaction.category_id.clone(),
                count: 0,
                amount: Decimal::ZERO,
            });
        entry.count += 1;
        entry.amount += transaction.amount;
    }

    let mut category_breakdown: Vec<CategoryFrequency> = breakdown.into_values().collect();
    category_breakdown.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.category_id.cmp(&b.category_id))
    });

    let growth_percentage = if previous_count > 0 {
        percentage_change(
            Decimal::from(previous_count as u64),
            Decimal::from(recent.len() as u64),
        )
    } else {
        Decimal::ZERO
    };

    Ok(RecentTransactions {
        total_transactions: recent.len() as u64,
        growth_percentage,
        category_breakdown,
    })
}

/// The change from `first` to `last` as a percentage of `first`.
///
/// `first` must not be zero. Results too large to represent are reported as zero.
fn percentage_change(first: Decimal, last: Decimal) -> Decimal {
    (last - first)
        .checked_div(first)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .unwrap_or(Decimal::ZERO)
}
