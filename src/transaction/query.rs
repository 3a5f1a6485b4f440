//! Builds the filtered, sorted and paginated query behind the transaction list.

use std::{collections::BTreeMap, str::FromStr};

use rusqlite::{Connection, params_from_iter, types::Value};
use rust_decimal::{Decimal, prelude::ToPrimitive};

use crate::{
    Error, UserId,
    db::UNICODE_LOWER,
    pagination::{Page, PaginationConfig, page_count},
    timestamp::EpochMillis,
    transaction::{
        core::{TRANSACTION_COLUMNS, Transaction, map_transaction_row},
        models::{TransactionPage, TransactionResponse},
    },
};

/// The options for listing transactions, as sent by the client.
///
/// Every filter is optional and all filters that are given must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetTransactionsRequest {
    /// The zero-based index of the page to fetch.
    pub page_index: Option<u64>,
    /// The number of transactions per page.
    pub page_size: Option<u64>,
    /// The field to sort by, e.g. "amount" or "transactionDate".
    pub sort_by: Option<String>,
    /// Whether to sort in descending order.
    pub sort_desc: bool,
    /// Text to find in the title or description.
    pub search: Option<String>,
    /// Text to find in the title.
    pub title: Option<String>,
    /// The transaction types to include.
    pub types: Vec<String>,
    /// The category IDs to include.
    pub categories: Vec<String>,
    /// The earliest transaction date to include, in epoch milliseconds.
    pub from_date: Option<EpochMillis>,
    /// The latest transaction date to include, in epoch milliseconds.
    pub to_date: Option<EpochMillis>,
    /// Generic filters keyed by field name, e.g. "minamount" -> "50".
    pub filters: BTreeMap<String, String>,
}

/// A single condition in the `WHERE` clause of a transaction query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Predicate {
    /// The title or description contains the text, ignoring case.
    TitleOrDescriptionContains(String),
    /// The title contains the text, ignoring case.
    TitleContains(String),
    /// The description contains the text, ignoring case.
    DescriptionContains(String),
    /// The type is one of the listed types.
    TypeIn(Vec<String>),
    /// The category is one of the listed categories.
    CategoryIn(Vec<String>),
    /// The transaction date is on or after the time.
    TransactionDateFrom(EpochMillis),
    /// The transaction date is on or before the time.
    TransactionDateTo(EpochMillis),
    /// The amount in cents is at least the value.
    AmountAtLeast(i64),
    /// The amount in cents is at most the value.
    AmountAtMost(i64),
}

impl Predicate {
    /// Append the SQL condition for this predicate to `clauses` and its
    /// arguments to `params`, in the order the `?` placeholders appear.
    fn push_sql(&self, clauses: &mut Vec<String>, params: &mut Vec<Value>) {
        match self {
            Predicate::TitleOrDescriptionContains(text) => {
                let pattern = like_pattern(text);
                clauses.push(format!(
                    "({UNICODE_LOWER}(title) LIKE ? ESCAPE '\\' \
                    OR {UNICODE_LOWER}(description) LIKE ? ESCAPE '\\')"
                ));
                params.push(Value::Text(pattern.clone()));
                params.push(Value::Text(pattern));
            }
            Predicate::TitleContains(text) => {
                clauses.push(format!("{UNICODE_LOWER}(title) LIKE ? ESCAPE '\\'"));
                params.push(Value::Text(like_pattern(text)));
            }
            Predicate::DescriptionContains(text) => {
                clauses.push(format!("{UNICODE_LOWER}(description) LIKE ? ESCAPE '\\'"));
                params.push(Value::Text(like_pattern(text)));
            }
            Predicate::TypeIn(types) => {
                clauses.push(format!("type IN ({})", placeholders(types.len())));
                params.extend(types.iter().cloned().map(Value::Text));
            }
            Predicate::CategoryIn(categories) => {
                clauses.push(format!("category_id IN ({})", placeholders(categories.len())));
                params.extend(categories.iter().cloned().map(Value::Text));
            }
            Predicate::TransactionDateFrom(millis) => {
                clauses.push("transaction_date >= ?".to_owned());
                params.push(Value::Integer(*millis));
            }
            Predicate::TransactionDateTo(millis) => {
                clauses.push("transaction_date <= ?".to_owned());
                params.push(Value::Integer(*millis));
            }
            Predicate::AmountAtLeast(cents) => {
                clauses.push("amount >= ?".to_owned());
                params.push(Value::Integer(*cents));
            }
            Predicate::AmountAtMost(cents) => {
                clauses.push("amount <= ?".to_owned());
                params.push(Value::Integer(*cents));
            }
        }
    }
}

/// Lowercase `text` and wrap it in `%` wildcards, escaping the LIKE wildcards
/// it contains so they match literally.
///
/// The pattern is matched against columns lowered with the same Unicode rules.
fn like_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');

    for character in text.to_lowercase().chars() {
        if matches!(character, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(character);
    }

    pattern.push('%');
    pattern
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

/// The fields transactions can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SortColumn {
    Title,
    Amount,
    TransactionDate,
    CreatedAt,
    UpdatedAt,
    Type,
    Category,
}

impl SortColumn {
    fn sql(self) -> &'static str {
        match self {
            SortColumn::Title => "unicode_lower(title)",
            SortColumn::Amount => "amount",
            SortColumn::TransactionDate => "transaction_date",
            SortColumn::CreatedAt => "created_at",
            SortColumn::UpdatedAt => "updated_at",
            SortColumn::Type => "type",
            SortColumn::Category => "category_id",
        }
    }
}

impl FromStr for SortColumn {
    type Err = ();

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        match text.trim().to_lowercase().as_str() {
            "title" => Ok(SortColumn::Title),
            "amount" => Ok(SortColumn::Amount),
            "transactiondate" => Ok(SortColumn::TransactionDate),
            "createdat" => Ok(SortColumn::CreatedAt),
            "updatedat" => Ok(SortColumn::UpdatedAt),
            "type" => Ok(SortColumn::Type),
            "category" | "categoryid" => Ok(SortColumn::Category),
            _ => Err(()),
        }
    }
}

/// The order to sort transactions in a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SortOrder {
    /// Sort in order of increasing value.
    Ascending,
    /// Sort in order of decreasing value.
    Descending,
}

/// The sort column and direction of a transaction query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Sort {
    column: SortColumn,
    order: SortOrder,
}

impl Sort {
    /// Most recently updated first.
    const DEFAULT: Sort = Sort {
        column: SortColumn::UpdatedAt,
        order: SortOrder::Descending,
    };

    /// Pick the sort from the client's `sort_by` and `sort_desc` options.
    ///
    /// A missing or unknown `sort_by` gives the default sort, regardless of `sort_desc`.
    fn new(sort_by: Option<&str>, sort_desc: bool) -> Self {
        let Some(column) = sort_by.and_then(|sort_by| sort_by.parse::<SortColumn>().ok()) else {
            return Self::DEFAULT;
        };

        let order = if sort_desc {
            SortOrder::Descending
        } else {
            SortOrder::Ascending
        };

        Self { column, order }
    }

    fn order_by_clause(&self) -> String {
        let direction = match self.order {
            SortOrder::Ascending => "ASC",
            SortOrder::Descending => "DESC",
        };

        // Sort by ID last to keep the order stable across pages.
        format!("ORDER BY {} {direction}, id ASC", self.column.sql())
    }
}

/// A validated query for one page of a user's transactions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionQuery {
    user_id: UserId,
    now: EpochMillis,
    predicates: Vec<Predicate>,
    sort: Sort,
    page: Page,
}

impl TransactionQuery {
    /// Build the query for `request` over the transactions owned by `user_id`.
    ///
    /// Only live transactions whose `updated_at` is not after `now` are included.
    ///
    /// # Errors
    /// Returns [Error::Validation] if the page options are invalid.
    pub fn new(
        user_id: &UserId,
        request: &GetTransactionsRequest,
        now: EpochMillis,
        config: &PaginationConfig,
    ) -> Result<Self, Error> {
        let page = Page::new(request.page_index, request.page_size, config)?;

        Ok(Self {
            user_id: user_id.clone(),
            now,
            predicates: collect_predicates(request),
            sort: Sort::new(request.sort_by.as_deref(), request.sort_desc),
            page,
        })
    }

    fn where_clause(&self) -> (String, Vec<Value>) {
        let mut clauses = vec![
            "user_id = ?".to_owned(),
            "is_deleted = 0".to_owned(),
            "updated_at <= ?".to_owned(),
        ];
        let mut params = vec![
            Value::Text(self.user_id.as_str().to_owned()),
            Value::Integer(self.now),
        ];

        for predicate in &self.predicates {
            predicate.push_sql(&mut clauses, &mut params);
        }

        (format!("WHERE {}", clauses.join(" AND ")), params)
    }

    fn count(&self, connection: &Connection) -> Result<u64, rusqlite::Error> {
        let (where_clause, params) = self.where_clause();

        let count: i64 = connection.query_row(
            &format!("SELECT COUNT(id) FROM \"transaction\" {where_clause}"),
            params_from_iter(params),
            |row| row.get(0),
        )?;

        Ok(u64::try_from(count).unwrap_or_default())
    }

    fn fetch(&self, connection: &Connection) -> Result<Vec<Transaction>, Error> {
        let (where_clause, mut params) = self.where_clause();
        params.push(Value::Integer(self.page.limit()));
        params.push(Value::Integer(self.page.offset()?));

        let query = format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" {where_clause} {} LIMIT ? OFFSET ?",
            self.sort.order_by_clause()
        );

        connection
            .prepare(&query)
            .and_then(|mut statement| {
                statement
                    .query_map(params_from_iter(params), map_transaction_row)?
                    .collect::<Result<Vec<_>, _>>()
            })
            .map_err(|error| Error::QueryFailed(error.to_string()))
    }
}

/// Turn the options of `request` into predicates, in the order they are applied.
fn collect_predicates(request: &GetTransactionsRequest) -> Vec<Predicate> {
    let mut predicates = Vec::new();

    if let Some(search) = non_blank(request.search.as_deref()) {
        predicates.push(Predicate::TitleOrDescriptionContains(search.to_owned()));
    }

    if let Some(title) = non_blank(request.title.as_deref()) {
        predicates.push(Predicate::TitleContains(title.to_owned()));
    }

    if !request.types.is_empty() {
        predicates.push(Predicate::TypeIn(request.types.clone()));
    }

    if !request.categories.is_empty() {
        predicates.push(Predicate::CategoryIn(request.categories.clone()));
    }

    if let Some(from_date) = request.from_date {
        predicates.push(Predicate::TransactionDateFrom(from_date));
    }

    if let Some(to_date) = request.to_date {
        predicates.push(Predicate::TransactionDateTo(to_date));
    }

    predicates.extend(
        request
            .filters
            .iter()
            .filter_map(|(key, value)| filter_predicate(key, value)),
    );

    predicates
}

/// Map one entry of the generic filters to a predicate.
///
/// Keys are matched ignoring case. Unknown keys and values that cannot be
/// parsed give `None`.
fn filter_predicate(key: &str, value: &str) -> Option<Predicate> {
    match key.trim().to_lowercase().as_str() {
        "title" => Some(Predicate::TitleOrDescriptionContains(value.to_owned())),
        "description" => Some(Predicate::DescriptionContains(value.to_owned())),
        "type" => Some(Predicate::TypeIn(vec![value.to_owned()])),
        "category" | "categoryid" => Some(Predicate::CategoryIn(vec![value.to_owned()])),
        "minamount" => parse_cents(value, Decimal::ceil).map(Predicate::AmountAtLeast),
        "maxamount" => parse_cents(value, Decimal::floor).map(Predicate::AmountAtMost),
        "fromdate" => value.trim().parse().ok().map(Predicate::TransactionDateFrom),
        "todate" => value.trim().parse().ok().map(Predicate::TransactionDateTo),
        _ => None,
    }
}

/// Parse a decimal amount and convert it to whole cents, using `round` to
/// handle fractions of a cent.
fn parse_cents(value: &str, round: fn(&Decimal) -> Decimal) -> Option<i64> {
    let amount = Decimal::from_str(value.trim()).ok()?;
    let cents = amount.checked_mul(Decimal::ONE_HUNDRED)?;

    round(&cents).to_i64()
}

fn non_blank(text: Option<&str>) -> Option<&str> {
    text.filter(|text| !text.trim().is_empty())
}

/// Run `query` and return the requested page along with the page and item counts.
///
/// # Errors
/// Returns [Error::QueryFailed] if the query fails to execute.
pub fn get_transaction_page(
    query: &TransactionQuery,
    connection: &Connection,
) -> Result<TransactionPage, Error> {
    let total_count = query
        .count(connection)
        .map_err(|error| Error::QueryFailed(error.to_string()))?;

    let data = query
        .fetch(connection)?
        .into_iter()
        .map(TransactionResponse::try_from)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|error| Error::QueryFailed(error.to_string()))?;

    Ok(TransactionPage {
        data,
        page_count: page_count(total_count, query.page.size),
        total_count,
    })
}
