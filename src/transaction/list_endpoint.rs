//! Defines the endpoint for listing transactions with filters, sorting and pagination.
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, RawQuery, State},
};
use rusqlite::Connection;
use time::OffsetDateTime;

use crate::{
    AppState, Error, UserId,
    pagination::PaginationConfig,
    timestamp::to_epoch_millis,
    transaction::{
        models::TransactionPage,
        query::{GetTransactionsRequest, TransactionQuery, get_transaction_page},
    },
};

/// The state needed to list transactions.
#[derive(Debug, Clone)]
pub struct ListTransactionsState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The page size defaults and limits.
    pub pagination_config: PaginationConfig,
}

impl FromRef<AppState> for ListTransactionsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            pagination_config: state.pagination_config.clone(),
        }
    }
}

/// A route handler that responds with one page of the user's transactions.
///
/// The query string is parsed by hand since `type` and `category` may be
/// repeated and generic filters are sent as `Filters[key]=value`.
pub async fn list_transactions_endpoint(
    State(state): State<ListTransactionsState>,
    Extension(user_id): Extension<UserId>,
    RawQuery(query): RawQuery,
) -> Result<Json<TransactionPage>, Error> {
    let request = parse_list_query(query.as_deref().unwrap_or_default())?;
    tracing::info!("Received transaction request: {request:?}");

    let query = TransactionQuery::new(
        &user_id,
        &request,
        to_epoch_millis(OffsetDateTime::now_utc()),
        &state.pagination_config,
    )?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    get_transaction_page(&query, &connection)
        .inspect_err(|error| tracing::error!("could not list transactions: {error}"))
        .map(Json)
}

/// Parse the query string of a list request.
///
/// Parameter names are matched ignoring case. Empty values are treated as
/// missing and unknown parameters are ignored.
///
/// # Errors
/// Returns [Error::Validation] if the query string is malformed or a number
/// or boolean cannot be parsed.
pub fn parse_list_query(query: &str) -> Result<GetTransactionsRequest, Error> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query)
        .map_err(|error| Error::Validation(format!("invalid query string: {error}")))?;

    let mut request = GetTransactionsRequest::default();

    for (name, value) in pairs {
        if value.is_empty() {
            continue;
        }

        let lowercase_name = name.to_lowercase();

        if let Some(key) = filter_key(&lowercase_name, &name) {
            request.filters.insert(key.to_owned(), value);
            continue;
        }

        match lowercase_name.as_str() {
            "pageindex" => request.page_index = Some(parse_number(&name, &value)?),
            "pagesize" => request.page_size = Some(parse_number(&name, &value)?),
            "sortby" => request.sort_by = Some(value),
            "sortdesc" => request.sort_desc = parse_bool(&name, &value)?,
            "search" => request.search = Some(value),
            "title" => request.title = Some(value),
            "type" => request.types.push(value),
            "category" => request.categories.push(value),
            "fromdate" => request.from_date = Some(parse_number(&name, &value)?),
            "todate" => request.to_date = Some(parse_number(&name, &value)?),
            _ => tracing::debug!("Ignoring unknown query parameter {name}"),
        }
    }

    Ok(request)
}

/// Get `key` from a parameter named `filters[key]`, in any case.
///
/// `lowercase_name` must be `name` in lowercase, and the key is sliced from
/// `name` so its original case is kept.
fn filter_key<'a>(lowercase_name: &str, name: &'a str) -> Option<&'a str> {
    const PREFIX: &str = "filters[";

    if !lowercase_name.starts_with(PREFIX) || !lowercase_name.ends_with(']') {
        return None;
    }

    name.get(PREFIX.len()..name.len() - 1)
        .filter(|key| !key.is_empty())
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, Error> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Validation(format!("{name} must be a whole number, got '{value}'")))
}

fn parse_bool(name: &str, value: &str) -> Result<bool, Error> {
    match value.trim().to_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(Error::Validation(format!(
            "{name} must be true or false, got '{value}'"
        ))),
    }
}
