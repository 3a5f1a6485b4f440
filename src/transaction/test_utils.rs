//! Helpers shared by the transaction tests.

use axum::{body::Body, http::Response};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;

use crate::{
    UserId,
    db::initialize,
    transaction::{NewTransaction, Transaction, create_transaction},
};

pub(crate) fn get_test_connection() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    initialize(&conn).unwrap();
    conn
}

/// Create a $12.34 grocery expense owned by `user_id`.
#[track_caller]
pub(crate) fn create_test_transaction(user_id: &UserId, connection: &Connection) -> Transaction {
    let fields = NewTransaction::new(
        "Groceries",
        None,
        Decimal::new(1_234, 2),
        1_742_429_947_123,
        "expense",
        "groceries",
    )
    .unwrap();

    create_transaction(user_id, fields, 1_742_429_947_123, connection).unwrap()
}

pub(crate) async fn parse_json_body<T: DeserializeOwned>(response: Response<Body>) -> T {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("could not read response body");

    serde_json::from_slice(&body).expect("could not parse response body as JSON")
}
