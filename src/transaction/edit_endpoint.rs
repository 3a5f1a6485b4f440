//! Defines the endpoint for updating a transaction.
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State, rejection::JsonRejection},
};
use rusqlite::Connection;
use time::OffsetDateTime;

use crate::{
    AppState, Error, UserId,
    database_id::parse_transaction_id,
    timestamp::to_epoch_millis,
    transaction::{
        core::{get_transaction, update_transaction},
        models::{TransactionResponse, UpdateTransactionRequest},
    },
};

/// The state needed to edit a transaction.
#[derive(Debug, Clone)]
pub struct EditTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for replacing the fields of a transaction.
///
/// The checks run in this order: the ID format, whether the transaction
/// exists, the request fields, and then the type and category.
pub async fn edit_transaction_endpoint(
    State(state): State<EditTransactionState>,
    Extension(user_id): Extension<UserId>,
    body: Result<Json<UpdateTransactionRequest>, JsonRejection>,
) -> Result<Json<TransactionResponse>, Error> {
    let Json(request) = body.map_err(|rejection| Error::Validation(rejection.body_text()))?;
    tracing::info!("Received update transaction request: {request:?}");

    let id = parse_transaction_id(&request.id)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    get_transaction(id, &user_id, &connection)?;
    let fields = request.fields.validate()?;

    let transaction = update_transaction(
        id,
        &user_id,
        fields,
        to_epoch_millis(OffsetDateTime::now_utc()),
        &connection,
    )
    .inspect_err(|error| tracing::error!("could not update transaction {id}: {error}"))?;

    TransactionResponse::try_from(transaction).map(Json)
}
