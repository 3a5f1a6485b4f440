//! Defines the endpoint for creating a new transaction.
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State, rejection::JsonRejection},
    http::{StatusCode, header::LOCATION},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use time::OffsetDateTime;

use crate::{
    AppState, Error, UserId,
    endpoints::{self, format_endpoint},
    timestamp::to_epoch_millis,
    transaction::{
        core::create_transaction,
        models::{CreateTransactionRequest, TransactionResponse},
    },
};

/// The state needed to create a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for creating a new transaction.
///
/// Responds with 201 Created, the new transaction and its location.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    Extension(user_id): Extension<UserId>,
    body: Result<Json<CreateTransactionRequest>, JsonRejection>,
) -> Result<Response, Error> {
    let Json(request) = body.map_err(|rejection| Error::Validation(rejection.body_text()))?;
    tracing::info!("Received create transaction request: {request:?}");

    let fields = request.validate()?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let transaction = create_transaction(
        &user_id,
        fields,
        to_epoch_millis(OffsetDateTime::now_utc()),
        &connection,
    )
    .inspect_err(|error| tracing::error!("could not create transaction: {error}"))?;

    let location = format_endpoint(endpoints::TRANSACTION, transaction.id);
    let response = TransactionResponse::try_from(transaction)?;

    Ok((StatusCode::CREATED, [(LOCATION, location)], Json(response)).into_response())
}
