//! Defines the endpoint for soft deleting a transaction.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
};
use rusqlite::Connection;
use time::OffsetDateTime;

use crate::{
    AppState, Error, UserId,
    database_id::parse_transaction_id,
    timestamp::to_epoch_millis,
    transaction::{core::soft_delete_transaction, models::DeleteTransactionResponse},
};

/// The state needed to delete a transaction.
#[derive(Debug, Clone)]
pub struct DeleteTransactionState {
    /// The database connection for managing transactions.
    db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for soft deleting a transaction.
///
/// The ID is taken as a string so that a malformed ID is reported as such
/// instead of as a missing route.
pub async fn delete_transaction_endpoint(
    State(state): State<DeleteTransactionState>,
    Extension(user_id): Extension<UserId>,
    Path(transaction_id): Path<String>,
) -> Result<Json<DeleteTransactionResponse>, Error> {
    tracing::info!("Received delete transaction request for ID: {transaction_id}");

    let id = parse_transaction_id(&transaction_id)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let id = soft_delete_transaction(
        id,
        &user_id,
        to_epoch_millis(OffsetDateTime::now_utc()),
        &connection,
    )
    .inspect_err(|error| tracing::error!("Could not delete transaction {id}: {error}"))?;

    Ok(Json(DeleteTransactionResponse { id, success: true }))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension, Json,
        extract::{Path, State},
    };

    use crate::{
        Error, UserId,
        transaction::{
            core::get_transaction,
            models::DeleteTransactionResponse,
            test_utils::{create_test_transaction, get_test_connection},
        },
    };

    use super::{DeleteTransactionState, delete_transaction_endpoint};

    #[tokio::test]
    async fn can_delete_transaction() {
        let connection = get_test_connection();
        let user_id = UserId::new("alice");
        let created = create_test_transaction(&user_id, &connection);
        let state = DeleteTransactionState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let Json(response) = delete_transaction_endpoint(
            State(state.clone()),
            Extension(user_id.clone()),
            Path(created.id.to_string()),
        )
        .await
        .unwrap();

        assert_eq!(
            response,
            DeleteTransactionResponse {
                id: created.id,
                success: true
            }
        );
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(
            get_transaction(created.id, &user_id, &connection),
            Err(Error::TransactionNotFound(created.id.to_string()))
        );
    }

    #[tokio::test]
    async fn rejects_malformed_id() {
        let state = DeleteTransactionState {
            db_connection: Arc::new(Mutex::new(get_test_connection())),
        };

        let result = delete_transaction_endpoint(
            State(state),
            Extension(UserId::new("alice")),
            Path("not-a-uuid".to_owned()),
        )
        .await;

        assert_eq!(result.err(), Some(Error::InvalidIdFormat));
    }

    #[tokio::test]
    async fn deleting_twice_is_not_found() {
        let connection = get_test_connection();
        let user_id = UserId::new("alice");
        let created = create_test_transaction(&user_id, &connection);
        let state = DeleteTransactionState {
            db_connection: Arc::new(Mutex::new(connection)),
        };
        delete_transaction_endpoint(
            State(state.clone()),
            Extension(user_id.clone()),
            Path(created.id.to_string()),
        )
        .await
        .unwrap();

        let result = delete_transaction_endpoint(
            State(state),
            Extension(user_id),
            Path(created.id.to_string()),
        )
        .await;

        assert_eq!(
            result.err(),
            Some(Error::TransactionNotFound(created.id.to_string()))
        );
    }
}
