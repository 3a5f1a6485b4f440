//! Bextpense is a web service for tracking personal income and expenses.
//!
//! This library provides a JSON REST API for creating, updating, deleting and
//! listing transactions, plus a dashboard overview that aggregates the last
//! twelve months of income, expenses and savings.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use tokio::signal;

mod app_state;
mod category;
mod dashboard;
mod database_id;
mod db;
mod endpoints;
mod logging;
mod pagination;
mod pdf_export;
mod principal;
mod problem;
mod routing;
mod timestamp;
mod transaction;
mod transaction_type;
mod user;

pub use app_state::AppState;
pub use db::initialize as initialize_db;
pub use logging::logging_middleware;
pub use pagination::PaginationConfig;
pub use pdf_export::{ChromiumPdfRenderer, DEFAULT_RENDER_TIMEOUT, PdfRenderer};
pub use routing::build_router;
pub use transaction::{NewTransaction, create_transaction};
pub use user::UserId;

use crate::problem::render_problem;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A required field was missing or a field failed validation, e.g. a title
    /// that is too long or a negative amount.
    #[error("{0}")]
    Validation(String),

    /// A transaction ID could not be parsed as a UUID.
    #[error("Invalid transaction ID format")]
    InvalidIdFormat,

    /// The transaction type does not match a row in the transaction type table.
    #[error("Transaction type '{0}' does not exist")]
    TransactionTypeNotFound(String),

    /// The category ID does not match a row in the category table.
    #[error("Category '{0}' does not exist")]
    CategoryNotFound(String),

    /// No live transaction with the given ID belongs to the current user.
    #[error("Transaction with ID '{0}' not found")]
    TransactionNotFound(String),

    /// The requested resource was not found.
    ///
    /// Internally, this error occurs when a query returns no rows. Callers
    /// usually replace it with one of the more specific not found variants.
    #[error("the requested resource could not be found")]
    NotFound,

    /// A list query failed to execute.
    ///
    /// The string carries the message of the underlying error.
    #[error("Failed to fetch transactions: {0}")]
    QueryFailed(String),

    /// The PDF renderer failed to produce a document.
    #[error("Failed to export PDF: {0}")]
    PdfExportFailed(String),

    /// A calendar date could not be constructed, e.g. a year out of range.
    #[error("invalid date: {0}")]
    InvalidDate(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl Error {
    /// The HTTP status code used when the error is sent to the client.
    fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation(_) | Error::InvalidIdFormat | Error::InvalidDate(_) => {
                StatusCode::BAD_REQUEST
            }
            Error::TransactionTypeNotFound(_)
            | Error::CategoryNotFound(_)
            | Error::TransactionNotFound(_)
            | Error::NotFound => StatusCode::NOT_FOUND,
            Error::QueryFailed(_)
            | Error::PdfExportFailed(_)
            | Error::SqlError(_)
            | Error::DatabaseLockError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!("An unexpected error occurred: {}", self);
        }

        render_problem(status, &self.to_string())
    }
}

#[cfg(test)]
mod error_tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use crate::Error;

    #[test]
    fn maps_no_rows_to_not_found() {
        assert_eq!(
            Error::from(rusqlite::Error::QueryReturnedNoRows),
            Error::NotFound
        );
    }

    #[test]
    fn client_errors_use_client_status_codes() {
        assert_eq!(
            Error::InvalidIdFormat.into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::Validation("title is required".to_owned())
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::CategoryNotFound("nope".to_owned())
                .into_response()
                .status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn server_errors_use_internal_server_error() {
        assert_eq!(
            Error::QueryFailed("disk I/O error".to_owned())
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            Error::DatabaseLockError.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
