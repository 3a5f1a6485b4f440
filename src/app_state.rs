//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::{
    Error, UserId, db::initialize, pagination::PaginationConfig, pdf_export::PdfRenderer,
};

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The user that every request acts as until real authentication is added.
    pub principal: UserId,

    /// The config that controls how to display pages of data.
    pub pagination_config: PaginationConfig,

    /// Renders pages for the PDF export.
    pub pdf_renderer: Arc<dyn PdfRenderer>,

    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the
    /// domain models and seeding the transaction types and categories.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(
        db_connection: Connection,
        principal: UserId,
        pagination_config: PaginationConfig,
        pdf_renderer: Arc<dyn PdfRenderer>,
    ) -> Result<Self, Error> {
        initialize(&db_connection)?;

        let connection = Arc::new(Mutex::new(db_connection));

        Ok(Self {
            principal,
            pagination_config,
            pdf_renderer,
            db_connection: connection,
        })
    }
}
