//! Database ID type definitions.

use uuid::Uuid;

use crate::Error;

/// The ID of a transaction, generated by the server when the transaction is created.
pub type TransactionId = Uuid;

/// The ID of a category, e.g. "salary" or "rent".
pub type CategoryId = String;

/// Parse a transaction ID sent by the client.
///
/// # Errors
/// Returns [Error::InvalidIdFormat] if `text` is not a valid UUID.
pub fn parse_transaction_id(text: &str) -> Result<TransactionId, Error> {
    Uuid::try_parse(text.trim()).map_err(|_| Error::InvalidIdFormat)
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use crate::Error;

    use super::parse_transaction_id;

    #[test]
    fn parses_uuid() {
        let id = Uuid::new_v4();

        assert_eq!(parse_transaction_id(&id.to_string()), Ok(id));
    }

    #[test]
    fn rejects_malformed_id() {
        assert_eq!(parse_transaction_id("42"), Err(Error::InvalidIdFormat));
        assert_eq!(parse_transaction_id(""), Err(Error::InvalidIdFormat));
    }
}
