//! The JSON request and response bodies of the transaction endpoints.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error,
    database_id::{CategoryId, TransactionId},
    timestamp::{EpochMillis, from_epoch_millis},
    transaction::core::{NewTransaction, Transaction},
};

/// The body of a request to create a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionRequest {
    /// A short summary of the transaction.
    pub title: String,
    /// Optional free text with more detail.
    #[serde(default)]
    pub description: Option<String>,
    /// The amount of money spent or earned.
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    /// When the transaction happened, in milliseconds since the Unix epoch.
    pub transaction_date: EpochMillis,
    /// Either "income" or "expense".
    #[serde(rename = "type")]
    pub transaction_type: String,
    /// The category of the transaction, e.g. "groceries".
    pub category_id: CategoryId,
}

impl CreateTransactionRequest {
    /// Validate the request fields.
    ///
    /// # Errors
    /// Returns [Error::Validation] if a field is invalid.
    pub fn validate(&self) -> Result<NewTransaction, Error> {
        NewTransaction::new(
            &self.title,
            self.description.as_deref(),
            self.amount,
            self.transaction_date,
            &self.transaction_type,
            &self.category_id,
        )
    }
}

/// The body of a request to update a transaction.
///
/// All user-editable fields are replaced, so the body has the same fields as
/// [CreateTransactionRequest] plus the ID of the transaction to update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTransactionRequest {
    /// The ID of the transaction to update, parsed by the handler so a
    /// malformed ID can be reported as such.
    pub id: String,
    /// The new fields of the transaction.
    #[serde(flatten)]
    pub fields: CreateTransactionRequest,
}

/// A transaction as sent to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// A short summary of the transaction.
    pub title: String,
    /// Optional free text with more detail.
    pub description: Option<String>,
    /// The amount of money spent or earned.
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    /// Either "income" or "expense".
    #[serde(rename = "type")]
    pub transaction_type: String,
    /// The category of the transaction.
    pub category_id: CategoryId,
    /// When the transaction happened.
    #[serde(with = "time::serde::rfc3339")]
    pub transaction_date: OffsetDateTime,
    /// When the transaction was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the transaction was last changed.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl TryFrom<Transaction> for TransactionResponse {
    type Error = Error;

    fn try_from(transaction: Transaction) -> Result<Self, Self::Error> {
        Ok(Self {
            id: transaction.id,
            title: transaction.title,
            description: transaction.description,
            amount: transaction.amount,
            transaction_type: transaction.transaction_type,
            category_id: transaction.category_id,
            transaction_date: from_epoch_millis(transaction.transaction_date)?,
            created_at: from_epoch_millis(transaction.created_at)?,
            updated_at: from_epoch_millis(transaction.updated_at)?,
        })
    }
}

/// The response to a successful delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteTransactionResponse {
    /// The ID of the deleted transaction.
    pub id: TransactionId,
    /// Always true, failures are sent as problem responses.
    pub success: bool,
}

/// One page of the transaction list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPage {
    /// The transactions on this page.
    pub data: Vec<TransactionResponse>,
    /// The number of pages for the current filters and page size.
    pub page_count: u64,
    /// The number of transactions matching the current filters, across all pages.
    pub total_count: u64,
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use serde_json::json;
    use time::macros::datetime;
    use uuid::Uuid;

    use crate::{
        UserId,
        transaction::core::Transaction,
    };

    use super::{CreateTransactionRequest, TransactionResponse, UpdateTransactionRequest};

    #[test]
    fn deserializes_create_request() {
        let body = json!({
            "title": "Groceries",
            "amount": 12.34,
            "transactionDate": 1_742_429_947_123_i64,
            "type": "expense",
            "categoryId": "groceries"
        });

        let request: CreateTransactionRequest = serde_json::from_value(body).unwrap();

        assert_eq!(
            request,
            CreateTransactionRequest {
                title: "Groceries".to_owned(),
                description: None,
                amount: Decimal::new(1_234, 2),
                transaction_date: 1_742_429_947_123,
                transaction_type: "expense".to_owned(),
                category_id: "groceries".to_owned(),
            }
        );
    }

    #[test]
    fn deserializes_update_request_with_id() {
        let body = json!({
            "id": "not-a-uuid",
            "title": "Salary",
            "description": "March",
            "amount": 5000,
            "transactionDate": 0,
            "type": "income",
            "categoryId": "salary"
        });

        let request: UpdateTransactionRequest = serde_json::from_value(body).unwrap();

        assert_eq!(request.id, "not-a-uuid");
        assert_eq!(request.fields.amount, Decimal::new(5_000, 0));
        assert_eq!(request.fields.description.as_deref(), Some("March"));
    }

    #[test]
    fn serializes_response_with_camel_case_and_rfc3339_dates() {
        let id = Uuid::new_v4();
        let transaction = Transaction {
            id,
            user_id: UserId::new("alice"),
            title: "Rent".to_owned(),
            description: None,
            amount: Decimal::new(150_000, 2),
            transaction_date: 1_742_429_947_123,
            transaction_type: "expense".to_owned(),
            category_id: "rent".to_owned(),
            created_at: 1_742_429_947_123,
            updated_at: 1_742_429_947_123,
            is_deleted: false,
        };

        let response = TransactionResponse::try_from(transaction).unwrap();
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(response.transaction_date, datetime!(2025-03-20 00:19:07.123 UTC));
        assert_eq!(json["id"], id.to_string());
        assert_eq!(json["type"], "expense");
        assert_eq!(json["categoryId"], "rent");
        assert_eq!(json["amount"], 1500.0);
        assert_eq!(json["transactionDate"], "2025-03-20T00:19:07.123Z");
        assert!(json.get("userId").is_none());
    }
}
