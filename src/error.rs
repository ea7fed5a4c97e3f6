use crate::domain::order::OrderType;
use crate::domain::specification::ValueKind;
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BankError {
    #[error("{entity} with id {id} doesn't exist")]
    NotFound { entity: &'static str, id: u64 },

    #[error("Unknown order type: {0}")]
    UnknownOrderType(String),

    #[error("Attribute '{attribute}' doesn't exist on {record}")]
    InvalidAttribute {
        attribute: String,
        record: &'static str,
    },

    #[error("Attribute '{attribute}' of kind {kind} can't be ordered")]
    UnorderableType { attribute: String, kind: ValueKind },

    #[error("Attribute '{attribute}' expects a {expected} value, got {found}")]
    ValueKindMismatch {
        attribute: String,
        expected: ValueKind,
        found: ValueKind,
    },

    #[error(
        "Insufficient balance on account of client {client_id}: balance {balance}, requested {requested}"
    )]
    InsufficientFunds {
        client_id: u64,
        balance: Decimal,
        requested: Decimal,
    },

    #[error("Account unavailable: {0}")]
    AccountUnavailable(String),

    #[error("Order {0} is already finalized")]
    OrderFinalized(u64),

    #[error("An action for order type {0} is already registered")]
    DuplicateOrderAction(OrderType),

    #[error("Payload for order type {order_type} is invalid: {source}")]
    InvalidPayload {
        order_type: OrderType,
        #[source]
        source: serde_json::Error,
    },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[cfg(feature = "storage-rocksdb")]
    #[error("Storage error: {0}")]
    StorageError(#[from] rocksdb::Error),

    #[error("Internal error: {0}")]
    InternalError(Box<dyn std::error::Error + Send + Sync>),
}

impl BankError {
    pub fn not_found(entity: &'static str, id: u64) -> Self {
        Self::NotFound { entity, id }
    }

    /// Errors caused by the request itself rather than by a bug or a broken
    /// backend. These are reported to the caller and never retried.
    pub fn is_business_rejection(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. }
                | Self::InsufficientFunds { .. }
                | Self::AccountUnavailable(_)
                | Self::OrderFinalized(_)
                | Self::ValidationError(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, BankError>;
