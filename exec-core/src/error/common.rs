//! Common error types shared across the crate.

use thiserror::Error;

/// Validation errors for values, identifiers, and command inputs.
///
/// Validation failures are reported to the caller and never mutate state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationError {
    /// Arithmetic attempted across values of differing decimal precision
    #[error("precision mismatch: {lhs} (precision {lhs_precision}) vs {rhs} (precision {rhs_precision})")]
    PrecisionMismatch {
        lhs: String,
        lhs_precision: u8,
        rhs: String,
        rhs_precision: u8,
    },

    /// Quantity must be strictly positive for the operation
    #[error("quantity {0} must be positive")]
    QuantityNonPositive(String),

    /// Price may not be negative
    #[error("price {0} may not be negative")]
    PriceNegative(String),

    /// Time-in-force not allowed for the order type
    #[error("time in force {tif} is invalid for {order_type} orders")]
    TimeInForceInvalid { tif: String, order_type: String },

    /// Timestamp was not UTC-tagged
    #[error("timestamp {0} is not UTC")]
    TimestampNotUtc(String),

    /// Required field is empty
    #[error("{field} is required but was empty")]
    Required { field: &'static str },

    /// Field contains control characters or other invalid input
    #[error("{field} contains invalid characters")]
    InvalidCharacters { field: &'static str },
}

impl ValidationError {
    /// Create a Required validation error
    pub fn required(field: &'static str) -> Self {
        ValidationError::Required { field }
    }

    /// Create an InvalidCharacters validation error
    pub fn invalid_chars(field: &'static str) -> Self {
        ValidationError::InvalidCharacters { field }
    }
}

/// Result type for database operations.
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Errors surfaced by the execution database.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum DatabaseError {
    /// Record was not found for an update
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Record already exists for an add
    #[error("{entity_type} already exists: {id}")]
    AlreadyExists {
        entity_type: &'static str,
        id: String,
    },

    /// Per-record serialization failed
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// Store connection could not be established
    #[error("store connection failed: {0}")]
    Connection(String),

    /// Store stayed unreachable after bounded retries; the offending
    /// operation fails but the engine continues
    #[error("store unavailable after {attempts} attempts: {reason}")]
    Unavailable { attempts: u32, reason: String },
}

impl DatabaseError {
    /// Create a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        DatabaseError::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Create an AlreadyExists error
    pub fn already_exists(entity_type: &'static str, id: impl Into<String>) -> Self {
        DatabaseError::AlreadyExists {
            entity_type,
            id: id.into(),
        }
    }
}

impl From<serde_json::Error> for DatabaseError {
    fn from(err: serde_json::Error) -> Self {
        DatabaseError::Serialization(err.to_string())
    }
}
