//! Error types for Tabson

use thiserror::Error;

/// Core error type for tabular result operations
#[derive(Error, Debug)]
pub enum TabsonError {
    /// The schema document does not describe a valid schema
    #[error("Schema format error: {0}")]
    SchemaFormat(String),

    #[error("Invalid BSON type name: {0}")]
    InvalidTypeName(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Invalid column index {index}: result has {count} column(s)")]
    InvalidColumnIndex { index: usize, count: usize },

    /// Raised only in strict conversion mode
    #[error("Cannot convert BSON type {from} to {to}")]
    InvalidTypeCoercion { from: String, to: String },

    #[error("Result set is closed")]
    ResultSetClosed,

    #[error("No current row")]
    NoCurrentRow,

    /// The schema collaborator failed before any row was fetched
    #[error("Result schema unavailable: {0}")]
    SchemaUnavailable(String),

    #[error("Cursor error: {0}")]
    Cursor(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl TabsonError {
    pub fn coercion(from: impl Into<String>, to: impl Into<String>) -> Self {
        TabsonError::InvalidTypeCoercion {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Returns true for errors caused by using a result set outside its lifecycle
    pub fn is_lifecycle_error(&self) -> bool {
        matches!(
            self,
            TabsonError::ResultSetClosed | TabsonError::NoCurrentRow
        )
    }

    /// Returns true for errors caused by a bad column reference
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            TabsonError::ColumnNotFound(_) | TabsonError::InvalidColumnIndex { .. }
        )
    }
}

/// Result type alias for Tabson operations
pub type Result<T> = std::result::Result<T, TabsonError>;
