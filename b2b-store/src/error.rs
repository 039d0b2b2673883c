use thiserror::Error;

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by a storage backend.
///
/// Services propagate these unchanged; the HTTP layer renders them
/// as a general error.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Unknown table: {table}")]
    UnknownTable { table: String },

    #[error("Row in table {table} has no primary key")]
    MissingKey { table: String },

    #[error("Constraint violation on {table}: {message}")]
    Constraint { table: String, message: String },
}

impl StoreError {
    pub fn unknown_table<S: Into<String>>(table: S) -> Self {
        Self::UnknownTable {
            table: table.into(),
        }
    }

    pub fn missing_key<S: Into<String>>(table: S) -> Self {
        Self::MissingKey {
            table: table.into(),
        }
    }

    pub fn constraint<S: Into<String>, M: Into<String>>(table: S, message: M) -> Self {
        Self::Constraint {
            table: table.into(),
            message: message.into(),
        }
    }
}
