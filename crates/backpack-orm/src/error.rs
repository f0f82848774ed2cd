//! Error types for the mapping layer.
//!
//! Every failure is returned to the immediate caller. Storage errors keep
//! the underlying rusqlite/r2d2 error as their source.

use crate::record::State;

/// Error type for backpack-orm.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The entity declaration is malformed (programming error).
    #[error("Configuration defect: {0}")]
    Configuration(String),

    /// A value does not conform to the attribute's declared representation.
    #[error("Invalid type for {entity}.{attribute}: expected {expected}, got {found}")]
    TypeMismatch {
        entity: String,
        attribute: String,
        expected: String,
        found: &'static str,
    },

    /// The attribute is not declared on the entity.
    #[error("Attribute {attribute} not found on {entity}")]
    AttributeNotFound { entity: String, attribute: String },

    /// The execution engine rejected or failed a statement.
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// A connection could not be checked out of the pool.
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// The operation is not legal in the record's current lifecycle state.
    #[error("Cannot {operation} {entity} record in state {state}")]
    InvalidState {
        entity: String,
        state: State,
        operation: &'static str,
    },

    /// A delete was requested without any usable filter.
    #[error("Refusing to delete from {entity} without a filter")]
    EmptyFilter { entity: String },

    /// The targeted row does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A stored value could not be read back as the column's type.
    #[error("Cannot decode column {column}: {message}")]
    Decode { column: String, message: String },
}

impl Error {
    /// Create a new Configuration error.
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a new AttributeNotFound error.
    pub fn attribute_not_found<E: Into<String>, A: Into<String>>(entity: E, attribute: A) -> Self {
        Self::AttributeNotFound {
            entity: entity.into(),
            attribute: attribute.into(),
        }
    }

    /// Create a new NotFound error.
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a new Decode error.
    pub fn decode<C: Into<String>, M: Into<String>>(column: C, message: M) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Whether the error originated in the execution engine.
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::Pool(_))
    }
}

/// Result type alias using the mapping layer's Error type.
pub type Result<T> = std::result::Result<T, Error>;
