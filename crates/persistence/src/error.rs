//! Error types for the persistence layer.
//!
//! This module defines all error types used throughout the persistence layer,
//! following a hierarchy that separates query compilation errors (bad client
//! input), resource state errors, and errors raised by a backend while executing
//! a compiled query.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use std::fmt;

use thiserror::Error;

/// The primary error type for all repository operations.
///
/// This enum encompasses all possible errors that can occur during persistence
/// operations, organized by category.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Query compilation errors (detected before any backend call)
    #[error(transparent)]
    Query(#[from] QueryError),

    /// Resource state errors
    #[error(transparent)]
    Resource(#[from] ResourceError),

    /// Backend-specific errors
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// A uniqueness constraint was violated by an insert or update.
    #[error("conflict on {entity}: unique constraint '{constraint}' violated")]
    Conflict {
        entity: String,
        constraint: String,
        #[source]
        source: BackendError,
    },

    /// The caller signalled cancellation while the backend call was in flight.
    #[error("operation cancelled")]
    Cancelled,
}

/// Errors raised while compiling declarative query descriptions.
///
/// These are deterministic input errors: retrying the same request will
/// always fail the same way.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    /// The named property does not exist on the entity.
    #[error("unknown property '{property}' on entity '{entity}'")]
    UnknownProperty { entity: String, property: String },

    /// The operator cannot be applied to the property's type.
    #[error(
        "operator '{operator}' is not supported for property '{property}' of type '{field_type}'; supported operators are: {allowed}"
    )]
    UnsupportedOperator {
        operator: String,
        property: String,
        field_type: String,
        allowed: String,
    },

    /// The literal could not be converted to the target type.
    #[error("failed to convert value {} to type '{target_type}': {message}", display_literal(.literal))]
    InvalidValue {
        literal: Option<String>,
        target_type: String,
        message: String,
    },

    /// The request itself is malformed (empty filter list, duplicate keys, ...).
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    /// Projecting a property failed.
    #[error("projection of '{property}' failed: {message}")]
    Projection { property: String, message: String },
}

fn display_literal(literal: &Option<String>) -> String {
    match literal {
        Some(value) => format!("'{}'", value),
        None => "null".to_string(),
    }
}

impl QueryError {
    /// Creates an [`QueryError::InvalidArgument`] error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        QueryError::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates an [`QueryError::InvalidValue`] error.
    pub fn invalid_value(
        literal: Option<&str>,
        target_type: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        QueryError::InvalidValue {
            literal: literal.map(str::to_string),
            target_type: target_type.into(),
            message: message.into(),
        }
    }
}

/// Errors related to resource state.
#[derive(Error, Debug)]
pub enum ResourceError {
    /// The requested entity was not found.
    #[error("entity not found: {entity}/{id}")]
    NotFound { entity: String, id: String },
}

/// Errors originating from the query backend.
#[derive(Error, Debug)]
pub enum BackendError {
    /// The backend is currently unavailable.
    #[error("backend unavailable: {backend_name}")]
    Unavailable {
        backend_name: String,
        message: String,
    },

    /// No session could be acquired in time.
    #[error("session pool exhausted for {backend_name}")]
    PoolExhausted { backend_name: String },

    /// The requested capability is not supported by this backend.
    #[error("capability '{capability}' not supported by {backend_name}")]
    UnsupportedCapability {
        backend_name: String,
        capability: String,
    },

    /// A uniqueness constraint was violated.
    #[error("unique constraint '{constraint}' violated in {backend_name}")]
    UniqueViolation {
        backend_name: String,
        entity: String,
        constraint: String,
    },

    /// Execution stopped because cancellation was observed.
    #[error("execution interrupted in {backend_name}")]
    Interrupted { backend_name: String },

    /// Internal backend error.
    #[error("internal error in {backend_name}: {message}")]
    Internal {
        backend_name: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Query execution error.
    #[error("query execution failed: {message}")]
    QueryError { message: String },

    /// Serialization/deserialization error.
    #[error("serialization error: {message}")]
    SerializationError { message: String },
}

/// How a caller (for example an HTTP layer) should classify an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// The request was malformed; maps to a 400-class response.
    BadRequest,
    /// The addressed entity does not exist.
    NotFound,
    /// A uniqueness constraint was violated.
    Conflict,
    /// The caller cancelled the operation.
    Cancelled,
    /// Anything else; maps to a 500-class response.
    Internal,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorClass::BadRequest => write!(f, "bad-request"),
            ErrorClass::NotFound => write!(f, "not-found"),
            ErrorClass::Conflict => write!(f, "conflict"),
            ErrorClass::Cancelled => write!(f, "cancelled"),
            ErrorClass::Internal => write!(f, "internal"),
        }
    }
}

impl StorageError {
    /// Returns the classification callers should map this error to.
    pub fn class(&self) -> ErrorClass {
        match self {
            StorageError::Query(_) => ErrorClass::BadRequest,
            StorageError::Resource(ResourceError::NotFound { .. }) => ErrorClass::NotFound,
            StorageError::Conflict { .. } => ErrorClass::Conflict,
            StorageError::Cancelled => ErrorClass::Cancelled,
            StorageError::Backend(_) => ErrorClass::Internal,
        }
    }

    /// Returns true if this error was caused by client input.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self.class(),
            ErrorClass::BadRequest | ErrorClass::NotFound | ErrorClass::Conflict
        )
    }
}

/// Result type alias for repository operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Result type alias for query compilation.
pub type QueryResult<T> = Result<T, QueryError>;

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Backend(BackendError::SerializationError {
            message: err.to_string(),
        })
    }
}
