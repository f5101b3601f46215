//! Error types for the multi-storage layer
//!
//! Provides structured error types for backends, the aliveness cache, the
//! collector and the policy-driven folder.

use thiserror::Error;

/// Unified error type for the multi-storage layer
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Internal Errors
    // =========================================================================
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // =========================================================================
    // Object Errors
    // =========================================================================
    #[error("Object not found: {path}{}", storage.as_ref().map(|s| format!(" (storage: {s})")).unwrap_or_default())]
    ObjectNotFound {
        path: String,
        storage: Option<String>,
    },

    // =========================================================================
    // Storage Selection Errors
    // =========================================================================
    #[error("No storages are used")]
    NoUsedStorages,

    #[error("No alive storages")]
    NoAliveStorages,

    #[error("Unknown storage: {name}")]
    UnknownStorage { name: String },

    #[error("Multi-storage folder is expected to use a single storage, but it uses {count}")]
    MultipleStoragesUsed { count: usize },

    // =========================================================================
    // Backend Errors
    // =========================================================================
    #[error("Backend unavailable: {backend}")]
    BackendUnavailable { backend: String },

    #[error("{operation} in storage {storage:?}: {source}")]
    StorageOperation {
        storage: String,
        operation: String,
        #[source]
        source: Box<Error>,
    },

    #[error("Alive check failed for storage {storage:?}: {reason}")]
    AliveCheckFailed { storage: String, reason: String },

    #[error("Failed to close storage(s) and release resources: {}", errors.join(", "))]
    CloseFailed { errors: Vec<String> },

    // =========================================================================
    // Parse Errors
    // =========================================================================
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    // =========================================================================
    // IO Errors
    // =========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification used by callers deciding whether to retry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Misconfiguration or misuse, never retried
    Configuration,
    /// Backend or network trouble that may go away
    Transient,
    /// The object does not exist, distinct from "unreachable"
    NotFound,
    /// Anything else
    Internal,
}

impl Error {
    /// Create a not-found error for a backend-relative path
    pub fn not_found(path: impl Into<String>) -> Self {
        Error::ObjectNotFound {
            path: path.into(),
            storage: None,
        }
    }

    /// Wrap an error with the name of the storage it came from
    pub fn in_storage(self, storage: impl Into<String>, operation: impl Into<String>) -> Self {
        Error::StorageOperation {
            storage: storage.into(),
            operation: operation.into(),
            source: Box::new(self),
        }
    }

    /// Determine the class of this error
    pub fn class(&self) -> ErrorClass {
        match self {
            Error::StorageOperation { source, .. } => source.class(),

            Error::ObjectNotFound { .. } => ErrorClass::NotFound,

            Error::BackendUnavailable { .. }
            | Error::AliveCheckFailed { .. }
            | Error::NoAliveStorages
            | Error::Io(_) => ErrorClass::Transient,

            Error::Configuration(_)
            | Error::NoUsedStorages
            | Error::UnknownStorage { .. }
            | Error::MultipleStoragesUsed { .. }
            | Error::YamlParse(_) => ErrorClass::Configuration,

            Error::Internal(_) | Error::CloseFailed { .. } | Error::JsonParse(_) => {
                ErrorClass::Internal
            }
        }
    }

    /// Check if this error means the object is absent (through storage wrappers)
    pub fn is_not_found(&self) -> bool {
        self.class() == ErrorClass::NotFound
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        !matches!(self.class(), ErrorClass::Configuration | ErrorClass::NotFound)
    }

    /// Check if this error is transient
    pub fn is_transient(&self) -> bool {
        self.class() == ErrorClass::Transient
    }
}

/// Result type alias for the multi-storage layer
pub type Result<T> = std::result::Result<T, Error>;
