//! Error handling for the trust registry
//!
//! Every component returns `RegistryResult`; the HTTP layer turns the error
//! into a problem-details envelope (see `api_errors`).

use thiserror::Error;

/// Main error type for the trust registry
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    #[error("Resource not found: {resource} - {id}")]
    NotFound { resource: String, id: String },

    #[error("Resource already exists: {resource} - {id}")]
    Conflict { resource: String, id: String },

    #[error("Attestation signing failed: {message}")]
    Signing { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Serialization failed: {context}")]
    Serialization {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O operation failed: {operation}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Lock poisoned: {resource}")]
    LockPoisoned { resource: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Type alias for Result with RegistryError
pub type RegistryResult<T> = Result<T, RegistryError>;

impl RegistryError {
    /// Create a validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(resource: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: id.into(),
        }
    }

    /// Create a conflict error
    pub fn conflict(resource: impl Into<String>, id: impl Into<String>) -> Self {
        Self::Conflict {
            resource: resource.into(),
            id: id.into(),
        }
    }

    /// Create a signing error
    pub fn signing(message: impl Into<String>) -> Self {
        Self::Signing {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn serialization(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Serialization {
            context: context.into(),
            source,
        }
    }

    pub fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

/// Helper trait for RwLock read acquisition that reports poisoning as an error
pub trait SafeReadLock<T: ?Sized> {
    fn safe_read(&self) -> RegistryResult<std::sync::RwLockReadGuard<'_, T>>;
}

impl<T: ?Sized> SafeReadLock<T> for std::sync::RwLock<T> {
    fn safe_read(&self) -> RegistryResult<std::sync::RwLockReadGuard<'_, T>> {
        self.read().map_err(|_| RegistryError::LockPoisoned {
            resource: "rwlock_read".to_string(),
        })
    }
}

/// Helper trait for RwLock write acquisition that reports poisoning as an error
pub trait SafeWriteLock<T: ?Sized> {
    fn safe_write(&self) -> RegistryResult<std::sync::RwLockWriteGuard<'_, T>>;
}

impl<T: ?Sized> SafeWriteLock<T> for std::sync::RwLock<T> {
    fn safe_write(&self) -> RegistryResult<std::sync::RwLockWriteGuard<'_, T>> {
        self.write().map_err(|_| RegistryError::LockPoisoned {
            resource: "rwlock_write".to_string(),
        })
    }
}

/// Convert from serde_json errors
impl From<serde_json::Error> for RegistryError {
    fn from(err: serde_json::Error) -> Self {
        RegistryError::serialization("json_operation", err)
    }
}

/// Convert from std::io errors
impl From<std::io::Error> for RegistryError {
    fn from(err: std::io::Error) -> Self {
        RegistryError::io("io_operation", err)
    }
}
