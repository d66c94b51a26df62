//! Error types for transaction scopes
//!
//! This module defines the errors raised while acquiring, exposing and
//! releasing the resources of a scope.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.

use crate::types::Resource;
use thiserror::Error;

/// Boxed driver error carried as the source of registry errors
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type alias for registry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the transaction registry
///
/// Errors produced by the wrapped body itself never pass through this type;
/// they reach the caller unchanged.
#[derive(Debug, Error)]
pub enum Error {
    /// An accessor was used outside any scope for that slot on this thread
    #[error("No active transaction for slot '{slot}'")]
    NoActiveTransaction {
        /// Slot that was looked up
        slot: String,
    },

    /// The connection factory failed
    #[error("Failed to open connection for slot '{slot}': {source}")]
    Connect {
        /// Slot the scope was opened for
        slot: String,
        /// Driver error
        #[source]
        source: BoxError,
    },

    /// The cursor factory failed (the connection has already been closed)
    #[error("Failed to open cursor for slot '{slot}': {source}")]
    OpenCursor {
        /// Slot the scope was opened for
        slot: String,
        /// Driver error
        #[source]
        source: BoxError,
    },

    /// Closing a resource failed while releasing a scope
    #[error("Failed to close {resource} for slot '{slot}': {source}")]
    Close {
        /// Slot the scope was opened for
        slot: String,
        /// Which resource refused to close
        resource: Resource,
        /// Driver error
        #[source]
        source: BoxError,
    },
}

impl Error {
    /// Build a `Connect` error from a driver error
    pub fn connect<E>(slot: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Connect {
            slot: slot.into(),
            source: Box::new(source),
        }
    }

    /// Build an `OpenCursor` error from a driver error
    pub fn open_cursor<E>(slot: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::OpenCursor {
            slot: slot.into(),
            source: Box::new(source),
        }
    }

    /// Build a `Close` error from a driver error
    pub fn close<E>(slot: impl Into<String>, resource: Resource, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Close {
            slot: slot.into(),
            resource,
            source: Box::new(source),
        }
    }

    /// True if an accessor was used outside a scope
    pub fn is_no_active_transaction(&self) -> bool {
        matches!(self, Error::NoActiveTransaction { .. })
    }

    /// True if resources could not be acquired
    pub fn is_acquire_failure(&self) -> bool {
        matches!(self, Error::Connect { .. } | Error::OpenCursor { .. })
    }

    /// True if a resource could not be released
    pub fn is_close_failure(&self) -> bool {
        matches!(self, Error::Close { .. })
    }

    /// Slot the error refers to
    pub fn slot(&self) -> &str {
        match self {
            Error::NoActiveTransaction { slot }
            | Error::Connect { slot, .. }
            | Error::OpenCursor { slot, .. }
            | Error::Close { slot, .. } => slot,
        }
    }
}
