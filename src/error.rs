//! Error types for CascadeQL.
//!
//! All errors in CascadeQL are strongly typed using thiserror.
//! Empty query results and cancelled cascades are *not* errors; they are
//! reported through `QueryOutcome` diagnostics and `TerminationReason`.

use thiserror::Error;

use crate::nuclide::NuclideId;
use crate::storage::StorageError;

/// Validation errors raised before any work starts.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("at least one fuel nuclide required")]
    EmptyFuel,

    #[error("Unknown fuel nuclide '{notation}'")]
    UnknownFuelNuclide {
        notation: String,
    },

    #[error("Fuel nuclide {id} is not present in the reaction store")]
    FuelNotInStore {
        id: NuclideId,
    },

    #[error("Invalid nuclide notation '{notation}'")]
    InvalidNotation {
        notation: String,
    },

    #[error("Invalid parameter '{field}': {reason}")]
    InvalidParameter {
        field: String,
        reason: String,
    },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig {
        reason: String,
    },
}

/// Execution errors that occur while a query or cascade is running.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Storage error: {message}")]
    Storage {
        message: String,
    },

    #[error("Invalid run state transition: {from} -> {to}")]
    InvalidTransition {
        from: String,
        to: String,
    },

    #[error("Queue full on {path} path (capacity {capacity})")]
    QueueFull {
        path: String,
        capacity: usize,
    },

    #[error("Worker disconnected on {path} path")]
    Disconnected {
        path: String,
    },

    #[error("Operation timed out after {duration_ms}ms")]
    Timeout {
        duration_ms: u64,
    },
}

/// Top-level error type for CascadeQL.
#[derive(Debug, Error)]
pub enum TransmuteError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("Internal error: {message}")]
    Internal {
        message: String,
    },
}

impl TransmuteError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is an execution error.
    #[must_use]
    pub const fn is_execution(&self) -> bool {
        matches!(self, Self::Execution(_))
    }

    /// Returns true if this is an internal error.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal { .. })
    }

    /// Returns true if retrying the same request may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Validation(_) | Self::Internal { .. } => false,
            Self::Execution(e) => matches!(
                e,
                ExecutionError::QueueFull { .. } | ExecutionError::Timeout { .. }
            ),
        }
    }
}

/// Result type alias for CascadeQL operations.
pub type TransmuteResult<T> = Result<T, TransmuteError>;

/// Maps a store failure into the data-error branch of the taxonomy.
pub(crate) fn storage_err(err: StorageError) -> TransmuteError {
    TransmuteError::Execution(ExecutionError::Storage {
        message: err.to_string(),
    })
}
