//! Storage error model and sqlx error mapping.

use thiserror::Error;

/// Infrastructure-level storage error.
///
/// Domain outcomes (not found, insufficient stock) are **not** represented
/// here; repositories return `Option`/[`DecrementError`] for those.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The underlying store rejected or failed the operation.
    #[error("database error in {op}: {message}")]
    Database { op: &'static str, message: String },

    /// A concurrent writer conflicted with this operation (serialization
    /// failure, deadlock, unique-key race). Safe to retry the whole unit of
    /// work; nothing was committed.
    #[error("transient conflict in {op}: {message}")]
    Conflict { op: &'static str, message: String },

    /// The store is unreachable (pool closed, connection failure).
    #[error("storage unavailable in {op}: {message}")]
    Unavailable { op: &'static str, message: String },
}

impl StorageError {
    pub fn database(op: &'static str, message: impl Into<String>) -> Self {
        Self::Database {
            op,
            message: message.into(),
        }
    }

    pub fn conflict(op: &'static str, message: impl Into<String>) -> Self {
        Self::Conflict {
            op,
            message: message.into(),
        }
    }

    /// Whether retrying the enclosing unit of work may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

/// Outcome of an atomic stock decrement/adjust that did not go through.
#[derive(Debug, Error)]
pub enum DecrementError {
    #[error("inventory item not found")]
    NotFound,

    /// The ledger holds fewer units than requested. No partial decrement.
    #[error("insufficient stock: {available} available, {requested} requested")]
    Insufficient { available: i64, requested: i64 },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Map sqlx errors to [`StorageError`].
///
/// Postgres error codes:
/// - `40001` serialization failure, `40P01` deadlock detected → `Conflict`
/// - `23505` unique violation (concurrent insert race) → `Conflict`
/// - anything else → `Database`
pub(crate) fn map_sqlx_error(op: &'static str, err: sqlx::Error) -> StorageError {
    match err {
        sqlx::Error::Database(db_err) => {
            let message = db_err.message().to_string();
            match db_err.code().as_deref() {
                Some("40001") | Some("40P01") | Some("23505") => {
                    StorageError::Conflict { op, message }
                }
                _ => StorageError::Database { op, message },
            }
        }
        sqlx::Error::PoolClosed | sqlx::Error::PoolTimedOut => StorageError::Unavailable {
            op,
            message: err.to_string(),
        },
        sqlx::Error::Io(e) => StorageError::Unavailable {
            op,
            message: e.to_string(),
        },
        other => StorageError::Database {
            op,
            message: other.to_string(),
        },
    }
}
