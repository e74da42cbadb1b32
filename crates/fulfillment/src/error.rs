//! Fulfillment error taxonomy.

use thiserror::Error;

use orderflow_core::ProductId;
use orderflow_storage::StorageError;

/// Why a fulfillment request was not (or could not be) fulfilled.
///
/// The first three are business outcomes: retrying without new information
/// will fail identically. `TransientConflict` and `Storage` are system
/// outcomes; the whole request may be retried, since nothing was committed.
#[derive(Debug, Error)]
pub enum FulfillmentError {
    /// The referenced product does not exist.
    #[error("product not found: {0}")]
    ProductNotFound(ProductId),

    /// The ledger holds fewer units than requested. Carries the currently
    /// available stock for caller decision-making.
    #[error("insufficient stock: {available} available, {requested} requested")]
    InsufficientStock { available: i64, requested: i64 },

    /// Malformed input, rejected before any storage access.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Concurrent-writer conflict survived the retry budget. No partial state
    /// was committed; the caller may retry the whole request.
    #[error("transient conflict: {0}")]
    TransientConflict(String),

    /// The transactional store failed for infrastructure reasons.
    #[error("storage failure: {0}")]
    Storage(StorageError),
}

impl From<StorageError> for FulfillmentError {
    fn from(err: StorageError) -> Self {
        if err.is_retryable() {
            Self::TransientConflict(err.to_string())
        } else {
            Self::Storage(err)
        }
    }
}
