use thiserror::Error;

use crate::quota::Feature;

/// Typed failures for the sync and analytics layer.
///
/// Collaborator traits (`KeyValueStorage`, `DocumentStore`,
/// `CompletionService`) return `anyhow::Result` and are wrapped into one of
/// these variants at the layer boundary. Stores absorb `Storage` and
/// `RemoteSync` internally; a mutation never fails because persistence or
/// the remote mirror did.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Local persistence read/write/(de)serialize error for a given key.
    #[error("storage failure for key \"{key}\"")]
    Storage {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    /// A remote document call failed. Never surfaced to mutation callers;
    /// recorded through the error sink and reflected in `SyncStatus`.
    #[error("remote sync failed during {operation}")]
    RemoteSync {
        operation: String,
        #[source]
        source: anyhow::Error,
    },

    /// A guarded operation would exceed the per-period ceiling.
    /// The counter is left untouched.
    #[error("quota exceeded for {feature} (limit {limit})")]
    QuotaExceeded { feature: Feature, limit: u32 },

    /// Precondition violation, a programming error. Not retryable.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The completion service failed. Retryable from the caller's side.
    #[error("completion service failure")]
    Completion(#[source] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
