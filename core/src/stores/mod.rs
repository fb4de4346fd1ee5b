//! Domain stores. Each owns one aggregate's in-memory state as the
//! session's source of truth, persists it locally on every mutation, and
//! mirrors it remotely best-effort. Storage and remote failures are
//! absorbed here: a mutation never rolls back because durability or the
//! network failed.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::CoreError;
use crate::remote::{DocumentStore, ErrorSink};
use crate::storage::{self, KeyValueStorage};

pub mod challenges;
pub mod goals;
pub mod health;
pub mod journal;
pub mod reviews;
pub mod shopping;

pub use challenges::ChallengeStore;
pub use goals::GoalStore;
pub use health::HealthStore;
pub use journal::JournalStore;
pub use reviews::ReviewStore;
pub use shopping::ShoppingStore;

/// Where the last mutation landed. Queryable so callers and tests can
/// observe degraded sync deterministically instead of inferring it from
/// side effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncStatus {
    /// Persisted locally and mirrored remotely.
    Synced,
    /// Persisted locally only: no signed-in user, a local-only aggregate,
    /// or a failed local write with the in-memory state still intact.
    #[default]
    LocalOnly,
    /// Local persistence succeeded but the remote write failed.
    SyncFailed,
}

/// Injected collaborators shared by every store. Constructed once at
/// startup; no ambient globals.
#[derive(Clone)]
pub struct SyncContext {
    pub storage: Arc<dyn KeyValueStorage>,
    pub remote: Arc<dyn DocumentStore>,
    pub errors: Arc<dyn ErrorSink>,
    user_id: Option<String>,
}

impl SyncContext {
    #[must_use]
    pub fn new(
        storage: Arc<dyn KeyValueStorage>,
        remote: Arc<dyn DocumentStore>,
        errors: Arc<dyn ErrorSink>,
    ) -> Self {
        SyncContext {
            storage,
            remote,
            errors,
            user_id: None,
        }
    }

    #[must_use]
    pub fn with_user(mut self, user_id: &str) -> Self {
        self.user_id = Some(user_id.to_string());
        self
    }

    pub fn set_user(&mut self, user_id: Option<String>) {
        self.user_id = user_id;
    }

    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// Persist a value locally. Failure is reported, not returned; the
    /// in-memory state stays authoritative either way.
    pub(crate) fn persist<T: Serialize>(&self, key: &str, value: &T) -> bool {
        match storage::save(self.storage.as_ref(), key, value) {
            Ok(()) => true,
            Err(error) => {
                self.errors.report(&format!("persist {key}"), &error.into());
                false
            }
        }
    }

    /// Load the aggregate persisted under `key`, falling back on a fresh
    /// default when absent or unreadable (a corrupt cache is reported and
    /// discarded, never fatal at startup).
    pub(crate) fn restore<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        match storage::load(self.storage.as_ref(), key, T::default()) {
            Ok(value) => value,
            Err(error) => {
                self.errors.report(&format!("restore {key}"), &error.into());
                T::default()
            }
        }
    }

    /// Run a remote write for the signed-in user. `None` when nobody is
    /// signed in, otherwise whether the write succeeded. Failures are
    /// wrapped as `RemoteSync` and reported.
    pub(crate) fn push(
        &self,
        operation: &str,
        write: impl FnOnce(&dyn DocumentStore, &str) -> anyhow::Result<()>,
    ) -> Option<bool> {
        let user = self.user_id.as_deref()?;
        match write(self.remote.as_ref(), user) {
            Ok(()) => Some(true),
            Err(source) => {
                let error: anyhow::Error = CoreError::RemoteSync {
                    operation: operation.to_string(),
                    source,
                }
                .into();
                self.errors.report(operation, &error);
                Some(false)
            }
        }
    }
}

/// Fold local persistence and remote propagation results into a status.
pub(crate) fn status_of(persisted: bool, pushed: Option<bool>) -> SyncStatus {
    match (persisted, pushed) {
        (true, Some(true)) => SyncStatus::Synced,
        (_, Some(false)) => SyncStatus::SyncFailed,
        _ => SyncStatus::LocalOnly,
    }
}

#[cfg(test)]
pub(crate) mod testutil {
    use std::sync::Mutex;

    use anyhow::anyhow;
    use serde_json::Value;

    use crate::remote::{Document, DocumentStore, ErrorSink, MemoryDocumentStore, Query};
    use crate::storage::{KeyValueStorage, MemoryStorage};

    use super::*;

    /// Error sink that records operation names for assertions.
    #[derive(Default)]
    pub struct CollectingSink {
        pub operations: Mutex<Vec<String>>,
    }

    impl CollectingSink {
        pub fn operations(&self) -> Vec<String> {
            self.operations.lock().unwrap().clone()
        }
    }

    impl ErrorSink for CollectingSink {
        fn report(&self, operation: &str, _error: &anyhow::Error) {
            self.operations.lock().unwrap().push(operation.to_string());
        }
    }

    /// Storage double whose writes always fail.
    pub struct FailingStorage;

    impl KeyValueStorage for FailingStorage {
        fn get(&self, _key: &str) -> anyhow::Result<Option<String>> {
            Ok(None)
        }

        fn set(&self, _key: &str, _value: &str) -> anyhow::Result<()> {
            Err(anyhow!("disk full"))
        }

        fn remove(&self, _key: &str) -> anyhow::Result<()> {
            Err(anyhow!("disk full"))
        }
    }

    /// Document store double whose every call fails.
    pub struct FailingDocumentStore;

    impl DocumentStore for FailingDocumentStore {
        fn get(&self, _collection: &str, _id: &str) -> anyhow::Result<Option<Document>> {
            Err(anyhow!("network down"))
        }

        fn set(&self, _collection: &str, _id: &str, _data: Value) -> anyhow::Result<()> {
            Err(anyhow!("network down"))
        }

        fn update(&self, _collection: &str, _id: &str, _patch: Value) -> anyhow::Result<()> {
            Err(anyhow!("network down"))
        }

        fn add(&self, _collection: &str, _data: Value) -> anyhow::Result<String> {
            Err(anyhow!("network down"))
        }

        fn query(&self, _query: &Query) -> anyhow::Result<Vec<Document>> {
            Err(anyhow!("network down"))
        }
    }

    pub fn online_context(user: &str) -> (SyncContext, Arc<MemoryDocumentStore>, Arc<CollectingSink>) {
        let remote = Arc::new(MemoryDocumentStore::new());
        let sink = Arc::new(CollectingSink::default());
        let context = SyncContext::new(
            Arc::new(MemoryStorage::new()),
            remote.clone(),
            sink.clone(),
        )
        .with_user(user);
        (context, remote, sink)
    }

    pub fn offline_context() -> SyncContext {
        SyncContext::new(
            Arc::new(MemoryStorage::new()),
            Arc::new(MemoryDocumentStore::new()),
            Arc::new(CollectingSink::default()),
        )
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_of(true, Some(true)), SyncStatus::Synced);
        assert_eq!(status_of(true, Some(false)), SyncStatus::SyncFailed);
        assert_eq!(status_of(false, Some(false)), SyncStatus::SyncFailed);
        assert_eq!(status_of(true, None), SyncStatus::LocalOnly);
        assert_eq!(status_of(false, None), SyncStatus::LocalOnly);
    }
}
