//! Snapshot store capability: keyed, dated, write-once blob persistence.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use thiserror::Error;

/// Errors surfaced by a snapshot store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The key is already archived. Expected on a duplicate capture; the
    /// store refuses rather than overwrite.
    #[error("blob already exists: {0}")]
    AlreadyExists(String),

    /// The key has never been written. Common for prior-period reads when
    /// the service has not been running that far back.
    #[error("blob not found: {0}")]
    NotFound(String),

    /// Timeout, connection reset, 5xx from the storage service.
    #[error("storage transport failure: {0}")]
    Transport(String),
}

/// Keyed write-once text blob storage.
///
/// One store handle maps to one namespace; snapshots and status blobs use
/// separate handles.
#[async_trait::async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Write text under a key. Fails with `AlreadyExists` if the key is
    /// taken; archived blobs are never overwritten.
    async fn write(&self, key: &str, text: &str) -> Result<(), StoreError>;

    /// Read the text stored under a key.
    async fn read(&self, key: &str) -> Result<String, StoreError>;
}

/// In-memory snapshot store for development and tests.
///
/// Enforces the same write-once semantics as the real store and supports
/// transient-failure injection.
#[derive(Debug, Default)]
pub struct InMemorySnapshotStore {
    blobs: Mutex<HashMap<String, String>>,
    /// Number of upcoming write calls to fail with a transport error.
    fail_writes: AtomicU32,
    /// Number of upcoming read calls to fail with a transport error.
    fail_reads: AtomicU32,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a blob, bypassing write-once accounting (test setup).
    pub fn preload(&self, key: impl Into<String>, text: impl Into<String>) {
        self.blobs
            .lock()
            .expect("store mutex poisoned")
            .insert(key.into(), text.into());
    }

    /// Make the next `n` write calls fail with a transport error.
    pub fn fail_next_writes(&self, n: u32) {
        self.fail_writes.store(n, Ordering::SeqCst);
    }

    /// Make the next `n` read calls fail with a transport error.
    pub fn fail_next_reads(&self, n: u32) {
        self.fail_reads.store(n, Ordering::SeqCst);
    }

    /// Current content under a key, if any.
    pub fn get(&self, key: &str) -> Option<String> {
        self.blobs
            .lock()
            .expect("store mutex poisoned")
            .get(key)
            .cloned()
    }

    /// Number of stored blobs.
    pub fn len(&self) -> usize {
        self.blobs.lock().expect("store mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn take_failure(counter: &AtomicU32) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait::async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn write(&self, key: &str, text: &str) -> Result<(), StoreError> {
        if Self::take_failure(&self.fail_writes) {
            return Err(StoreError::Transport("injected write failure".to_string()));
        }

        let mut blobs = self.blobs.lock().expect("store mutex poisoned");
        if blobs.contains_key(key) {
            return Err(StoreError::AlreadyExists(key.to_string()));
        }
        blobs.insert(key.to_string(), text.to_string());
        Ok(())
    }

    async fn read(&self, key: &str) -> Result<String, StoreError> {
        if Self::take_failure(&self.fail_reads) {
            return Err(StoreError::Transport("injected read failure".to_string()));
        }

        self.blobs
            .lock()
            .expect("store mutex poisoned")
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_then_read() {
        let store = InMemorySnapshotStore::new();
        store.write("visitors20260825", "(\"1.1.1.1\", 24)").await.unwrap();
        let text = store.read("visitors20260825").await.unwrap();
        assert_eq!(text, "(\"1.1.1.1\", 24)");
    }

    #[tokio::test]
    async fn test_second_write_refused_and_content_unchanged() {
        let store = InMemorySnapshotStore::new();
        store.write("visitors20260825", "first").await.unwrap();

        let err = store.write("visitors20260825", "second").await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(key) if key == "visitors20260825"));
        assert_eq!(store.get("visitors20260825").unwrap(), "first");
    }

    #[tokio::test]
    async fn test_read_missing_key_is_not_found() {
        let store = InMemorySnapshotStore::new();
        let err = store.read("visitors19990101").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_injected_write_failures_are_transient_and_bounded() {
        let store = InMemorySnapshotStore::new();
        store.fail_next_writes(2);

        for _ in 0..2 {
            let err = store.write("k", "v").await.unwrap_err();
            assert!(matches!(err, StoreError::Transport(_)));
        }
        store.write("k", "v").await.unwrap();
        assert_eq!(store.get("k").unwrap(), "v");
    }

    #[tokio::test]
    async fn test_injected_read_failure() {
        let store = InMemorySnapshotStore::new();
        store.preload("k", "v");
        store.fail_next_reads(1);

        assert!(matches!(
            store.read("k").await.unwrap_err(),
            StoreError::Transport(_)
        ));
        assert_eq!(store.read("k").await.unwrap(), "v");
    }
}
