//! Operation-recording storage backend for tests.

use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;

use floe_core::{MemoryBackend, Result, StorageBackend};

/// In-memory backend that records every `get` it serves.
///
/// Used to prove I/O-level contracts, e.g. that N concurrent loads of the
/// same datastore fetch each payload exactly once.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    inner: MemoryBackend,
    gets: Mutex<Vec<String>>,
}

impl RecordingBackend {
    /// Creates an empty recording backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an object at the given path.
    pub fn insert(&self, path: impl Into<String>, data: impl Into<Bytes>) {
        self.inner.insert(path, data);
    }

    /// Number of `get` calls served for a path so far.
    pub fn get_count(&self, path: &str) -> usize {
        self.gets
            .lock()
            .expect("recording lock poisoned")
            .iter()
            .filter(|p| p.as_str() == path)
            .count()
    }

    /// Every `get` path in call order.
    pub fn recorded_gets(&self) -> Vec<String> {
        self.gets.lock().expect("recording lock poisoned").clone()
    }
}

#[async_trait]
impl StorageBackend for RecordingBackend {
    async fn get(&self, path: &str) -> Result<Bytes> {
        self.gets
            .lock()
            .expect("recording lock poisoned")
            .push(path.to_string());
        self.inner.get(path).await
    }
}
