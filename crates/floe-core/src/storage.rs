//! Read-only storage backend abstraction for catalogue payloads.
//!
//! The engine fetches immutable columnar payloads by conventional name and
//! never writes, so the contract is a single read operation. Backends exist
//! for HTTP object stores (production, see [`crate::http`]) and an in-memory
//! map (tests).

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::{Error, Result};

/// Storage backend trait for catalogue payloads.
///
/// All backends (HTTP, memory) implement this trait. Payloads are immutable
/// once published, so there is no conditional-read surface: a `get` either
/// returns the full object bytes or fails.
#[async_trait]
pub trait StorageBackend: Send + Sync + 'static {
    /// Reads an entire object.
    ///
    /// Returns `Error::NotFound` if the object doesn't exist.
    async fn get(&self, path: &str) -> Result<Bytes>;
}

/// In-memory storage backend for testing.
///
/// Thread-safe via `RwLock`. Objects are seeded synchronously with
/// [`MemoryBackend::insert`] before the code under test runs.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    objects: RwLock<HashMap<String, Bytes>>,
}

impl MemoryBackend {
    /// Creates a new empty memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an object at the given path, replacing any existing payload.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned (test-only code path).
    pub fn insert(&self, path: impl Into<String>, data: impl Into<Bytes>) {
        self.objects
            .write()
            .expect("memory backend lock poisoned")
            .insert(path.into(), data.into());
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn get(&self, path: &str) -> Result<Bytes> {
        let objects = self.objects.read().map_err(|_| Error::Internal {
            message: "lock poisoned".into(),
        })?;

        objects
            .get(path)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("object not found: {path}")))
    }
}
