//! In-memory backend for tests and ephemeral deployments.
//!
//! The backend is [`Clone`] so tests can hold a handle for direct inspection while the service
//! owns a boxed copy.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;

use super::{Backend, BackendResult, PayloadKey};

type Store = HashMap<PayloadKey, Bytes>;

#[derive(Debug, Clone, Default)]
pub(crate) struct InMemoryBackend {
    store: Arc<Mutex<Store>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn store(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the number of stored payloads.
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.store().len()
    }

    /// Returns `true` if the backend has no stored payloads.
    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.store().is_empty()
    }
}

#[async_trait::async_trait]
impl Backend for InMemoryBackend {
    fn name(&self) -> &'static str {
        "in-memory"
    }

    async fn put_payload(&self, key: &PayloadKey, payload: Bytes) -> BackendResult<()> {
        self.store().insert(key.clone(), payload);
        Ok(())
    }

    async fn get_payload(&self, key: &PayloadKey) -> BackendResult<Option<Bytes>> {
        Ok(self.store().get(key).cloned())
    }

    async fn delete_payload(&self, key: &PayloadKey) -> BackendResult<()> {
        self.store().remove(key);
        Ok(())
    }
}
