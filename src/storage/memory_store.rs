use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Result, anyhow};

use super::{Document, DocumentStore};

/// In-process document store. Clones share the same collections.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    collections: Arc<Mutex<HashMap<String, Vec<Document>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Vec<Document>>>> {
        self.collections
            .lock()
            .map_err(|_| anyhow!("Memory store lock poisoned"))
    }
}

impl DocumentStore for MemoryStore {
    async fn delete_all(&self, collection: &str) -> Result<u64> {
        let removed = self.lock()?.remove(collection).map(|d| d.len()).unwrap_or(0);
        Ok(removed as u64)
    }

    async fn insert_many(&self, collection: &str, documents: &[Document]) -> Result<u64> {
        self.lock()?
            .entry(collection.to_string())
            .or_default()
            .extend_from_slice(documents);
        Ok(documents.len() as u64)
    }

    async fn find_all(&self, collection: &str) -> Result<Vec<Document>> {
        Ok(self.lock()?.get(collection).cloned().unwrap_or_default())
    }
}
