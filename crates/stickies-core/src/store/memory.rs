//! In-process store adapters with failure injection, used by tests and demos.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::{Map, Value};
use uuid::Uuid;

use super::{BlobStore, DeleteOutcome, DocumentStore, StoreCapabilities, StoredDocument};
use crate::{Error, Result};

/// Operations counted and failable on [`MemoryDocumentStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    List,
    Get,
    Upsert,
    Delete,
}

#[derive(Debug, Default)]
struct DocumentState {
    collections: HashMap<String, Vec<StoredDocument>>,
    failures: HashMap<StoreOp, String>,
    calls: HashMap<StoreOp, usize>,
}

/// Shared in-memory document store. Clones observe the same data.
#[derive(Debug, Clone)]
pub struct MemoryDocumentStore {
    state: Arc<Mutex<DocumentState>>,
    point_reads: bool,
}

impl MemoryDocumentStore {
    /// Store that answers point reads directly.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::default(),
            point_reads: true,
        }
    }

    /// Store that only supports listing, forcing scan-after-list lookups.
    #[must_use]
    pub fn without_point_reads() -> Self {
        Self {
            state: Arc::default(),
            point_reads: false,
        }
    }

    /// Make every subsequent `op` fail with `message` until cleared.
    pub fn fail_on(&self, op: StoreOp, message: impl Into<String>) {
        self.lock().failures.insert(op, message.into());
    }

    pub fn clear_failures(&self) {
        self.lock().failures.clear();
    }

    /// Number of times `op` was invoked, failed calls included.
    #[must_use]
    pub fn calls(&self, op: StoreOp) -> usize {
        self.lock().calls.get(&op).copied().unwrap_or(0)
    }

    /// Total number of calls across all operations.
    #[must_use]
    pub fn total_calls(&self) -> usize {
        self.lock().calls.values().sum()
    }

    /// Snapshot of a collection's documents.
    #[must_use]
    pub fn documents(&self, collection: &str) -> Vec<StoredDocument> {
        self.lock()
            .collections
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    fn lock(&self) -> MutexGuard<'_, DocumentState> {
        // A poisoned lock only means a test panicked mid-call; the data is still usable.
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn begin(&self, op: StoreOp) -> Result<MutexGuard<'_, DocumentState>> {
        let mut state = self.lock();
        *state.calls.entry(op).or_insert(0) += 1;
        if let Some(message) = state.failures.get(&op) {
            return Err(Error::store(message.clone()));
        }
        Ok(state)
    }
}

impl Default for MemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn capabilities(&self) -> StoreCapabilities {
        StoreCapabilities {
            point_reads: self.point_reads,
        }
    }

    async fn list(&self, collection: &str) -> Result<Vec<StoredDocument>> {
        let state = self.begin(StoreOp::List)?;
        Ok(state
            .collections
            .get(collection)
            .cloned()
            .unwrap_or_default())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<StoredDocument>> {
        if !self.point_reads {
            return Err(Error::store("point reads are not supported by this store"));
        }
        let state = self.begin(StoreOp::Get)?;
        Ok(state
            .collections
            .get(collection)
            .and_then(|documents| documents.iter().find(|document| document.id == id))
            .cloned())
    }

    async fn upsert(
        &self,
        collection: &str,
        id: Option<&str>,
        fields: Map<String, Value>,
    ) -> Result<String> {
        let mut state = self.begin(StoreOp::Upsert)?;
        let documents = state.collections.entry(collection.to_string()).or_default();

        let id = id.map_or_else(|| Uuid::now_v7().to_string(), ToOwned::to_owned);
        match documents.iter().position(|document| document.id == id) {
            Some(index) => documents[index].fields = fields,
            None => documents.push(StoredDocument {
                id: id.clone(),
                fields,
            }),
        }
        Ok(id)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<DeleteOutcome> {
        let mut state = self.begin(StoreOp::Delete)?;
        let Some(documents) = state.collections.get_mut(collection) else {
            return Ok(DeleteOutcome::NotFound);
        };
        let before = documents.len();
        documents.retain(|document| document.id != id);
        if documents.len() == before {
            Ok(DeleteOutcome::NotFound)
        } else {
            Ok(DeleteOutcome::Deleted)
        }
    }
}

#[derive(Debug, Default)]
struct BlobState {
    objects: HashMap<String, (Vec<u8>, String)>,
    failure: Option<String>,
    uploads: usize,
}

/// Shared in-memory blob store returning `{base_url}/{file_name}` URLs.
#[derive(Debug, Clone)]
pub struct MemoryBlobStore {
    base_url: String,
    state: Arc<Mutex<BlobState>>,
}

impl MemoryBlobStore {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            state: Arc::default(),
        }
    }

    /// Make every subsequent upload fail with `message` until cleared.
    pub fn fail_uploads(&self, message: impl Into<String>) {
        self.lock().failure = Some(message.into());
    }

    pub fn clear_failures(&self) {
        self.lock().failure = None;
    }

    /// Number of upload attempts, failed ones included.
    #[must_use]
    pub fn upload_count(&self) -> usize {
        self.lock().uploads
    }

    /// Stored bytes and content type for a URL previously returned by an upload.
    #[must_use]
    pub fn object(&self, url: &str) -> Option<(Vec<u8>, String)> {
        self.lock().objects.get(url).cloned()
    }

    fn lock(&self) -> MutexGuard<'_, BlobState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self::new("memory://images")
    }
}

impl BlobStore for MemoryBlobStore {
    async fn upload_blob(
        &self,
        file_name: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<String> {
        let mut state = self.lock();
        state.uploads += 1;
        if let Some(message) = &state.failure {
            return Err(Error::Storage(message.clone()));
        }

        let url = format!("{}/{}", self.base_url, file_name.trim_matches('/'));
        state
            .objects
            .insert(url.clone(), (bytes.to_vec(), content_type.to_string()));
        Ok(url)
    }
}
