//! Boundaries to the external document store and blob storage.
//!
//! The store is treated as an opaque collection/document API; adapters in
//! this module and in [`crate::storage`] implement it for concrete backends.

mod local;
mod memory;
mod rest;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Error, Result};

pub use local::LocalDocumentStore;
pub use memory::{MemoryBlobStore, MemoryDocumentStore, StoreOp};
pub use rest::{RestConfig, RestDocumentStore};

/// A document as reported by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub id: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

/// Outcome of a delete call against the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
}

/// What a backing store can do beyond the required operations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCapabilities {
    /// The store answers `get(collection, id)` directly. Without it, lookups
    /// by id fall back to listing the collection and scanning.
    pub point_reads: bool,
}

/// Document store operations used by the note repository.
#[allow(async_fn_in_trait)]
pub trait DocumentStore {
    /// Capabilities advertised by this store.
    fn capabilities(&self) -> StoreCapabilities;

    /// List every document in a collection, in store order.
    async fn list(&self, collection: &str) -> Result<Vec<StoredDocument>>;

    /// Read a single document. Only called when `point_reads` is advertised.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<StoredDocument>> {
        let _ = (collection, id);
        Err(Error::store("point reads are not supported by this store"))
    }

    /// Create (`id = None`) or overwrite a document; returns its id.
    async fn upsert(
        &self,
        collection: &str,
        id: Option<&str>,
        fields: Map<String, Value>,
    ) -> Result<String>;

    /// Remove a document.
    async fn delete(&self, collection: &str, id: &str) -> Result<DeleteOutcome>;
}

/// Blob storage used for note images.
#[allow(async_fn_in_trait)]
pub trait BlobStore {
    /// Upload bytes and return a durable URL referencing them.
    async fn upload_blob(&self, file_name: &str, bytes: &[u8], content_type: &str)
        -> Result<String>;
}
