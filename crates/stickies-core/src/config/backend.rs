//! Stores selected at runtime from [`AppConfig`].

use serde_json::{Map, Value};

use super::{AppConfig, BlobBackend, StoreBackend};
use crate::repository::RemoteNoteRepository;
use crate::storage::{LocalBlobStore, R2BlobStore};
use crate::store::{
    BlobStore, DeleteOutcome, DocumentStore, LocalDocumentStore, RestDocumentStore,
    StoreCapabilities, StoredDocument,
};
use crate::Result;

/// Repository over whichever backends the configuration selected.
pub type ConfiguredRepository = RemoteNoteRepository<ConfiguredDocumentStore, ConfiguredBlobStore>;

#[derive(Debug, Clone)]
pub enum ConfiguredDocumentStore {
    Rest(RestDocumentStore),
    Local(LocalDocumentStore),
}

#[derive(Debug, Clone)]
pub enum ConfiguredBlobStore {
    R2(R2BlobStore),
    Local(LocalBlobStore),
}

impl AppConfig {
    /// Build the note repository described by this configuration.
    pub fn build_repository(&self) -> Result<ConfiguredRepository> {
        let store = match &self.store {
            StoreBackend::Rest(config) => {
                ConfiguredDocumentStore::Rest(RestDocumentStore::new(config.clone())?)
            }
            StoreBackend::Local(dir) => {
                ConfiguredDocumentStore::Local(LocalDocumentStore::new(dir.clone()))
            }
        };
        let blobs = match &self.blobs {
            BlobBackend::R2(config) => ConfiguredBlobStore::R2(R2BlobStore::new(config.clone())),
            BlobBackend::Local(dir) => ConfiguredBlobStore::Local(LocalBlobStore::new(dir.clone())),
        };

        tracing::debug!(
            remote = self.is_remote(),
            collection = %self.collection,
            max_attempts = self.policy.max_attempts(),
            "Built note repository"
        );
        Ok(RemoteNoteRepository::new(store, blobs)
            .with_collection(self.collection.clone())
            .with_policy(self.policy))
    }
}

impl DocumentStore for ConfiguredDocumentStore {
    fn capabilities(&self) -> StoreCapabilities {
        match self {
            Self::Rest(store) => store.capabilities(),
            Self::Local(store) => store.capabilities(),
        }
    }

    async fn list(&self, collection: &str) -> Result<Vec<StoredDocument>> {
        match self {
            Self::Rest(store) => store.list(collection).await,
            Self::Local(store) => store.list(collection).await,
        }
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<StoredDocument>> {
        match self {
            Self::Rest(store) => store.get(collection, id).await,
            Self::Local(store) => store.get(collection, id).await,
        }
    }

    async fn upsert(
        &self,
        collection: &str,
        id: Option<&str>,
        fields: Map<String, Value>,
    ) -> Result<String> {
        match self {
            Self::Rest(store) => store.upsert(collection, id, fields).await,
            Self::Local(store) => store.upsert(collection, id, fields).await,
        }
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<DeleteOutcome> {
        match self {
            Self::Rest(store) => store.delete(collection, id).await,
            Self::Local(store) => store.delete(collection, id).await,
        }
    }
}

impl BlobStore for ConfiguredBlobStore {
    async fn upload_blob(
        &self,
        file_name: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<String> {
        match self {
            Self::R2(blobs) => blobs.upload_blob(file_name, bytes, content_type).await,
            Self::Local(blobs) => blobs.upload_blob(file_name, bytes, content_type).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::models::{Note, PickedImage};
    use crate::repository::NoteRepository;

    #[tokio::test]
    async fn local_configuration_round_trips_notes_and_images() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().to_string_lossy().to_string();
        let config = AppConfig::from_lookup(|name| {
            (name == "STICKIES_DATA_DIR").then(|| data_dir.clone())
        })
        .unwrap();
        let repository = config.build_repository().unwrap();
        assert!(repository.capabilities().point_reads);

        let image = PickedImage::new("cat.png", None, vec![1, 2, 3]).unwrap();
        let url = repository.upload_image(&image).await.unwrap();
        assert!(url.starts_with("file://"));

        let saved = repository
            .save(&Note::new("Cat", "photo").with_image_url(url.clone()))
            .await
            .unwrap();
        let loaded = repository.get_by_id(&saved.id).await.unwrap().unwrap();
        assert_eq!(loaded.image_url, Some(url));
        assert!(dir.path().join("notes.json").exists());
    }
}
