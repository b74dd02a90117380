//! File-backed document store: one pretty-printed JSON file per collection.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use uuid::Uuid;

use super::{DeleteOutcome, DocumentStore, StoreCapabilities, StoredDocument};
use crate::util::sanitize_token;
use crate::{Error, Result};

/// Document store persisting collections under a local directory.
#[derive(Debug, Clone)]
pub struct LocalDocumentStore {
    root: PathBuf,
}

impl LocalDocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn collection_path(&self, collection: &str) -> Result<PathBuf> {
        let name = sanitize_token(collection);
        if name.is_empty() {
            return Err(Error::validation("Collection name cannot be empty"));
        }
        // Distinct collections must never share a file.
        if name != collection {
            return Err(Error::validation(format!(
                "Collection name '{collection}' must be lowercase letters, digits and dashes"
            )));
        }
        Ok(self.root.join(format!("{name}.json")))
    }

    async fn load(&self, collection: &str) -> Result<Vec<StoredDocument>> {
        let path = self.collection_path(collection)?;
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(error) => return Err(error.into()),
        };

        serde_json::from_str(&content).map_err(|error| {
            Error::store(format!(
                "Collection file {} is not valid JSON: {error}",
                path.display()
            ))
        })
    }

    async fn persist(&self, collection: &str, documents: &[StoredDocument]) -> Result<()> {
        let path = self.collection_path(collection)?;
        tokio::fs::create_dir_all(&self.root).await?;

        let content = serde_json::to_string_pretty(documents)?;
        let staging = path.with_extension("json.tmp");
        tokio::fs::write(&staging, content).await?;
        tokio::fs::rename(&staging, &path).await?;
        Ok(())
    }
}

impl DocumentStore for LocalDocumentStore {
    fn capabilities(&self) -> StoreCapabilities {
        StoreCapabilities { point_reads: true }
    }

    async fn list(&self, collection: &str) -> Result<Vec<StoredDocument>> {
        self.load(collection).await
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<StoredDocument>> {
        let documents = self.load(collection).await?;
        Ok(documents.into_iter().find(|document| document.id == id))
    }

    async fn upsert(
        &self,
        collection: &str,
        id: Option<&str>,
        fields: Map<String, Value>,
    ) -> Result<String> {
        let mut documents = self.load(collection).await?;
        let id = id.map_or_else(|| Uuid::now_v7().to_string(), ToOwned::to_owned);

        match documents.iter().position(|document| document.id == id) {
            Some(index) => documents[index].fields = fields,
            None => documents.push(StoredDocument {
                id: id.clone(),
                fields,
            }),
        }

        self.persist(collection, &documents).await?;
        tracing::debug!(collection, id = %id, path = %self.root.display(), "Wrote local document");
        Ok(id)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<DeleteOutcome> {
        let mut documents = self.load(collection).await?;
        let before = documents.len();
        documents.retain(|document| document.id != id);
        if documents.len() == before {
            return Ok(DeleteOutcome::NotFound);
        }

        self.persist(collection, &documents).await?;
        Ok(DeleteOutcome::Deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(title: &str) -> Map<String, Value> {
        let Value::Object(map) = json!({ "title": title, "content": "body", "imageUrl": null })
        else {
            unreachable!()
        };
        map
    }

    #[tokio::test]
    async fn missing_collection_lists_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalDocumentStore::new(dir.path());
        assert!(store.list("notes").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn documents_survive_a_new_store_instance() {
        let dir = tempfile::tempdir().unwrap();
        let id = LocalDocumentStore::new(dir.path())
            .upsert("notes", None, fields("persisted"))
            .await
            .unwrap();

        let reopened = LocalDocumentStore::new(dir.path());
        let document = reopened.get("notes", &id).await.unwrap().unwrap();
        assert_eq!(document.fields["title"], "persisted");
        assert!(dir.path().join("notes.json").exists());
    }

    #[tokio::test]
    async fn update_and_delete_keep_single_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalDocumentStore::new(dir.path());
        let id = store.upsert("notes", None, fields("a")).await.unwrap();
        store.upsert("notes", Some(&id), fields("b")).await.unwrap();

        let documents = store.list("notes").await.unwrap();
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].fields["title"], "b");

        assert_eq!(store.delete("notes", &id).await.unwrap(), DeleteOutcome::Deleted);
        assert_eq!(store.delete("notes", &id).await.unwrap(), DeleteOutcome::NotFound);
    }

    #[tokio::test]
    async fn collection_names_that_would_share_a_file_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalDocumentStore::new(dir.path());
        store.upsert("notes", None, fields("kept")).await.unwrap();

        for name in ["Notes", "notes!", " notes", "my notes"] {
            let error = store.list(name).await.unwrap_err();
            assert!(matches!(error, Error::Validation(_)), "{name}: {error}");
        }
        assert!(matches!(
            store.upsert("Notes", None, fields("x")).await.unwrap_err(),
            Error::Validation(_)
        ));
        assert_eq!(store.list("notes").await.unwrap().len(), 1);
        assert!(store.list("no-tes").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn corrupt_collection_file_is_a_store_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.json"), "not json").unwrap();

        let error = LocalDocumentStore::new(dir.path())
            .list("notes")
            .await
            .unwrap_err();
        assert!(matches!(error, Error::Store(_)));
    }
}
