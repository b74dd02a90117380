//! Note repository: the façade screens use to reach the remote store.

mod policy;

use crate::models::{Note, PickedImage};
use crate::store::{BlobStore, DeleteOutcome, DocumentStore, StoreCapabilities};
use crate::{Error, Result};

pub use policy::CallPolicy;

/// Collection notes are stored in unless configured otherwise.
pub const DEFAULT_COLLECTION: &str = "notes";

/// Note operations available to screens.
#[allow(async_fn_in_trait)]
pub trait NoteRepository {
    /// All notes, in store order.
    async fn list(&self) -> Result<Vec<Note>>;

    /// A single note by id, `None` when absent.
    async fn get_by_id(&self, id: &str) -> Result<Option<Note>>;

    /// Create (empty id) or overwrite a note; returns it with its durable id.
    async fn save(&self, note: &Note) -> Result<Note>;

    /// Remove a note. A missing id is a store failure.
    async fn delete(&self, id: &str) -> Result<()>;

    /// Upload image bytes and return the URL to store on the note.
    async fn upload_image(&self, image: &PickedImage) -> Result<String>;
}

/// Repository backed by a [`DocumentStore`] and a [`BlobStore`].
///
/// Holds no state besides its configuration; each screen may build its own.
#[derive(Debug, Clone)]
pub struct RemoteNoteRepository<S, B> {
    store: S,
    blobs: B,
    collection: String,
    policy: CallPolicy,
}

impl<S: DocumentStore, B: BlobStore> RemoteNoteRepository<S, B> {
    pub fn new(store: S, blobs: B) -> Self {
        Self {
            store,
            blobs,
            collection: DEFAULT_COLLECTION.to_string(),
            policy: CallPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    #[must_use]
    pub const fn with_policy(mut self, policy: CallPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub const fn policy(&self) -> CallPolicy {
        self.policy
    }

    pub fn capabilities(&self) -> StoreCapabilities {
        self.store.capabilities()
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    pub const fn blobs(&self) -> &B {
        &self.blobs
    }

    async fn scan_for(&self, id: &str) -> Result<Option<Note>> {
        let notes = self.list().await?;
        Ok(notes.into_iter().find(|note| note.id == id))
    }
}

fn require_id(id: &str) -> Result<&str> {
    let id = id.trim();
    if id.is_empty() {
        return Err(Error::validation("Note id cannot be empty"));
    }
    Ok(id)
}

impl<S: DocumentStore, B: BlobStore> NoteRepository for RemoteNoteRepository<S, B> {
    async fn list(&self) -> Result<Vec<Note>> {
        let documents = self
            .policy
            .run("list", || self.store.list(&self.collection))
            .await?;

        let notes = documents
            .into_iter()
            .map(|document| Note::from_document(document.id, document.fields))
            .collect::<Result<Vec<_>>>()?;
        tracing::debug!(collection = %self.collection, count = notes.len(), "Listed notes");
        Ok(notes)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Note>> {
        let id = require_id(id)?;
        if !self.store.capabilities().point_reads {
            tracing::debug!(id, "Store has no point reads, scanning list");
            return self.scan_for(id).await;
        }

        let document = self
            .policy
            .run("get", || self.store.get(&self.collection, id))
            .await?;
        document
            .map(|document| Note::from_document(document.id, document.fields))
            .transpose()
    }

    async fn save(&self, note: &Note) -> Result<Note> {
        let fields = note.to_fields()?;
        let existing_id = if note.is_unsaved() {
            None
        } else {
            Some(note.id.trim())
        };

        // A create that timed out may still have committed; only overwrites repeat.
        let policy = if existing_id.is_some() {
            self.policy
        } else {
            CallPolicy::SINGLE_ATTEMPT
        };
        let id = policy
            .run("save", || {
                self.store
                    .upsert(&self.collection, existing_id, fields.clone())
            })
            .await?;
        if id.trim().is_empty() {
            return Err(Error::store("Store assigned an empty note id"));
        }

        tracing::info!(
            collection = %self.collection,
            id = %id,
            created = existing_id.is_none(),
            has_image = note.image_url.is_some(),
            "Saved note"
        );
        Ok(Note {
            id,
            ..note.clone()
        })
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let id = require_id(id)?;
        let outcome = self
            .policy
            .run("delete", || self.store.delete(&self.collection, id))
            .await?;

        match outcome {
            DeleteOutcome::Deleted => {
                tracing::info!(collection = %self.collection, id, "Deleted note");
                Ok(())
            }
            DeleteOutcome::NotFound => Err(Error::store(format!(
                "Failed to delete note {id}: no such note"
            ))),
        }
    }

    async fn upload_image(&self, image: &PickedImage) -> Result<String> {
        let url = self
            .policy
            .run("upload_image", || {
                self.blobs
                    .upload_blob(&image.file_name, &image.bytes, &image.content_type)
            })
            .await?;
        tracing::info!(file = %image.file_name, bytes = image.len(), url = %url, "Uploaded image");
        Ok(url)
    }
}
