//! Note model

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// A note in the system.
///
/// An empty `id` marks a note that has not been saved yet; the store assigns
/// the durable id on first save.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Store-assigned identifier, empty while unsaved
    #[serde(default)]
    pub id: String,
    /// Note title
    pub title: String,
    /// Note body
    pub content: String,
    /// Public URL of the attached image, if any
    #[serde(rename = "imageUrl", default)]
    pub image_url: Option<String>,
}

/// The document fields persisted for a note. The id is the document key and
/// never part of the fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct NoteFields {
    title: String,
    content: String,
    #[serde(rename = "imageUrl", default)]
    image_url: Option<String>,
}

impl Note {
    /// Create an unsaved note.
    #[must_use]
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            title: title.into(),
            content: content.into(),
            image_url: None,
        }
    }

    /// Attach an image URL.
    #[must_use]
    pub fn with_image_url(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }

    /// Whether the store has assigned an id to this note yet.
    #[must_use]
    pub fn is_unsaved(&self) -> bool {
        self.id.trim().is_empty()
    }

    /// Check both required fields are present (whitespace-only counts as empty).
    pub fn validate(&self) -> Result<()> {
        validate_required(&self.title, &self.content)
    }

    /// Build a note from a stored document.
    pub fn from_document(id: impl Into<String>, fields: Map<String, Value>) -> Result<Self> {
        let fields: NoteFields = serde_json::from_value(Value::Object(fields))?;
        Ok(Self {
            id: id.into(),
            title: fields.title,
            content: fields.content,
            image_url: fields.image_url,
        })
    }

    /// Document fields to persist for this note.
    pub fn to_fields(&self) -> Result<Map<String, Value>> {
        let fields = NoteFields {
            title: self.title.clone(),
            content: self.content.clone(),
            image_url: self.image_url.clone(),
        };
        match serde_json::to_value(fields)? {
            Value::Object(map) => Ok(map),
            other => Err(Error::store(format!(
                "note fields serialized to a non-object value: {other}"
            ))),
        }
    }
}

/// Reject a title/content pair where either side is blank.
pub fn validate_required(title: &str, content: &str) -> Result<()> {
    if title.trim().is_empty() || content.trim().is_empty() {
        return Err(Error::validation("Title and content cannot be empty"));
    }
    Ok(())
}
