//! Locally picked image model

use std::fmt;
use std::path::Path;

use crate::error::{Error, Result};

/// An image chosen in the note form that has not been uploaded yet.
#[derive(Clone, PartialEq, Eq)]
pub struct PickedImage {
    /// Original file name, used to derive the object key.
    pub file_name: String,
    /// Content MIME type.
    pub content_type: String,
    /// Raw image bytes.
    pub bytes: Vec<u8>,
}

impl PickedImage {
    /// Create a picked image from in-memory bytes.
    ///
    /// A blank `content_type` is replaced by a guess from the file extension.
    pub fn new(
        file_name: impl Into<String>,
        content_type: Option<&str>,
        bytes: Vec<u8>,
    ) -> Result<Self> {
        let file_name = file_name.into().trim().to_string();
        if file_name.is_empty() {
            return Err(Error::validation("Image file name cannot be empty"));
        }
        if bytes.is_empty() {
            return Err(Error::validation(format!("Image '{file_name}' is empty")));
        }

        let content_type = infer_content_type(content_type, &file_name);
        Ok(Self {
            file_name,
            content_type,
            bytes,
        })
    }

    /// Read a picked image from disk.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                Error::validation(format!("Image path has no file name: {}", path.display()))
            })?
            .to_string();
        let bytes = tokio::fs::read(path).await?;
        Self::new(file_name, None, bytes)
    }

    /// Size of the image payload in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for PickedImage {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("PickedImage")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

fn infer_content_type(content_type: Option<&str>, file_name: &str) -> String {
    content_type
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map_or_else(
            || {
                mime_guess::from_path(file_name)
                    .first_or_octet_stream()
                    .essence_str()
                    .to_string()
            },
            ToOwned::to_owned,
        )
}
