//! Directory-backed image storage returning `file://` URLs.

use std::path::{Path, PathBuf};

use chrono::Utc;
use uuid::Uuid;

use crate::store::BlobStore;
use crate::util::sanitize_file_name;
use crate::Result;

/// Blob store writing uploads into a local directory.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, file_name: &str) -> PathBuf {
        let ts = Utc::now().timestamp_millis();
        let id = Uuid::now_v7();
        self.root
            .join(format!("{ts}-{id}-{}", sanitize_file_name(file_name)))
    }
}

impl BlobStore for LocalBlobStore {
    async fn upload_blob(
        &self,
        file_name: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<String> {
        tokio::fs::create_dir_all(&self.root).await?;
        let path = self.object_path(file_name);
        tokio::fs::write(&path, bytes).await?;

        let path = tokio::fs::canonicalize(&path).await?;
        tracing::debug!(path = %path.display(), content_type, "Stored image locally");
        Ok(format!("file://{}", path.display()))
    }
}
