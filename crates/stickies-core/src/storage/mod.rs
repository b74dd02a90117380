//! Blob storage backends for note images.

mod local;
mod r2;

pub use local::LocalBlobStore;
pub use r2::{R2BlobStore, R2Config};
