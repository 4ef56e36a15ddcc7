//! Object storage seam.

use async_trait::async_trait;

use crate::Result;
use crate::types::ObjectKey;

/// A serialized export ready for upload.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub key: ObjectKey,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl Artifact {
    pub fn new(key: ObjectKey, content_type: &'static str, body: Vec<u8>) -> Self {
        Self {
            key,
            content_type,
            body,
        }
    }
}

/// Durable, publicly readable storage for artifacts.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write the artifact under its key, readable by anyone.
    ///
    /// Must not overwrite: an existing object under the same key fails with
    /// [`UploadError::AlreadyExists`](crate::error::UploadError::AlreadyExists).
    async fn put(&self, artifact: &Artifact) -> Result<()>;

    /// The public URL an object under `key` is served from.
    fn public_url(&self, key: &ObjectKey) -> String;
}
