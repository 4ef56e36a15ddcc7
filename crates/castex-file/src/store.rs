//! Directory standing in for a bucket.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, instrument};
use url::Url;
use uuid::Uuid;

use castex_core::error::{Error, InvalidInputError, UploadError};
use castex_core::{Artifact, ObjectKey, ObjectStore, Result};

fn map_io(err: io::Error) -> Error {
    Error::Upload(UploadError::Io {
        message: err.to_string(),
    })
}

/// Writes artifacts below a root directory, one file per key.
///
/// Writes are atomic and create-only: the body goes to a temp file that is
/// then hard-linked into place, which fails if the key already exists.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
    public_base: Option<Url>,
}

impl FileStore {
    /// Create a store rooted at `root`. The directory is created on first write.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = std::path::absolute(root.as_ref()).map_err(map_io)?;
        Ok(Self {
            root,
            public_base: None,
        })
    }

    /// Serve public URLs from `base` (e.g. a static file server) instead of `file://`.
    pub fn with_public_base(mut self, base: Url) -> Result<Self> {
        if base.cannot_be_a_base() {
            return Err(InvalidInputError::Url {
                value: base.to_string(),
                reason: "must be an absolute URL".to_string(),
            }
            .into());
        }
        self.public_base = Some(base);
        Ok(self)
    }

    /// Get the root directory path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where an object lives on disk.
    pub fn path_for(&self, key: &ObjectKey) -> PathBuf {
        key.segments().fold(self.root.clone(), |path, seg| path.join(seg))
    }
}

#[async_trait]
impl ObjectStore for FileStore {
    #[instrument(skip(self, artifact), fields(key = %artifact.key))]
    async fn put(&self, artifact: &Artifact) -> Result<()> {
        let path = self.path_for(&artifact.key);
        let parent = path.parent().unwrap_or(&self.root).to_path_buf();
        fs::create_dir_all(&parent).await.map_err(map_io)?;

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("artifact");
        let temp_path = parent.join(format!(".{}.{}.tmp", file_name, Uuid::new_v4().simple()));

        fs::write(&temp_path, &artifact.body).await.map_err(map_io)?;

        let linked = fs::hard_link(&temp_path, &path).await;
        // The temp name is ours alone; a failed removal only leaves litter.
        let _ = fs::remove_file(&temp_path).await;

        match linked {
            Ok(()) => {
                debug!(path = %path.display(), bytes = artifact.body.len(), "Wrote artifact");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                Err(UploadError::AlreadyExists {
                    key: artifact.key.to_string(),
                }
                .into())
            }
            Err(e) => Err(map_io(e)),
        }
    }

    fn public_url(&self, key: &ObjectKey) -> String {
        match &self.public_base {
            Some(base) => format!("{}/{}", base.as_str().trim_end_matches('/'), key),
            None => {
                let path = self.path_for(key);
                Url::from_file_path(&path)
                    .map(String::from)
                    .unwrap_or_else(|_| path.display().to_string())
            }
        }
    }
}
