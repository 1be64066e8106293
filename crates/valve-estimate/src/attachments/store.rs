use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

/// Blob storage keyed by relative, `/`-separated keys.
pub trait AttachmentStore: Send + Sync {
    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError>;
    fn get(&self, key: &str) -> Result<Vec<u8>, StoreError>;
    fn delete(&self, key: &str) -> Result<(), StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("blob {0} not found")]
    NotFound(String),
    #[error("storage key {0} escapes the attachment root")]
    InvalidKey(String),
    #[error("attachment storage failure: {0}")]
    Io(#[from] std::io::Error),
}

/// Stores blobs as plain files below a root directory.
#[derive(Debug, Clone)]
pub struct DiskAttachmentStore {
    root: PathBuf,
}

impl DiskAttachmentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, key: &str) -> Result<PathBuf, StoreError> {
        let relative = Path::new(key);
        let plain = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
        if key.is_empty() || !plain {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

impl AttachmentStore for DiskAttachmentStore {
    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, bytes)?;
        debug!(path = %path.display(), size = bytes.len(), "attachment blob written");
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        let path = self.resolve(key)?;
        fs::read(&path).map_err(|err| match err.kind() {
            ErrorKind::NotFound => StoreError::NotFound(key.to_string()),
            _ => StoreError::Io(err),
        })
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        let path = self.resolve(key)?;
        fs::remove_file(&path).map_err(|err| match err.kind() {
            ErrorKind::NotFound => StoreError::NotFound(key.to_string()),
            _ => StoreError::Io(err),
        })?;

        // Drop the per-estimate directory once it is empty.
        if let Some(parent) = path.parent().filter(|parent| *parent != self.root) {
            let empty = fs::read_dir(parent)
                .map(|mut entries| entries.next().is_none())
                .unwrap_or(false);
            if empty {
                let _ = fs::remove_dir(parent);
            }
        }
        Ok(())
    }
}
