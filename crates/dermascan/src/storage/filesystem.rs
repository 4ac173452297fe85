use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use reqwest::Url;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;

use super::{ObjectStore, UploadSnapshot};
use crate::config::StorageConfig;
use crate::error::StorageError;

/// Object store backed by a local directory and served from a public base
/// URL (a static file server, a bucket mount, ...).
pub struct FilesystemObjectStore {
    root: PathBuf,
    public_base_url: Url,
    chunk_size: usize,
}

impl FilesystemObjectStore {
    pub fn new<P: AsRef<Path>>(
        root: P,
        public_base_url: &str,
        chunk_size: usize,
    ) -> Result<Self, StorageError> {
        // `Url::join` replaces the last segment unless the base ends in '/'
        let normalized = if public_base_url.ends_with('/') {
            public_base_url.to_string()
        } else {
            format!("{}/", public_base_url)
        };
        let public_base_url =
            Url::parse(&normalized).map_err(|e| StorageError::InvalidBaseUrl {
                url: public_base_url.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            root: root.as_ref().to_path_buf(),
            public_base_url,
            chunk_size: chunk_size.max(1),
        })
    }

    pub fn from_config(config: &StorageConfig) -> Result<Self, StorageError> {
        Self::new(&config.root, &config.public_base_url, config.chunk_size)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps an object path onto the root, refusing anything that could
    /// escape it.
    fn resolve(&self, object_path: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(object_path);
        if object_path.is_empty()
            || !relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)))
        {
            return Err(StorageError::InvalidPath(object_path.to_string()));
        }
        Ok(self.root.join(relative))
    }

    async fn write_chunks(
        &self,
        file_path: &Path,
        bytes: &[u8],
        progress: &mpsc::UnboundedSender<UploadSnapshot>,
    ) -> Result<(), StorageError> {
        let write_err = |source| StorageError::WriteObject {
            path: file_path.to_path_buf(),
            source,
        };

        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(file_path)
            .await
            .map_err(write_err)?;

        let total_bytes = bytes.len() as u64;
        let mut written = 0u64;
        // a receiver that went away only means nobody is watching
        let _ = progress.send(UploadSnapshot {
            bytes_transferred: 0,
            total_bytes,
        });

        for chunk in bytes.chunks(self.chunk_size) {
            file.write_all(chunk).await.map_err(write_err)?;
            written += chunk.len() as u64;
            let _ = progress.send(UploadSnapshot {
                bytes_transferred: written,
                total_bytes,
            });
        }

        file.flush().await.map_err(write_err)?;
        file.sync_all().await.map_err(write_err)?;
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for FilesystemObjectStore {
    async fn put(
        &self,
        path: &str,
        bytes: &[u8],
        progress: mpsc::UnboundedSender<UploadSnapshot>,
    ) -> Result<(), StorageError> {
        let file_path = self.resolve(path)?;

        if let Some(parent) = file_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::CreateDirectory {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }

        if let Err(e) = self.write_chunks(&file_path, bytes, &progress).await {
            // never leave a partial object behind
            if !matches!(&e, StorageError::WriteObject { source, .. }
                if source.kind() == std::io::ErrorKind::AlreadyExists)
            {
                let _ = tokio::fs::remove_file(&file_path).await;
            }
            return Err(e);
        }

        tracing::debug!(path, bytes = bytes.len(), "Object stored");
        Ok(())
    }

    async fn download_url(&self, path: &str) -> Result<String, StorageError> {
        let file_path = self.resolve(path)?;
        let exists = tokio::fs::try_exists(&file_path).await.unwrap_or(false);
        if !exists {
            return Err(StorageError::NotFound(path.to_string()));
        }

        self.public_base_url
            .join(path)
            .map(|u| u.to_string())
            .map_err(|e| StorageError::InvalidPath(format!("{}: {}", path, e)))
    }
}
