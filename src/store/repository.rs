//! On-disk storage for staged files.
//!
//! # Responsibilities
//! - Stream uploads to disk while computing their SHA-256 digest
//! - Verify declared length and digest before a file becomes visible as staged
//! - Serve, remove, and list staged files
//! - Report utilization of the volume holding the staging directory
//!
//! Uploads create the target exclusively, so two concurrent uploads of the
//! same id cannot interleave: one stages the file, the other gets
//! [`StoreError::AlreadyExists`]. A failed upload never leaves a partial
//! file behind.

use std::io;
use std::path::{Path, PathBuf};

use axum::body::Bytes;
use futures_util::{Stream, StreamExt};
use serde::Serialize;
use sha2::{Digest, Sha256};
use sysinfo::Disks;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};

use crate::store::id::FileId;

const WRITE_BUFFER_SIZE: usize = 64 * 1024;

/// Failure modes of staging operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("file {0} is already staged")]
    AlreadyExists(FileId),

    #[error("file {0} is not staged")]
    NotFound(FileId),

    #[error("permission denied for file {0}")]
    PermissionDenied(FileId),

    #[error("out of space in the staging directory")]
    OutOfSpace,

    #[error("expected {expected} bytes but received {received} bytes")]
    SizeMismatch { expected: u64, received: u64 },

    #[error("mismatched digest: expected {expected}, got {computed}")]
    DigestMismatch { expected: FileId, computed: FileId },

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// One staged file, as reported by [`FileStore::inventory`].
#[derive(Debug, Clone, Serialize)]
pub struct StagedFile {
    pub id: String,
    pub size_bytes: u64,
}

/// Utilization of the volume holding the staging directory.
#[derive(Debug, Clone, Serialize)]
pub struct DiskUtilization {
    pub total_bytes: u64,
    pub available_bytes: u64,
    pub used_percent: f64,
}

/// Repository of staged files, rooted at the staging directory.
#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, id: &FileId) -> PathBuf {
        self.root.join(id.as_str())
    }

    /// Stream an upload to disk, verifying length and digest.
    ///
    /// The file only counts as staged if every byte arrived and the content
    /// hashes to `id`; on any failure the partial file is removed.
    pub async fn stage<S>(
        &self,
        id: &FileId,
        declared_len: u64,
        stream: S,
    ) -> Result<(), StoreError>
    where
        S: Stream<Item = Result<Bytes, io::Error>> + Unpin,
    {
        let path = self.path_for(id);
        let file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                return Err(StoreError::AlreadyExists(id.clone()));
            }
            Err(err) if err.kind() == io::ErrorKind::PermissionDenied => {
                return Err(StoreError::PermissionDenied(id.clone()));
            }
            Err(err) => return Err(StoreError::Io(err)),
        };

        let outcome = write_verified(id, declared_len, stream, file).await;
        if outcome.is_err() {
            if let Err(err) = fs::remove_file(&path).await {
                tracing::warn!(
                    file_id = %id,
                    error = %err,
                    "failed to remove partial upload"
                );
            }
        }
        outcome
    }

    /// Open a staged file for reading, returning its length alongside.
    pub async fn open(&self, id: &FileId) -> Result<(File, u64), StoreError> {
        let path = self.path_for(id);
        match File::open(&path).await {
            Ok(file) => {
                let len = file.metadata().await?.len();
                Ok((file, len))
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(id.clone()))
            }
            Err(err) => Err(StoreError::Io(err)),
        }
    }

    /// Remove a staged file.
    pub async fn remove(&self, id: &FileId) -> Result<(), StoreError> {
        match fs::remove_file(self.path_for(id)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(id.clone()))
            }
            Err(err) if err.kind() == io::ErrorKind::PermissionDenied => {
                Err(StoreError::PermissionDenied(id.clone()))
            }
            Err(err) => Err(StoreError::Io(err)),
        }
    }

    /// List staged files, sorted by id. Entries whose name is not a digest
    /// are not ours and are skipped.
    pub async fn inventory(&self) -> Result<Vec<StagedFile>, StoreError> {
        let mut entries = fs::read_dir(&self.root).await?;
        let mut files = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if FileId::parse(name).is_err() {
                continue;
            }
            let metadata = entry.metadata().await?;
            if metadata.is_file() {
                files.push(StagedFile {
                    id: name.to_string(),
                    size_bytes: metadata.len(),
                });
            }
        }

        files.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(files)
    }

    /// Utilization of the volume holding the staging directory, if it can
    /// be determined.
    pub fn disk_utilization(&self) -> Option<DiskUtilization> {
        let root = self.root.canonicalize().ok()?;
        let disks = Disks::new_with_refreshed_list();
        let disk = disks
            .list()
            .iter()
            .filter(|disk| root.starts_with(disk.mount_point()))
            .max_by_key(|disk| disk.mount_point().as_os_str().len())?;

        let total_bytes = disk.total_space();
        if total_bytes == 0 {
            return None;
        }
        let available_bytes = disk.available_space();
        Some(DiskUtilization {
            total_bytes,
            available_bytes,
            used_percent: (total_bytes - available_bytes) as f64 / total_bytes as f64 * 100.0,
        })
    }
}

async fn write_verified<S>(
    id: &FileId,
    declared_len: u64,
    mut stream: S,
    file: File,
) -> Result<(), StoreError>
where
    S: Stream<Item = Result<Bytes, io::Error>> + Unpin,
{
    let mut writer = BufWriter::with_capacity(WRITE_BUFFER_SIZE, file);
    let mut hasher = Sha256::new();
    let mut received: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        received += chunk.len() as u64;
        if received > declared_len {
            return Err(StoreError::SizeMismatch {
                expected: declared_len,
                received,
            });
        }
        hasher.update(&chunk);
        writer.write_all(&chunk).await.map_err(map_write_error)?;
    }
    writer.flush().await.map_err(map_write_error)?;

    if received != declared_len {
        return Err(StoreError::SizeMismatch {
            expected: declared_len,
            received,
        });
    }

    let computed = FileId::from_digest(&hasher.finalize().into());
    if &computed != id {
        return Err(StoreError::DigestMismatch {
            expected: id.clone(),
            computed,
        });
    }

    Ok(())
}

fn map_write_error(err: io::Error) -> StoreError {
    if err.kind() == io::ErrorKind::StorageFull {
        StoreError::OutOfSpace
    } else {
        StoreError::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use futures_util::stream;
    use tokio::io::AsyncReadExt;

    use super::*;

    fn digest_of(data: &[u8]) -> FileId {
        FileId::from_digest(&Sha256::digest(data).into())
    }

    fn chunks(data: &[u8], chunk_size: usize) -> impl Stream<Item = Result<Bytes, io::Error>> + Unpin {
        let chunks: Vec<_> = data
            .chunks(chunk_size.max(1))
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();
        stream::iter(chunks)
    }

    #[tokio::test]
    async fn stage_open_remove_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf());
        let data = b"tarball contents".as_slice();
        let id = digest_of(data);

        store.stage(&id, data.len() as u64, chunks(data, 4)).await.unwrap();

        let (mut file, len) = store.open(&id).await.unwrap();
        assert_eq!(len, data.len() as u64);
        let mut read_back = Vec::new();
        file.read_to_end(&mut read_back).await.unwrap();
        assert_eq!(read_back, data);

        store.remove(&id).await.unwrap();
        assert!(matches!(
            store.open(&id).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn rejects_duplicate_stage() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf());
        let data = b"once".as_slice();
        let id = digest_of(data);

        store.stage(&id, data.len() as u64, chunks(data, 2)).await.unwrap();
        let err = store
            .stage(&id, data.len() as u64, chunks(data, 2))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn digest_mismatch_removes_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf());
        let data = b"actual body".as_slice();
        let id = digest_of(b"some other body");

        let err = store
            .stage(&id, data.len() as u64, chunks(data, 3))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DigestMismatch { .. }));
        assert!(store.inventory().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn short_body_is_a_size_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf());
        let data = b"short".as_slice();
        let id = digest_of(data);

        let err = store
            .stage(&id, data.len() as u64 + 10, chunks(data, 2))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::SizeMismatch {
                expected: 15,
                received: 5
            }
        ));
        assert!(store.inventory().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn inventory_lists_staged_files_only() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf());
        std::fs::write(dir.path().join("not-a-digest.txt"), b"noise").unwrap();

        let data = b"inventoried".as_slice();
        let id = digest_of(data);
        store.stage(&id, data.len() as u64, chunks(data, 8)).await.unwrap();

        let files = store.inventory().await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].id, id.as_str());
        assert_eq!(files[0].size_bytes, data.len() as u64);
    }

    #[tokio::test]
    async fn reports_disk_utilization() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf());

        if let Some(disk) = store.disk_utilization() {
            assert!(disk.total_bytes > 0);
            assert!(disk.available_bytes <= disk.total_bytes);
            assert!((0.0..=100.0).contains(&disk.used_percent));
        }
    }
}
