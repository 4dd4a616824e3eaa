//! Staged-file repository.

pub mod id;
pub mod repository;

pub use id::{FileId, InvalidFileId};
pub use repository::{DiskUtilization, FileStore, StagedFile, StoreError};
