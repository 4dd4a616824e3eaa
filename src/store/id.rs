//! Staged-file identifiers.

use std::fmt;

/// Identifier of a staged file: the lowercase hex SHA-256 digest of its
/// content. Doubles as the on-disk file name, so the format check below is
/// also what keeps request paths from escaping the staging directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileId(String);

/// Error for strings that are not a SHA-256 digest.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("file id must be 64 lowercase hex characters")]
pub struct InvalidFileId;

impl FileId {
    /// Accept exactly 64 lowercase hex characters.
    pub fn parse(s: &str) -> Result<Self, InvalidFileId> {
        if s.len() == 64 && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            Ok(Self(s.to_string()))
        } else {
            Err(InvalidFileId)
        }
    }

    /// Hex-encode a raw SHA-256 digest.
    pub fn from_digest(digest: &[u8; 32]) -> Self {
        let mut s = String::with_capacity(64);
        for byte in digest {
            s.push_str(&format!("{byte:02x}"));
        }
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
