//! Trust anchor loading.
//!
//! The CA bundle validating the upstream's TLS certificate is read once at
//! process start and held read-only for the process lifetime. It is never
//! rotated at runtime; rotating the bundle means restarting the relay.

use std::path::{Path, PathBuf};

/// The certificate authority certificates accepted for the upstream
/// connection.
#[derive(Debug)]
pub struct TrustAnchor {
    certificates: Vec<reqwest::Certificate>,
    path: PathBuf,
}

impl TrustAnchor {
    /// Number of certificates in the bundle.
    pub fn len(&self) -> usize {
        self.certificates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.certificates.is_empty()
    }

    /// Path the bundle was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn into_certificates(self) -> Vec<reqwest::Certificate> {
        self.certificates
    }
}

/// Error type for trust anchor loading.
#[derive(Debug, thiserror::Error)]
pub enum TrustAnchorError {
    #[error("failed to read trust anchor {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse trust anchor {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("trust anchor {} rejected: {source}", .path.display())]
    Invalid {
        path: PathBuf,
        #[source]
        source: reqwest::Error,
    },

    #[error("no certificates found in trust anchor {}", .0.display())]
    Empty(PathBuf),
}

/// Load a PEM certificate bundle from disk.
///
/// The bundle may hold a chain; every certificate in it becomes an accepted
/// root. A readable file containing no certificates is an error.
pub fn load_trust_anchor(path: &Path) -> Result<TrustAnchor, TrustAnchorError> {
    let pem = std::fs::read(path).map_err(|source| TrustAnchorError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let mut certificates = Vec::new();
    for cert in rustls_pemfile::certs(&mut pem.as_slice()) {
        let der = cert.map_err(|source| TrustAnchorError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        let certificate =
            reqwest::Certificate::from_der(&der).map_err(|source| TrustAnchorError::Invalid {
                path: path.to_path_buf(),
                source,
            })?;
        certificates.push(certificate);
    }

    if certificates.is_empty() {
        return Err(TrustAnchorError::Empty(path.to_path_buf()));
    }

    Ok(TrustAnchor {
        certificates,
        path: path.to_path_buf(),
    })
}
