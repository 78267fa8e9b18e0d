//! Content addressing for artifacts.
//!
//! Every artifact (software jar, plugin jar, installed file) is identified by
//! the full lowercase-hex SHA-256 of its bytes. The short form is only ever
//! produced for display.

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::consts::SHORT_HASH_LEN;

/// A full 64-character SHA-256 checksum.
///
/// # Format
///
/// The hash is a lowercase hexadecimal string, e.g. `"9f86d081884c7d65..."`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Checksum(pub String);

impl Checksum {
  /// The first 8 hex characters, for plan previews and log lines.
  pub fn short(&self) -> &str {
    let len = self.0.len().min(SHORT_HASH_LEN);
    &self.0[..len]
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl std::fmt::Display for Checksum {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// Error while hashing a file on disk.
#[derive(Debug, thiserror::Error)]
pub enum HashError {
  #[error("failed to read file {path}: {source}")]
  ReadFile {
    path: String,
    #[source]
    source: io::Error,
  },
}

impl HashError {
  /// True when the file simply does not exist.
  pub fn is_not_found(&self) -> bool {
    match self {
      HashError::ReadFile { source, .. } => source.kind() == io::ErrorKind::NotFound,
    }
  }
}

/// Hash a file's contents without loading it into memory at once.
pub fn hash_file(path: &Path) -> Result<Checksum, HashError> {
  let read_err = |source| HashError::ReadFile {
    path: path.display().to_string(),
    source,
  };
  let mut file = fs::File::open(path).map_err(read_err)?;

  let mut hasher = Sha256::new();
  let mut buffer = [0u8; 8192];

  loop {
    let bytes_read = file.read(&mut buffer).map_err(read_err)?;
    if bytes_read == 0 {
      break;
    }
    hasher.update(&buffer[..bytes_read]);
  }

  Ok(Checksum(hex::encode(hasher.finalize())))
}

/// Hash arbitrary bytes.
pub fn hash_bytes(data: &[u8]) -> Checksum {
  Checksum(hex::encode(Sha256::digest(data)))
}
