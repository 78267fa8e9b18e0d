//! Working locations.
//!
//! Everything peridot reads is resolved relative to a working root: the
//! `$PERIDOT_ROOT` environment variable if set, otherwise the current
//! directory.

use std::path::PathBuf;

use crate::consts::{CONFIGS_DIR, CONTROL_SOCKET_ENV, DEFAULT_CONTROL_SOCKET, REPOS_DIR, ROOT_ENV};

/// Returns the working root.
pub fn root_dir() -> PathBuf {
  if let Ok(path) = std::env::var(ROOT_ENV) {
    return PathBuf::from(path);
  }
  std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Returns the folder holding one sub-folder per repository.
pub fn repos_dir() -> PathBuf {
  root_dir().join(REPOS_DIR)
}

/// Returns the folder holding one Lua file per server.
pub fn configs_dir() -> PathBuf {
  root_dir().join(CONFIGS_DIR)
}

/// Returns the unix socket of the process-control service.
pub fn control_socket() -> PathBuf {
  std::env::var(CONTROL_SOCKET_ENV)
    .map(PathBuf::from)
    .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONTROL_SOCKET))
}
