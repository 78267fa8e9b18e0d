//! Desired-state configuration.
//!
//! Each `configs/<server>.lua` file describes one server. Files are evaluated
//! with [`lua::evaluate_config`] and immediately validated against the loaded
//! repositories, so every [`Config`] handed to the planner is known to be
//! consistent.

pub mod lua;
mod validate;

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

pub use lua::{RawConfig, evaluate_config};
pub use validate::{ValidationError, validate};

use crate::repo::Repositories;
use crate::types::{ScalarValue, SoftwareType};

/// The validated desired state of one server.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Config {
  /// Absolute install folder of the server.
  pub location: PathBuf,
  /// Repositories to draw artifacts from; later entries take precedence.
  pub repos: Vec<String>,
  pub software: SoftwareType,
  pub server_properties: BTreeMap<String, ScalarValue>,
  pub plugins: Vec<String>,
}

/// Validated configs keyed by server name.
pub type Configs = BTreeMap<String, Config>;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to list {path}: {source}")]
  ListDir {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to read {path}: {source}")]
  ReadFile {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to evaluate {path}: {message}")]
  Lua { path: PathBuf, message: String },

  #[error("invalid config for server {server}: {source}")]
  Invalid {
    server: String,
    #[source]
    source: ValidationError,
  },
}

/// Load and validate every server config under `configs_dir`.
///
/// A missing `configs_dir` yields no servers with a warning. The first
/// evaluation or validation failure aborts the load.
pub fn load_configs(configs_dir: &Path, repos: &Repositories) -> Result<Configs, ConfigError> {
  let list_err = |source| ConfigError::ListDir {
    path: configs_dir.to_path_buf(),
    source,
  };

  let entries = match std::fs::read_dir(configs_dir) {
    Ok(entries) => entries,
    Err(e) if e.kind() == io::ErrorKind::NotFound => {
      warn!(path = %configs_dir.display(), "config folder does not exist, no servers configured");
      return Ok(Configs::new());
    }
    Err(e) => return Err(list_err(e)),
  };

  let mut paths = Vec::new();
  for entry in entries {
    let entry = entry.map_err(list_err)?;
    let path = entry.path();
    if entry.file_type().map_err(list_err)?.is_file() && path.extension().is_some_and(|ext| ext == "lua") {
      paths.push(path);
    }
  }
  paths.sort();

  let mut configs = Configs::new();
  for path in paths {
    let Some(server) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
      continue;
    };
    let raw = evaluate_config(&path, &server)?;
    let config = validate(raw, repos).map_err(|source| ConfigError::Invalid {
      server: server.clone(),
      source,
    })?;
    configs.insert(server, config);
  }

  info!(servers = configs.len(), "loaded server configs");
  Ok(configs)
}
