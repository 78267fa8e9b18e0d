//! Turning a [`RawConfig`] into a validated [`Config`].

use std::path::{Path, PathBuf};

use thiserror::Error;

use super::Config;
use super::lua::RawConfig;
use crate::repo::Repositories;
use crate::types::{SoftwareType, UnknownSoftwareType};

/// Why a server's config was rejected.
#[derive(Debug, Error)]
pub enum ValidationError {
  #[error("invalid location: must be an absolute path")]
  InvalidLocation,

  #[error("invalid location: parent of {0} is not an existing folder")]
  LocationParentMissing(PathBuf),

  #[error("invalid repositories: at least one repository must be specified")]
  NoRepos,

  #[error("unknown repository specified: {0}")]
  UnknownRepo(String),

  #[error(transparent)]
  UnknownSoftware(#[from] UnknownSoftwareType),

  #[error("invalid plugin: empty string found in plugins list")]
  EmptyPluginName,

  #[error("unknown plugin/software specified: {0} not found in configured repositories")]
  ArtifactNotFound(String),
}

/// Validate `raw` against the loaded repositories.
///
/// Checks, in order: the location is absolute and its parent folder exists;
/// at least one repository is listed and every listed repository is loaded;
/// the software type is supported and defined in one of the listed
/// repositories; every plugin name is non-empty and defined in one of them.
pub fn validate(raw: RawConfig, repos: &Repositories) -> Result<Config, ValidationError> {
  let location = PathBuf::from(&raw.location);
  validate_location(&location)?;

  if raw.repos.is_empty() {
    return Err(ValidationError::NoRepos);
  }
  if let Some(unknown) = raw.repos.iter().find(|name| !repos.contains(name)) {
    return Err(ValidationError::UnknownRepo(unknown.clone()));
  }

  let software: SoftwareType = raw.software.parse()?;
  if repos.resolve_software(&raw.repos, software).is_none() {
    return Err(ValidationError::ArtifactNotFound(software.to_string()));
  }

  for plugin in &raw.plugins {
    if plugin.is_empty() {
      return Err(ValidationError::EmptyPluginName);
    }
    if repos.resolve_plugin(&raw.repos, plugin).is_none() {
      return Err(ValidationError::ArtifactNotFound(plugin.clone()));
    }
  }

  Ok(Config {
    location,
    repos: raw.repos,
    software,
    server_properties: raw.server_properties,
    plugins: raw.plugins,
  })
}

fn validate_location(location: &Path) -> Result<(), ValidationError> {
  if location.as_os_str().is_empty() || !location.is_absolute() {
    return Err(ValidationError::InvalidLocation);
  }
  match location.parent() {
    Some(parent) if parent.is_dir() => Ok(()),
    _ => Err(ValidationError::LocationParentMissing(location.to_path_buf())),
  }
}
