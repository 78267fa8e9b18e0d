//! Plugin set diff.
//!
//! Installed plugins are identified by the `name` in their descriptor, not by
//! file name. Three kinds of change come out of the comparison:
//!
//! - install: desired, nothing with that name on disk
//! - update: on disk with a different version or checksum
//! - remove: on disk but not desired

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, warn};

use super::PlanError;
use crate::archive::{Artifact, inspect};
use crate::config::Config;
use crate::consts::PLUGINS_DIR;
use crate::error::SoftFailure;
use crate::repo::{Repositories, list_jars};
use crate::util::hash::{Checksum, hash_bytes};

/// Install, update or remove one plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginUpdateOperation {
  pub plugin_name: String,
  /// The installed jar, `None` for an install.
  pub current_path: Option<PathBuf>,
  /// The repository artifact, `None` for a removal.
  pub update_path: Option<PathBuf>,
  /// Destination under `<location>/plugins/`, `None` for a removal.
  pub install_path: Option<PathBuf>,
  pub prev_version: Option<String>,
  pub new_version: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginChange {
  Install,
  Update,
  Remove,
}

impl PluginUpdateOperation {
  pub fn change(&self) -> PluginChange {
    match (&self.current_path, &self.update_path) {
      (None, _) => PluginChange::Install,
      (Some(_), None) => PluginChange::Remove,
      (Some(_), Some(_)) => PluginChange::Update,
    }
  }
}

/// A plugin found under `<location>/plugins/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledPlugin {
  pub path: PathBuf,
  pub version: String,
  pub checksum: Checksum,
}

/// Scan the plugins folder of a server.
///
/// A missing folder means no plugins. Jars that are not plugins are skipped
/// with a warning; when two jars declare the same plugin name the first one
/// (by file name) is kept.
pub fn installed_plugins(config: &Config) -> Result<BTreeMap<String, InstalledPlugin>, PlanError> {
  let dir = config.location.join(PLUGINS_DIR);
  let jars = match list_jars(&dir) {
    Ok(jars) => jars,
    Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
    Err(source) => return Err(PlanError::ListDir { path: dir, source }),
  };

  let mut installed: BTreeMap<String, InstalledPlugin> = BTreeMap::new();
  for path in jars {
    let bytes = fs::read(&path).map_err(|source| PlanError::ReadFile {
      path: path.clone(),
      source,
    })?;
    let file_name = path
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_default();

    let artifact = inspect(&file_name, &bytes)
      .or_skip(&path)
      .map_err(|source| PlanError::Archive {
        path: path.clone(),
        source,
      })?;
    let metadata = match artifact {
      Some(Artifact::Plugin(metadata)) => metadata,
      Some(Artifact::Software(software)) => {
        warn!(path = %path.display(), %software, "server software jar in plugins folder, skipping");
        continue;
      }
      None => continue,
    };

    if let Some(existing) = installed.get(&metadata.name) {
      warn!(
        plugin = %metadata.name,
        kept = %existing.path.display(),
        duplicate = %path.display(),
        "plugin installed twice, ignoring duplicate"
      );
      continue;
    }

    installed.insert(
      metadata.name,
      InstalledPlugin {
        path,
        version: metadata.version,
        checksum: hash_bytes(&bytes),
      },
    );
  }
  Ok(installed)
}

/// Compute the plugin changes for one server, keyed by plugin name.
pub fn plugin_diff(
  repos: &Repositories,
  config: &Config,
) -> Result<BTreeMap<String, PluginUpdateOperation>, PlanError> {
  let plugins_dir = config.location.join(PLUGINS_DIR);

  let mut desired = BTreeMap::new();
  for name in &config.plugins {
    let plugin = repos
      .resolve_plugin(&config.repos, name)
      .ok_or_else(|| PlanError::PluginNotFound {
        plugin: name.clone(),
        repos: config.repos.clone(),
      })?;
    desired.insert(name.as_str(), plugin);
  }

  let installed = installed_plugins(config)?;
  let mut operations = BTreeMap::new();

  for (name, plugin) in &desired {
    let current = installed.get(*name);
    if current.is_some_and(|c| c.version == plugin.version && c.checksum == plugin.checksum) {
      continue;
    }

    let install_path = plugin.source_path.file_name().map(|file| plugins_dir.join(file));
    operations.insert(
      name.to_string(),
      PluginUpdateOperation {
        plugin_name: name.to_string(),
        current_path: current.map(|c| c.path.clone()),
        update_path: Some(plugin.source_path.clone()),
        install_path,
        prev_version: current.map(|c| c.version.clone()),
        new_version: Some(plugin.version.clone()),
      },
    );
  }

  let wanted: BTreeSet<&str> = desired.keys().copied().collect();
  let targets: BTreeSet<PathBuf> = operations.values().filter_map(|op| op.install_path.clone()).collect();
  for (name, current) in installed.iter().filter(|(name, _)| !wanted.contains(name.as_str())) {
    // The install copies over this file, so there is nothing left to remove.
    if targets.contains(&current.path) {
      debug!(plugin = %name, path = %current.path.display(), "installed jar is replaced by an install");
      continue;
    }
    operations.insert(
      name.clone(),
      PluginUpdateOperation {
        plugin_name: name.clone(),
        current_path: Some(current.path.clone()),
        update_path: None,
        install_path: None,
        prev_version: Some(current.version.clone()),
        new_version: None,
      },
    );
  }

  Ok(operations)
}
