//! File writes for each kind of operation.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info};

use super::ApplyError;
use crate::consts::SERVER_PROPERTIES_FILE;
use crate::plan::{PluginUpdateOperation, ServerPropertiesUpdateOperation, SoftwareUpdateOperation};

fn write_err(path: &Path) -> impl FnOnce(io::Error) -> ApplyError + '_ {
  move |source| ApplyError::Write {
    path: path.to_path_buf(),
    source,
  }
}

/// Copy `source` to `dest` through a temporary file in the destination folder,
/// so `dest` is either the old file or the complete new one.
fn copy_into_place(source: &Path, dest: &Path) -> Result<(), ApplyError> {
  let dir = dest
    .parent()
    .ok_or_else(|| ApplyError::InvalidTarget(dest.to_path_buf()))?;
  fs::create_dir_all(dir).map_err(write_err(dir))?;

  let mut input = fs::File::open(source).map_err(|source_err| ApplyError::Read {
    path: source.to_path_buf(),
    source: source_err,
  })?;
  let mut temp = NamedTempFile::new_in(dir).map_err(write_err(dir))?;
  io::copy(&mut input, temp.as_file_mut()).map_err(write_err(dest))?;
  temp.persist(dest).map_err(|e| ApplyError::Write {
    path: dest.to_path_buf(),
    source: e.error,
  })?;
  Ok(())
}

pub fn apply_software(op: &SoftwareUpdateOperation) -> Result<(), ApplyError> {
  copy_into_place(&op.update_path, &op.install_path)?;
  info!(
    path = %op.install_path.display(),
    software = %op.software_type,
    hash = %op.new_hash.short(),
    "software installed"
  );
  Ok(())
}

/// Rewrite `<location>/server.properties` with the given changes.
///
/// Comments, ordering and untouched keys are kept. Changed keys are replaced
/// on their own line, new keys are appended. A missing file is created.
pub fn apply_server_properties(location: &Path, ops: &[ServerPropertiesUpdateOperation]) -> Result<(), ApplyError> {
  let path = location.join(SERVER_PROPERTIES_FILE);
  let content = match fs::read_to_string(&path) {
    Ok(content) => content,
    Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
    Err(source) => return Err(ApplyError::Read { path, source }),
  };

  let updated = rewrite_properties(&content, ops);
  fs::write(&path, updated).map_err(write_err(&path))?;
  debug!(path = %path.display(), changes = ops.len(), "server.properties updated");
  Ok(())
}

pub(crate) fn rewrite_properties(content: &str, ops: &[ServerPropertiesUpdateOperation]) -> String {
  let wanted: BTreeMap<&str, &str> = ops
    .iter()
    .map(|op| (op.property.as_str(), op.new_value.as_str()))
    .collect();
  let mut replaced: BTreeSet<&str> = BTreeSet::new();
  let mut out = String::with_capacity(content.len());

  for line in content.lines() {
    let trimmed = line.trim_start();
    let key = if trimmed.starts_with('#') {
      None
    } else {
      trimmed.split_once('=').map(|(key, _)| key.trim())
    };

    match key.and_then(|key| wanted.get_key_value(key)) {
      Some((key, value)) => {
        out.push_str(&format!("{}={}", key, value));
        replaced.insert(*key);
      }
      None => out.push_str(line),
    }
    out.push('\n');
  }

  for op in ops.iter().filter(|op| !replaced.contains(op.property.as_str())) {
    out.push_str(&format!("{}={}\n", op.property, op.new_value));
  }
  out
}

/// Install, update or remove one plugin jar.
///
/// Paths in `targets` are install destinations of the same server and are
/// never deleted, even when `op` names them as its current file.
pub fn apply_plugin(op: &PluginUpdateOperation, targets: &BTreeSet<&Path>) -> Result<(), ApplyError> {
  match (&op.update_path, &op.install_path) {
    (Some(update_path), Some(install_path)) => {
      copy_into_place(update_path, install_path)?;
      if let Some(current) = op.current_path.as_ref().filter(|current| !targets.contains(current.as_path())) {
        remove(current)?;
      }
      info!(
        plugin = %op.plugin_name,
        version = op.new_version.as_deref().unwrap_or_default(),
        path = %install_path.display(),
        "plugin installed"
      );
    }
    (None, _) => {
      if let Some(current) = op.current_path.as_ref().filter(|current| !targets.contains(current.as_path())) {
        remove(current)?;
        info!(plugin = %op.plugin_name, path = %current.display(), "plugin removed");
      }
    }
    (Some(_), None) => return Err(ApplyError::InvalidTarget(PathBuf::from(&op.plugin_name))),
  }
  Ok(())
}

/// Apply every plugin operation of one server, removals first.
pub fn apply_plugins(ops: &BTreeMap<String, PluginUpdateOperation>) -> Vec<(&str, Result<(), ApplyError>)> {
  let targets: BTreeSet<&Path> = ops.values().filter_map(|op| op.install_path.as_deref()).collect();
  let (removals, installs): (Vec<_>, Vec<_>) = ops.iter().partition(|(_, op)| op.update_path.is_none());

  removals
    .into_iter()
    .chain(installs)
    .map(|(name, op)| {
      info!(
        plugin = %name,
        from = op.prev_version.as_deref().unwrap_or("(missing)"),
        to = op.new_version.as_deref().unwrap_or("(removed)"),
        "updating plugin"
      );
      (name.as_str(), apply_plugin(op, &targets))
    })
    .collect()
}

fn remove(path: &Path) -> Result<(), ApplyError> {
  match fs::remove_file(path) {
    Ok(()) => Ok(()),
    Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
    Err(source) => Err(ApplyError::Write {
      path: path.to_path_buf(),
      source,
    }),
  }
}
