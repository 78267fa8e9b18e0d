//! Artifact repositories.
//!
//! Every sub-folder of `repos/` is a repository. Each is scanned once per run
//! into an immutable [`Repository`]; the resulting [`Repositories`] set is then
//! passed by reference to planning and validation.
//!
//! # Resolution across repositories
//!
//! A server lists the repositories it draws from. When several of them define
//! the same software type or plugin, the **last** listed repository wins.

mod load;
mod types;

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;
use tracing::warn;

pub use load::{RepoError, build_index, compare_versions, list_jars};
pub use types::{Plugin, Repository, Software};

use crate::types::SoftwareType;

/// All repositories loaded for a run, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Repositories(BTreeMap<String, Repository>);

impl Repositories {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn insert(&mut self, repo: Repository) {
    self.0.insert(repo.name.clone(), repo);
  }

  pub fn get(&self, name: &str) -> Option<&Repository> {
    self.0.get(name)
  }

  pub fn contains(&self, name: &str) -> bool {
    self.0.contains_key(name)
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = &Repository> {
    self.0.values()
  }

  /// The software of `software_type` from the last repository in `order`
  /// that defines it. Unknown repository names are ignored.
  pub fn resolve_software(&self, order: &[String], software_type: SoftwareType) -> Option<&Software> {
    order
      .iter()
      .filter_map(|name| self.0.get(name))
      .filter_map(|repo| repo.software.get(&software_type))
      .last()
  }

  /// The plugin named `name` from the last repository in `order` that defines it.
  pub fn resolve_plugin(&self, order: &[String], name: &str) -> Option<&Plugin> {
    order
      .iter()
      .filter_map(|repo| self.0.get(repo))
      .filter_map(|repo| repo.plugins.get(name))
      .last()
  }
}

impl FromIterator<Repository> for Repositories {
  fn from_iter<I: IntoIterator<Item = Repository>>(iter: I) -> Self {
    let mut repos = Repositories::new();
    for repo in iter {
      repos.insert(repo);
    }
    repos
  }
}

/// Load every repository folder under `repos_dir`.
///
/// A missing `repos_dir` yields an empty set with a warning. A failure in any
/// single repository aborts the whole load.
pub fn load_repositories(repos_dir: &Path) -> Result<Repositories, RepoError> {
  let entries = match std::fs::read_dir(repos_dir) {
    Ok(entries) => entries,
    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
      warn!(path = %repos_dir.display(), "repository folder does not exist, no repositories loaded");
      return Ok(Repositories::new());
    }
    Err(source) => {
      return Err(RepoError::ListDir {
        path: repos_dir.to_path_buf(),
        source,
      });
    }
  };

  let list_err = |source| RepoError::ListDir {
    path: repos_dir.to_path_buf(),
    source,
  };

  let mut repos = Repositories::new();
  for entry in entries {
    let entry = entry.map_err(list_err)?;
    if !entry.file_type().map_err(list_err)?.is_dir() {
      continue;
    }
    let name = entry.file_name().to_string_lossy().into_owned();
    repos.insert(build_index(&entry.path(), &name)?);
  }
  Ok(repos)
}
