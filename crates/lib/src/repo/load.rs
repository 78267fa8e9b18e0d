//! Building a [`Repository`] from a folder of jars.

use std::cmp::Ordering;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::types::{Plugin, Repository, Software};
use crate::archive::{ArchiveError, Artifact, inspect};
use crate::consts::JAR_SUFFIX;
use crate::error::SoftFailure;
use crate::util::hash::hash_bytes;

/// Errors that abort an index build.
#[derive(Debug, Error)]
pub enum RepoError {
  /// Wraps whatever went wrong while loading the named repository.
  #[error("failed to load repository {name}: {source}")]
  Load {
    name: String,
    #[source]
    source: Box<RepoError>,
  },

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

  #[error("failed to inspect {path}: {source}")]
  Archive {
    path: PathBuf,
    #[source]
    source: ArchiveError,
  },
}

/// List the jar files directly under `dir`, sorted by file name.
///
/// Sub-directories and files without the jar suffix are ignored.
pub fn list_jars(dir: &Path) -> io::Result<Vec<PathBuf>> {
  let mut jars = Vec::new();
  for entry in fs::read_dir(dir)? {
    let entry = entry?;
    if entry.file_type()?.is_dir() {
      continue;
    }
    let path = entry.path();
    let is_jar = path
      .file_name()
      .and_then(|n| n.to_str())
      .is_some_and(|n| n.ends_with(JAR_SUFFIX));
    if is_jar {
      jars.push(path);
    }
  }
  jars.sort();
  Ok(jars)
}

/// Scan `path` and build the repository index named `name`.
///
/// Unrecognized archives and plugins with invalid metadata are logged and
/// skipped. Any I/O failure or corrupt archive aborts the whole build; a
/// partially built index is never returned.
pub fn build_index(path: &Path, name: &str) -> Result<Repository, RepoError> {
  build_index_inner(path, name).map_err(|source| RepoError::Load {
    name: name.to_string(),
    source: Box::new(source),
  })
}

fn build_index_inner(path: &Path, name: &str) -> Result<Repository, RepoError> {
  let mut repo = Repository::new(name);

  let jars = list_jars(path).map_err(|source| RepoError::ListDir {
    path: path.to_path_buf(),
    source,
  })?;

  for jar_path in jars {
    let read_err = |source| RepoError::ReadFile {
      path: jar_path.clone(),
      source,
    };
    let bytes = fs::read(&jar_path).map_err(read_err)?;
    let file_name = jar_path
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_default();

    let artifact = inspect(&file_name, &bytes)
      .or_skip(&jar_path)
      .map_err(|source| RepoError::Archive {
        path: jar_path.clone(),
        source,
      })?;
    let Some(artifact) = artifact else {
      continue;
    };
    let checksum = hash_bytes(&bytes);

    match artifact {
      Artifact::Software(software_type) => {
        let modified = fs::metadata(&jar_path).and_then(|m| m.modified()).map_err(read_err)?;
        insert_software(
          &mut repo,
          Software {
            software_type,
            source_path: jar_path.clone(),
            last_modified: DateTime::<Utc>::from(modified),
            checksum,
          },
        );
      }
      Artifact::Plugin(metadata) => {
        insert_plugin(
          &mut repo,
          Plugin {
            name: metadata.name,
            source_path: jar_path.clone(),
            version: metadata.version,
            checksum,
          },
        );
      }
    }
  }

  info!(
    repo = name,
    software = repo.software.len(),
    plugins = repo.plugins.len(),
    "loaded repository"
  );
  Ok(repo)
}

/// Insert a software entry, keeping whichever of the two has the later
/// modification time. Ties keep the existing entry.
fn insert_software(repo: &mut Repository, candidate: Software) {
  if let Some(existing) = repo.software.get(&candidate.software_type) {
    if existing.last_modified < candidate.last_modified {
      warn!(
        software = %candidate.software_type,
        old = %existing.last_modified,
        new = %candidate.last_modified,
        "replacing software with newer timestamp"
      );
    } else {
      warn!(
        software = %candidate.software_type,
        path = %candidate.source_path.display(),
        skipped = %candidate.last_modified,
        kept = %existing.last_modified,
        "skipping software, already have one at least as new"
      );
      return;
    }
  }
  debug!(software = %candidate.software_type, path = %candidate.source_path.display(), "indexed software");
  repo.software.insert(candidate.software_type, candidate);
}

/// Insert a plugin entry, keeping whichever of the two has the newer
/// version. Equal versions keep the existing entry.
fn insert_plugin(repo: &mut Repository, candidate: Plugin) {
  if let Some(existing) = repo.plugins.get(&candidate.name) {
    if compare_versions(&candidate.version, &existing.version) == Ordering::Greater {
      warn!(
        plugin = %candidate.name,
        old = %existing.version,
        new = %candidate.version,
        "replacing plugin with newer version"
      );
    } else {
      warn!(
        plugin = %candidate.name,
        skipped = %candidate.version,
        kept = %existing.version,
        "skipping plugin, already have one at least as new"
      );
      return;
    }
  }
  debug!(plugin = %candidate.name, version = %candidate.version, "indexed plugin");
  repo.plugins.insert(candidate.name.clone(), candidate);
}

/// Total order over version strings.
///
/// Valid semver versions compare semantically and always sort above
/// anything that is not semver. Non-semver versions compare as plain text
/// among themselves.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
  match (semver::Version::parse(a), semver::Version::parse(b)) {
    (Ok(a), Ok(b)) => a.cmp(&b),
    (Ok(_), Err(_)) => Ordering::Greater,
    (Err(_), Ok(_)) => Ordering::Less,
    (Err(_), Err(_)) => a.cmp(b),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::types::SoftwareType;
  use crate::util::hash::hash_file;
  use crate::util::testutil::{
    PAPER_MARKER, VANILLA_MARKER, VELOCITY_MARKER, jar_bytes, plugin_jar, set_mtime, software_jar, write_jar,
  };
  use tempfile::tempdir;

  #[test]
  fn indexes_software_and_plugins() {
    let temp = tempdir().unwrap();
    let vanilla = write_jar(temp.path(), "server.jar", &software_jar(VANILLA_MARKER, "1.21"));
    write_jar(temp.path(), "paperclip.jar", &software_jar(PAPER_MARKER, "1.21"));
    write_jar(temp.path(), "EssentialsX.jar", &plugin_jar("Essentials", "2.20.1"));

    let repo = build_index(temp.path(), "main").unwrap();

    assert_eq!(repo.name, "main");
    assert_eq!(repo.software.len(), 2);
    let entry = &repo.software[&SoftwareType::Vanilla];
    assert_eq!(entry.checksum, hash_file(&vanilla).unwrap());
    assert_eq!(entry.source_path, vanilla);
    assert!(repo.software.contains_key(&SoftwareType::Paper));
    assert_eq!(repo.plugins.len(), 1);
    assert_eq!(repo.plugins["Essentials"].version, "2.20.1");
  }

  #[test]
  fn skips_unrecognized_and_invalid_plugins() {
    let temp = tempdir().unwrap();
    write_jar(temp.path(), "library.jar", &jar_bytes(&[("com/example/Lib.class", b"")]));
    write_jar(temp.path(), "nameless.jar", &jar_bytes(&[("plugin.yml", b"version: 1\n")]));
    write_jar(temp.path(), "notes.txt", b"not a jar");
    write_jar(temp.path(), "velocity.jar", &software_jar(VELOCITY_MARKER, "3.3"));

    let repo = build_index(temp.path(), "proxy").unwrap();

    assert_eq!(repo.software.len(), 1);
    assert!(repo.plugins.is_empty());
  }

  #[test]
  fn corrupt_archive_fails_the_build() {
    let temp = tempdir().unwrap();
    write_jar(temp.path(), "paper.jar", &software_jar(PAPER_MARKER, "ok"));
    write_jar(temp.path(), "truncated.jar", b"PK\x03\x04garbage");

    let err = build_index(temp.path(), "main").unwrap_err();
    match err {
      RepoError::Load { name, source } => {
        assert_eq!(name, "main");
        assert!(matches!(*source, RepoError::Archive { .. }));
      }
      other => panic!("unexpected error: {:?}", other),
    }
  }

  #[test]
  fn missing_folder_fails_with_load_error() {
    let temp = tempdir().unwrap();
    let err = build_index(&temp.path().join("absent"), "ghost").unwrap_err();
    assert!(matches!(err, RepoError::Load { ref name, .. } if name == "ghost"));
  }

  #[test]
  fn newer_software_wins_regardless_of_scan_order() {
    for (older_name, newer_name) in [("a.jar", "b.jar"), ("b.jar", "a.jar")] {
      let temp = tempdir().unwrap();
      let older = write_jar(temp.path(), older_name, &software_jar(PAPER_MARKER, "old"));
      let newer = write_jar(temp.path(), newer_name, &software_jar(PAPER_MARKER, "new"));
      set_mtime(&older, 1_700_000_000);
      set_mtime(&newer, 1_700_000_500);

      let repo = build_index(temp.path(), "main").unwrap();
      let paper = &repo.software[&SoftwareType::Paper];

      assert_eq!(paper.source_path, newer);
      assert_eq!(paper.checksum, hash_file(&newer).unwrap());
    }
  }

  #[test]
  fn equal_timestamps_keep_first_scanned() {
    let temp = tempdir().unwrap();
    let first = write_jar(temp.path(), "a.jar", &software_jar(PAPER_MARKER, "one"));
    let second = write_jar(temp.path(), "b.jar", &software_jar(PAPER_MARKER, "two"));
    set_mtime(&first, 1_700_000_000);
    set_mtime(&second, 1_700_000_000);

    let repo = build_index(temp.path(), "main").unwrap();
    assert_eq!(repo.software[&SoftwareType::Paper].source_path, first);
  }

  #[test]
  fn newer_plugin_version_wins() {
    let temp = tempdir().unwrap();
    write_jar(temp.path(), "a-new.jar", &plugin_jar("WorldEdit", "7.10.0"));
    write_jar(temp.path(), "b-old.jar", &plugin_jar("WorldEdit", "7.9.0"));

    let repo = build_index(temp.path(), "main").unwrap();
    let plugin = &repo.plugins["WorldEdit"];
    assert_eq!(plugin.version, "7.10.0");
    assert!(plugin.source_path.ends_with("a-new.jar"));
  }

  #[test]
  fn compare_versions_falls_back_to_text() {
    assert_eq!(compare_versions("1.10.0", "1.9.0"), Ordering::Greater);
    assert_eq!(compare_versions("2.20.1-b123", "2.20.1-b124"), Ordering::Less);
    assert_eq!(compare_versions("build-7", "build-10"), Ordering::Greater);
    assert_eq!(compare_versions("5.4", "5.4"), Ordering::Equal);
  }

  #[test]
  fn semver_sorts_above_free_form_versions() {
    assert_eq!(compare_versions("1.9", "1.10.0"), Ordering::Less);
    assert_eq!(compare_versions("1.9.0", "1.9"), Ordering::Greater);
    assert_eq!(compare_versions("9.9", "0.0.1"), Ordering::Less);
  }

  #[test]
  fn plugin_winner_does_not_depend_on_scan_order() {
    let versions = ["1.10.0", "1.9.0", "1.9"];
    let orders = [[0, 1, 2], [0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]];

    for order in orders {
      let temp = tempdir().unwrap();
      for (position, &index) in order.iter().enumerate() {
        let file = format!("{}-WorldEdit.jar", position);
        write_jar(temp.path(), &file, &plugin_jar("WorldEdit", versions[index]));
      }

      let repo = build_index(temp.path(), "main").unwrap();
      assert_eq!(repo.plugins["WorldEdit"].version, "1.10.0", "scan order {:?}", order);
    }
  }
}
