//! Software jar diff.

use std::path::PathBuf;

use serde::Serialize;
use tracing::debug;

use super::PlanError;
use crate::config::Config;
use crate::repo::Repositories;
use crate::types::SoftwareType;
use crate::util::hash::{Checksum, hash_file};

/// Replace (or install) a server's software jar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SoftwareUpdateOperation {
  pub software_type: SoftwareType,
  /// The installed jar, `None` on a fresh install.
  pub current_path: Option<PathBuf>,
  /// Where the jar is written, `<location>/<software>.jar`.
  pub install_path: PathBuf,
  /// The repository artifact to copy.
  pub update_path: PathBuf,
  pub prev_hash: Option<Checksum>,
  pub new_hash: Checksum,
}

/// Compare the installed jar with the artifact resolved from the server's
/// repositories. Returns `None` when the checksums already match.
pub fn software_diff(repos: &Repositories, config: &Config) -> Result<Option<SoftwareUpdateOperation>, PlanError> {
  let software = repos
    .resolve_software(&config.repos, config.software)
    .ok_or_else(|| PlanError::SoftwareNotFound {
      software: config.software,
      repos: config.repos.clone(),
    })?;

  let install_path = config.location.join(config.software.jar_name());
  let prev_hash = match hash_file(&install_path) {
    Ok(hash) => Some(hash),
    Err(e) if e.is_not_found() => None,
    Err(e) => return Err(e.into()),
  };

  if prev_hash.as_ref() == Some(&software.checksum) {
    debug!(path = %install_path.display(), "software up to date");
    return Ok(None);
  }

  Ok(Some(SoftwareUpdateOperation {
    software_type: config.software,
    current_path: prev_hash.as_ref().map(|_| install_path.clone()),
    install_path,
    update_path: software.source_path.clone(),
    prev_hash,
    new_hash: software.checksum.clone(),
  }))
}
