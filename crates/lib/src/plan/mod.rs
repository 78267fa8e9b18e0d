//! The diff/plan engine.
//!
//! For every server three independent diffs are computed against the loaded
//! repositories: the software jar, `server.properties`, and the plugin set.
//! [`plan_all`] gathers them into one [`Plan`]. A failing diff is recorded
//! against its server and never stops the other diffs or servers.

mod plugins;
mod properties;
mod software;

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

pub use plugins::{InstalledPlugin, PluginChange, PluginUpdateOperation, installed_plugins, plugin_diff};
pub use properties::{ServerPropertiesUpdateOperation, parse_properties, server_properties_diff};
pub use software::{SoftwareUpdateOperation, software_diff};

use crate::archive::ArchiveError;
use crate::config::{Config, Configs};
use crate::repo::Repositories;
use crate::types::SoftwareType;
use crate::util::hash::HashError;

#[derive(Debug, Error)]
pub enum PlanError {
  #[error("{software} not found in repositories {repos:?}")]
  SoftwareNotFound { software: SoftwareType, repos: Vec<String> },

  #[error("plugin {plugin} not found in repositories {repos:?}")]
  PluginNotFound { plugin: String, repos: Vec<String> },

  #[error(transparent)]
  Hash(#[from] HashError),

  #[error("failed to read {path}: {source}")]
  ReadFile {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to list {path}: {source}")]
  ListDir {
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

  #[error("no config for server {0}")]
  UnknownServer(String),
}

/// Which of the three diffs an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffKind {
  Software,
  ServerProperties,
  Plugins,
}

impl std::fmt::Display for DiffKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      DiffKind::Software => write!(f, "software"),
      DiffKind::ServerProperties => write!(f, "server.properties"),
      DiffKind::Plugins => write!(f, "plugins"),
    }
  }
}

/// A diff that could not be computed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanFailure {
  pub server: String,
  pub kind: DiffKind,
  pub message: String,
}

/// Pending operations for every server, keyed by server name.
///
/// Servers with nothing to do do not appear in any of the maps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Plan {
  pub software: BTreeMap<String, SoftwareUpdateOperation>,
  pub server_properties: BTreeMap<String, Vec<ServerPropertiesUpdateOperation>>,
  pub plugins: BTreeMap<String, BTreeMap<String, PluginUpdateOperation>>,
  pub failures: Vec<PlanFailure>,
}

impl Plan {
  /// True when no server has a pending operation. Failures do not count.
  pub fn is_empty(&self) -> bool {
    self.software.is_empty() && self.server_properties.is_empty() && self.plugins.is_empty()
  }

  /// Union of servers appearing in any of the three diffs.
  pub fn affected_servers(&self) -> BTreeSet<String> {
    self
      .software
      .keys()
      .chain(self.server_properties.keys())
      .chain(self.plugins.keys())
      .cloned()
      .collect()
  }

  pub fn change_count(&self) -> usize {
    self.software.len()
      + self.server_properties.values().map(Vec::len).sum::<usize>()
      + self.plugins.values().map(BTreeMap::len).sum::<usize>()
  }

  fn record_failure(&mut self, server: &str, kind: DiffKind, err: PlanError) {
    warn!(server, %kind, error = %err, "failed to compute diff");
    self.failures.push(PlanFailure {
      server: server.to_string(),
      kind,
      message: err.to_string(),
    });
  }

  fn add_server(&mut self, repos: &Repositories, server: &str, config: &Config) {
    match software_diff(repos, config) {
      Ok(Some(op)) => {
        self.software.insert(server.to_string(), op);
      }
      Ok(None) => {}
      Err(e) => self.record_failure(server, DiffKind::Software, e),
    }

    match server_properties_diff(config) {
      Ok(ops) if !ops.is_empty() => {
        self.server_properties.insert(server.to_string(), ops);
      }
      Ok(_) => {}
      Err(e) => self.record_failure(server, DiffKind::ServerProperties, e),
    }

    match plugin_diff(repos, config) {
      Ok(ops) if !ops.is_empty() => {
        self.plugins.insert(server.to_string(), ops);
      }
      Ok(_) => {}
      Err(e) => self.record_failure(server, DiffKind::Plugins, e),
    }
  }
}

/// Compute the plan for every configured server, or only `filter` if given.
///
/// Only an unknown `filter` is an error; per-server diff failures end up in
/// [`Plan::failures`].
pub fn plan_all(repos: &Repositories, configs: &Configs, filter: Option<&str>) -> Result<Plan, PlanError> {
  let mut plan = Plan::default();

  match filter {
    Some(server) => {
      let config = configs
        .get(server)
        .ok_or_else(|| PlanError::UnknownServer(server.to_string()))?;
      plan.add_server(repos, server, config);
    }
    None => {
      for (server, config) in configs {
        plan.add_server(repos, server, config);
      }
    }
  }

  debug!(
    changes = plan.change_count(),
    servers = plan.affected_servers().len(),
    failures = plan.failures.len(),
    "plan computed"
  );
  Ok(plan)
}
