//! Apply orchestrator.
//!
//! Two modes:
//!
//! - **live** ([`apply_live`]): write every operation while servers keep
//!   running.
//! - **restart** ([`apply_restart`]): stop every affected server, wait until
//!   all of them are down, write, then start them again.
//!
//! In both modes a failed write is logged against its server and the run goes
//! on. In restart mode nothing is written unless every affected server is
//! confirmed down before the deadline.

mod files;

use std::collections::BTreeSet;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{debug, error, info, info_span, warn};

pub use files::{apply_plugin, apply_plugins, apply_server_properties, apply_software};

use crate::config::Configs;
use crate::consts::{STATUS_POLL_INTERVAL, STOP_TIMEOUT};
use crate::control::{ControlError, ProcessControl};
use crate::plan::{DiffKind, Plan};

#[derive(Debug, Error)]
pub enum ApplyError {
  #[error("failed to read {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to write {path}: {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("invalid write target {0}")]
  InvalidTarget(PathBuf),

  #[error("no config for server {0}")]
  MissingConfig(String),

  #[error("failed to stop server {server}: {source}")]
  Terminate {
    server: String,
    #[source]
    source: ControlError,
  },

  #[error("failed to get status of server {server}: {source}")]
  Status {
    server: String,
    #[source]
    source: ControlError,
  },

  #[error("servers still running after {timeout:?}: {}", pending.join(", "))]
  StopTimeout { timeout: Duration, pending: Vec<String> },

  #[error("status poller failed: {0}")]
  Poller(#[from] tokio::task::JoinError),
}

/// Timing of the stop barrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestartOptions {
  /// Delay before each status query.
  pub poll_interval: Duration,
  /// Deadline shared by all affected servers.
  pub timeout: Duration,
}

impl Default for RestartOptions {
  fn default() -> Self {
    Self {
      poll_interval: STATUS_POLL_INTERVAL,
      timeout: STOP_TIMEOUT,
    }
  }
}

/// A write that failed for one server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteFailure {
  pub server: String,
  pub kind: DiffKind,
  /// Property or plugin name, absent for software.
  pub target: Option<String>,
  pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApplyOutcome {
  /// Affected servers.
  pub servers: BTreeSet<String>,
  /// Operations written successfully.
  pub applied: usize,
  pub failed_writes: Vec<WriteFailure>,
  /// Servers whose start signal failed and need a manual restart.
  pub start_failures: Vec<String>,
}

impl ApplyOutcome {
  pub fn is_clean(&self) -> bool {
    self.failed_writes.is_empty() && self.start_failures.is_empty()
  }

  fn record(&mut self, server: &str, kind: DiffKind, target: Option<&str>, result: Result<(), ApplyError>) {
    match result {
      Ok(()) => self.applied += 1,
      Err(e) => {
        error!(server, %kind, item = target, error = %e, "write failed");
        self.failed_writes.push(WriteFailure {
          server: server.to_string(),
          kind,
          target: target.map(str::to_string),
          message: e.to_string(),
        });
      }
    }
  }
}

/// Write every operation in `plan`. Never fails as a whole.
fn write_plan(plan: &Plan, configs: &Configs) -> ApplyOutcome {
  let mut outcome = ApplyOutcome {
    servers: plan.affected_servers(),
    ..Default::default()
  };

  for (server, op) in &plan.software {
    info!(server = %server, software = %op.software_type, "updating server software");
    outcome.record(server, DiffKind::Software, None, apply_software(op));
  }

  for (server, ops) in &plan.server_properties {
    info!(server = %server, changes = ops.len(), "updating server properties");
    let result = configs
      .get(server)
      .ok_or_else(|| ApplyError::MissingConfig(server.clone()))
      .and_then(|config| apply_server_properties(&config.location, ops));
    outcome.record(server, DiffKind::ServerProperties, None, result);
  }

  for (server, ops) in &plan.plugins {
    let _span = info_span!("plugins", server = %server).entered();
    for (name, result) in apply_plugins(ops) {
      outcome.record(server, DiffKind::Plugins, Some(name), result);
    }
  }

  outcome
}

/// Apply `plan` while servers keep running.
pub fn apply_live(plan: &Plan, configs: &Configs) -> ApplyOutcome {
  write_plan(plan, configs)
}

/// Stop, update and start every affected server.
///
/// A terminate or status error, or a server still up at the deadline, aborts
/// the run before anything is written. Start failures only end up in
/// [`ApplyOutcome::start_failures`].
pub async fn apply_restart(
  plan: &Plan,
  configs: &Configs,
  client: Arc<dyn ProcessControl>,
  options: RestartOptions,
) -> Result<ApplyOutcome, ApplyError> {
  let affected = plan.affected_servers();
  if affected.is_empty() {
    return Ok(ApplyOutcome::default());
  }

  info!(servers = affected.len(), "stopping affected servers");
  for server in &affected {
    client.terminate(server).await.map_err(|source| ApplyError::Terminate {
      server: server.clone(),
      source,
    })?;
  }

  wait_for_stop(&client, &affected, options).await?;

  let mut outcome = write_plan(plan, configs);

  info!(servers = affected.len(), "starting affected servers");
  for server in &affected {
    if let Err(e) = client.start(server).await {
      warn!(server = %server, error = %e, "failed to start server, manual restart needed");
      outcome.start_failures.push(server.clone());
    }
  }

  Ok(outcome)
}

/// Poll every server until it reports stopped or crashed, all against one
/// shared deadline. Pollers still running when this returns are aborted.
async fn wait_for_stop(
  client: &Arc<dyn ProcessControl>,
  servers: &BTreeSet<String>,
  options: RestartOptions,
) -> Result<(), ApplyError> {
  let mut join_set: JoinSet<Result<String, ApplyError>> = JoinSet::new();
  for server in servers {
    let client = Arc::clone(client);
    let server = server.clone();
    join_set.spawn(async move {
      loop {
        tokio::time::sleep(options.poll_interval).await;
        let status = client.status(&server).await.map_err(|source| ApplyError::Status {
          server: server.clone(),
          source,
        })?;
        debug!(server = %server, %status, "polled status");
        if status.is_down() {
          return Ok(server);
        }
      }
    });
  }

  let mut pending = servers.clone();
  let barrier = async {
    while let Some(join_result) = join_set.join_next().await {
      match join_result {
        Ok(Ok(server)) => {
          info!(server = %server, "server stopped");
          pending.remove(&server);
        }
        Ok(Err(e)) => return Err(e),
        Err(e) => return Err(ApplyError::Poller(e)),
      }
    }
    Ok(())
  };

  let result = match tokio::time::timeout(options.timeout, barrier).await {
    Ok(result) => result,
    Err(_) => Err(ApplyError::StopTimeout {
      timeout: options.timeout,
      pending: pending.iter().cloned().collect(),
    }),
  };

  if result.is_err() {
    join_set.abort_all();
  }
  result
}
