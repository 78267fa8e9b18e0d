//! Process-control client.
//!
//! Servers are started and stopped through an external supervisor reachable
//! over HTTP/1.1 on a unix socket. [`ProcessControl`] is the seam the apply
//! orchestrator talks to; [`UnixSocketClient`] is the real implementation.
//!
//! | Call                         | Request                             |
//! |------------------------------|-------------------------------------|
//! | [`ProcessControl::servers`]   | `GET /servers?extrainfo=true`       |
//! | [`ProcessControl::status`]    | `GET /server/<name>`                |
//! | [`ProcessControl::start`]     | `POST /server/<name>`, body `START` |
//! | [`ProcessControl::terminate`] | `POST /server/<name>`, body `TERM`  |

mod client;

use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::io;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use client::UnixSocketClient;

/// Process state as reported by the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ServerStatus {
  Stopped,
  Running,
  Crashed,
}

impl ServerStatus {
  /// Stopped and crashed servers are both safe to write to.
  pub fn is_down(self) -> bool {
    matches!(self, ServerStatus::Stopped | ServerStatus::Crashed)
  }
}

impl TryFrom<u8> for ServerStatus {
  type Error = ControlError;

  fn try_from(code: u8) -> Result<Self, Self::Error> {
    match code {
      0 => Ok(ServerStatus::Stopped),
      1 => Ok(ServerStatus::Running),
      2 => Ok(ServerStatus::Crashed),
      other => Err(ControlError::UnknownStatus(other)),
    }
  }
}

impl From<ServerStatus> for u8 {
  fn from(status: ServerStatus) -> u8 {
    match status {
      ServerStatus::Stopped => 0,
      ServerStatus::Running => 1,
      ServerStatus::Crashed => 2,
    }
  }
}

impl std::fmt::Display for ServerStatus {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      ServerStatus::Stopped => write!(f, "stopped"),
      ServerStatus::Running => write!(f, "running"),
      ServerStatus::Crashed => write!(f, "crashed"),
    }
  }
}

#[derive(Debug, Error)]
pub enum ControlError {
  #[error("failed to connect to {path}: {source}")]
  Connect {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("process control connection failed: {0}")]
  Hyper(#[from] hyper::Error),

  #[error("invalid process control request: {0}")]
  Request(#[from] hyper::http::Error),

  #[error("failed to read response body: {0}")]
  Body(#[source] Box<dyn StdError + Send + Sync>),

  #[error("request timed out after {0:?}")]
  Timeout(std::time::Duration),

  #[error("response error {status} {reason}")]
  Http { status: u16, reason: String },

  #[error("failed to decode response: {0}")]
  Decode(#[from] serde_json::Error),

  #[error("unknown server status code {0}")]
  UnknownStatus(u8),
}

/// Remote control over server processes.
#[async_trait]
pub trait ProcessControl: Send + Sync {
  /// Every supervised server with its status.
  async fn servers(&self) -> Result<BTreeMap<String, ServerStatus>, ControlError>;

  async fn status(&self, server: &str) -> Result<ServerStatus, ControlError>;

  async fn start(&self, server: &str) -> Result<(), ControlError>;

  /// Ask the server to stop. Returns once the signal is accepted, not once
  /// the process has exited.
  async fn terminate(&self, server: &str) -> Result<(), ControlError>;
}
