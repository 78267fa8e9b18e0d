//! Repository index types.
//!
//! A [`Repository`] is built once from one folder of jars and never mutated
//! afterwards. It holds at most one [`Software`] per [`SoftwareType`] and at
//! most one [`Plugin`] per plugin name.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::SoftwareType;
use crate::util::hash::Checksum;

/// A server software jar available in a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Software {
  pub software_type: SoftwareType,
  pub source_path: PathBuf,
  pub last_modified: DateTime<Utc>,
  pub checksum: Checksum,
}

/// A plugin jar available in a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Plugin {
  pub name: String,
  pub source_path: PathBuf,
  pub version: String,
  pub checksum: Checksum,
}

/// A named, immutable index of one repository folder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Repository {
  pub name: String,
  pub software: BTreeMap<SoftwareType, Software>,
  pub plugins: BTreeMap<String, Plugin>,
}

impl Repository {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      ..Default::default()
    }
  }
}
