//! `server.properties` diff.
//!
//! This is a merge: only the properties named in the config are compared,
//! everything else on disk is left alone.

use std::collections::BTreeMap;
use std::fs;
use std::io;

use serde::Serialize;

use super::PlanError;
use crate::config::Config;
use crate::consts::SERVER_PROPERTIES_FILE;

/// Set one property to a new value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerPropertiesUpdateOperation {
  pub property: String,
  /// On-disk value, `None` when the key is absent.
  pub old_value: Option<String>,
  pub new_value: String,
}

/// Parse `key=value` lines. Blank lines and `#` comments are skipped, as are
/// lines without `=`. Keys and values are trimmed.
pub fn parse_properties(content: &str) -> BTreeMap<String, String> {
  content
    .lines()
    .map(str::trim)
    .filter(|line| !line.is_empty() && !line.starts_with('#'))
    .filter_map(|line| line.split_once('='))
    .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
    .collect()
}

/// Compute the property changes for one server.
///
/// Proxies have no `server.properties`, so their result is always empty. A
/// missing file is treated as empty: every desired property is added.
pub fn server_properties_diff(config: &Config) -> Result<Vec<ServerPropertiesUpdateOperation>, PlanError> {
  if !config.software.has_server_properties() || config.server_properties.is_empty() {
    return Ok(Vec::new());
  }

  let path = config.location.join(SERVER_PROPERTIES_FILE);
  let on_disk = match fs::read_to_string(&path) {
    Ok(content) => parse_properties(&content),
    Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
    Err(source) => return Err(PlanError::ReadFile { path, source }),
  };

  let operations = config
    .server_properties
    .iter()
    .filter_map(|(property, desired)| {
      let current = on_disk.get(property);
      if current.is_some_and(|value| desired.matches(value)) {
        return None;
      }
      Some(ServerPropertiesUpdateOperation {
        property: property.clone(),
        old_value: current.cloned(),
        new_value: desired.to_string(),
      })
    })
    .collect();

  Ok(operations)
}
