//! Plugin descriptor parsing.
//!
//! `plugin.yml`, `bungee.yml` and `velocity-plugin.json` all carry a top-level
//! `name` and `version`. JSON is read through the YAML parser, which accepts it.

use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use super::ArchiveError;

/// Identity of a plugin as declared by its descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginMetadata {
  pub name: String,
  pub version: String,
}

#[derive(Deserialize)]
struct RawMetadata {
  #[serde(default)]
  name: Option<Value>,
  #[serde(default)]
  version: Option<Value>,
}

/// Parse a descriptor blob into `{name, version}`.
///
/// `file_name` only labels the error. Both fields must be present and
/// non-empty; numeric versions such as `version: 2` are accepted as text.
pub fn parse_metadata(file_name: &str, blob: &[u8]) -> Result<PluginMetadata, ArchiveError> {
  let invalid = |reason: String| ArchiveError::InvalidMetadata {
    file: file_name.to_string(),
    reason,
  };

  let raw: RawMetadata = serde_yaml::from_slice(blob).map_err(|e| invalid(e.to_string()))?;

  let name = raw.name.as_ref().and_then(scalar_to_string).unwrap_or_default();
  let version = raw.version.as_ref().and_then(scalar_to_string).unwrap_or_default();

  if name.is_empty() || version.is_empty() {
    return Err(invalid("missing name or version".to_string()));
  }

  Ok(PluginMetadata { name, version })
}

fn scalar_to_string(value: &Value) -> Option<String> {
  match value {
    Value::String(s) => Some(s.trim().to_string()),
    Value::Number(n) => Some(n.to_string()),
    Value::Bool(b) => Some(b.to_string()),
    _ => None,
  }
}
