use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Server software kinds recognized in repositories and configs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoftwareType {
  Vanilla,
  Paper,
  Velocity,
}

impl SoftwareType {
  pub const ALL: [SoftwareType; 3] = [SoftwareType::Vanilla, SoftwareType::Paper, SoftwareType::Velocity];

  /// Returns the lowercase identifier, also used as the installed jar's stem.
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Vanilla => "vanilla",
      Self::Paper => "paper",
      Self::Velocity => "velocity",
    }
  }

  /// Whether servers running this software read a `server.properties` file.
  /// Proxies do not.
  pub fn has_server_properties(&self) -> bool {
    matches!(self, Self::Vanilla | Self::Paper)
  }

  /// File name of the installed jar, e.g. `paper.jar`.
  pub fn jar_name(&self) -> String {
    format!("{}.jar", self.as_str())
  }
}

impl fmt::Display for SoftwareType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported software type '{0}': must be one of 'vanilla', 'paper', or 'velocity'")]
pub struct UnknownSoftwareType(pub String);

impl FromStr for SoftwareType {
  type Err = UnknownSoftwareType;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "vanilla" => Ok(Self::Vanilla),
      "paper" => Ok(Self::Paper),
      "velocity" => Ok(Self::Velocity),
      other => Err(UnknownSoftwareType(other.to_string())),
    }
  }
}

/// A desired `server.properties` value as written in a server config.
///
/// Comparison against the on-disk string is type-aware, see [`ScalarValue::matches`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarValue {
  Bool(bool),
  Number(f64),
  String(String),
}

impl ScalarValue {
  /// Whether the on-disk string form already represents this value.
  ///
  /// - numbers compare numerically; a non-numeric on-disk value never matches
  /// - booleans compare against `"true"` / `"false"`
  /// - strings compare verbatim
  pub fn matches(&self, on_disk: &str) -> bool {
    match self {
      ScalarValue::String(s) => s == on_disk,
      ScalarValue::Number(n) => on_disk.parse::<f64>().map(|v| v == *n).unwrap_or(false),
      ScalarValue::Bool(b) => on_disk == if *b { "true" } else { "false" },
    }
  }
}

/// The canonical string written to `server.properties`.
///
/// Whole numbers print without a fractional part (`30`, not `30.0`).
impl fmt::Display for ScalarValue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ScalarValue::String(s) => write!(f, "{}", s),
      ScalarValue::Number(n) => write!(f, "{}", n),
      ScalarValue::Bool(b) => write!(f, "{}", b),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn software_type_parses_known_names() {
    for software in SoftwareType::ALL {
      assert_eq!(software.as_str().parse::<SoftwareType>().unwrap(), software);
    }
    assert!("forge".parse::<SoftwareType>().is_err());
  }

  #[test]
  fn proxies_have_no_server_properties() {
    assert!(SoftwareType::Paper.has_server_properties());
    assert!(SoftwareType::Vanilla.has_server_properties());
    assert!(!SoftwareType::Velocity.has_server_properties());
  }

  #[test]
  fn number_matches_numerically() {
    let value = ScalarValue::Number(20.0);
    assert!(value.matches("20"));
    assert!(value.matches("20.0"));
    assert!(!value.matches("21"));
    assert!(!value.matches("twenty"));
    assert!(!value.matches(""));
  }

  #[test]
  fn bool_matches_canonical_form() {
    assert!(ScalarValue::Bool(true).matches("true"));
    assert!(!ScalarValue::Bool(true).matches("TRUE"));
    assert!(ScalarValue::Bool(false).matches("false"));
  }

  #[test]
  fn string_matches_verbatim() {
    assert!(ScalarValue::String("A Minecraft Server".into()).matches("A Minecraft Server"));
    assert!(!ScalarValue::String("20".into()).matches("20.0"));
  }

  #[test]
  fn display_drops_trailing_zero() {
    assert_eq!(ScalarValue::Number(30.0).to_string(), "30");
    assert_eq!(ScalarValue::Number(0.5).to_string(), "0.5");
    assert_eq!(ScalarValue::Bool(false).to_string(), "false");
  }

  #[test]
  fn deserializes_untagged() {
    let values: Vec<ScalarValue> = serde_json::from_str(r#"[true, 20, 1.5, "hard"]"#).unwrap();
    assert_eq!(
      values,
      vec![
        ScalarValue::Bool(true),
        ScalarValue::Number(20.0),
        ScalarValue::Number(1.5),
        ScalarValue::String("hard".into()),
      ]
    );
  }
}
