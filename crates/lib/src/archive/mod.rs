//! Jar classification.
//!
//! An archive is opened as a zip directory listing (nothing is extracted) and
//! its entry names are matched against well-known markers:
//!
//! | Marker                                        | Classification |
//! |-----------------------------------------------|----------------|
//! | `plugin.yml`, `bungee.yml`, `velocity-plugin.json` | plugin    |
//! | `com/velocitypowered/proxy/Velocity.class`    | velocity       |
//! | `io/papermc/paperclip/Paperclip.class`        | paper          |
//! | `net/minecraft/server/MinecraftServer.class`, `net/minecraft/bundler/Main.class` | vanilla |
//!
//! Plugin descriptors take priority over every software marker.

mod metadata;

use std::io::{Cursor, Read};

use thiserror::Error;
use zip::ZipArchive;
use zip::result::ZipError;

pub use metadata::{PluginMetadata, parse_metadata};

use crate::types::SoftwareType;

const PLUGIN_DESCRIPTORS: [&str; 3] = ["plugin.yml", "bungee.yml", "velocity-plugin.json"];
const VELOCITY_MARKER: &str = "com/velocitypowered/proxy/Velocity.class";
const PAPER_MARKER: &str = "io/papermc/paperclip/Paperclip.class";
const VANILLA_MARKERS: [&str; 2] = [
  "net/minecraft/server/MinecraftServer.class",
  "net/minecraft/bundler/Main.class",
];

/// Upper bound on a plugin descriptor, whatever its entry header declares.
pub const MAX_DESCRIPTOR_BYTES: u64 = 1024 * 1024;

/// Errors produced while inspecting a single archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
  /// The bytes are not a readable zip container.
  #[error("corrupt archive: {0}")]
  Corrupt(#[from] ZipError),

  /// A readable zip without any known marker.
  #[error("unrecognized archive: no software or plugin markers found")]
  Unrecognized,

  /// The plugin descriptor is unparseable or lacks a name or version.
  #[error("invalid metadata for plugin {file}: {reason}")]
  InvalidMetadata { file: String, reason: String },

  #[error("plugin descriptor {descriptor} exceeds {limit} bytes")]
  DescriptorTooLarge { descriptor: String, limit: u64 },
}

impl ArchiveError {
  /// Whether the offending artifact can be skipped without failing the caller.
  ///
  /// Structural failures (a corrupt zip) are never skippable.
  pub fn is_skippable(&self) -> bool {
    matches!(
      self,
      ArchiveError::Unrecognized | ArchiveError::InvalidMetadata { .. } | ArchiveError::DescriptorTooLarge { .. }
    )
  }
}

/// Result of [`classify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveKind {
  Software(SoftwareType),
  /// A plugin, with the raw bytes of its descriptor.
  Plugin { descriptor: String, metadata: Vec<u8> },
}

/// A classified archive with its plugin descriptor already parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Artifact {
  Software(SoftwareType),
  Plugin(PluginMetadata),
}

/// Classify archive bytes. Pure: identical bytes always yield identical results.
pub fn classify(bytes: &[u8]) -> Result<ArchiveKind, ArchiveError> {
  let mut archive = ZipArchive::new(Cursor::new(bytes))?;

  let mut descriptor: Option<String> = None;
  let mut velocity = false;
  let mut paper = false;
  let mut vanilla = false;

  for name in archive.file_names() {
    if PLUGIN_DESCRIPTORS.contains(&name) {
      descriptor = Some(name.to_string());
      break;
    }
    match name {
      VELOCITY_MARKER => velocity = true,
      PAPER_MARKER => paper = true,
      n if VANILLA_MARKERS.contains(&n) => vanilla = true,
      _ => {}
    }
  }

  if let Some(descriptor) = descriptor {
    let entry = archive.by_name(&descriptor)?;
    let mut metadata = Vec::with_capacity(entry.size().min(MAX_DESCRIPTOR_BYTES) as usize);
    entry
      .take(MAX_DESCRIPTOR_BYTES + 1)
      .read_to_end(&mut metadata)
      .map_err(ZipError::Io)?;
    if metadata.len() as u64 > MAX_DESCRIPTOR_BYTES {
      return Err(ArchiveError::DescriptorTooLarge {
        descriptor,
        limit: MAX_DESCRIPTOR_BYTES,
      });
    }
    return Ok(ArchiveKind::Plugin { descriptor, metadata });
  }

  if velocity {
    Ok(ArchiveKind::Software(SoftwareType::Velocity))
  } else if paper {
    Ok(ArchiveKind::Software(SoftwareType::Paper))
  } else if vanilla {
    Ok(ArchiveKind::Software(SoftwareType::Vanilla))
  } else {
    Err(ArchiveError::Unrecognized)
  }
}

/// Classify an archive and parse its plugin descriptor if it has one.
///
/// `file_name` is only used to label metadata errors.
pub fn inspect(file_name: &str, bytes: &[u8]) -> Result<Artifact, ArchiveError> {
  match classify(bytes)? {
    ArchiveKind::Software(software) => Ok(Artifact::Software(software)),
    ArchiveKind::Plugin { metadata, .. } => parse_metadata(file_name, &metadata).map(Artifact::Plugin),
  }
}
