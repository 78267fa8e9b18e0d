//! Test utilities for peridot-lib.
//!
//! Helpers that build synthetic jar archives carrying just the marker entries
//! the classifier looks for.

use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use zip::ZipWriter;
use zip::write::SimpleFileOptions;

pub const VANILLA_MARKER: &str = "net/minecraft/server/MinecraftServer.class";
pub const BUNDLER_MARKER: &str = "net/minecraft/bundler/Main.class";
pub const PAPER_MARKER: &str = "io/papermc/paperclip/Paperclip.class";
pub const VELOCITY_MARKER: &str = "com/velocitypowered/proxy/Velocity.class";

/// Build an in-memory zip with the given `(name, contents)` entries.
pub fn jar_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
  let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
  for (name, contents) in entries {
    writer.start_file(*name, SimpleFileOptions::default()).unwrap();
    writer.write_all(contents).unwrap();
  }
  writer.finish().unwrap().into_inner()
}

/// A software jar with a single marker class and a salt entry so that two
/// jars of the same type can differ in content.
pub fn software_jar(marker: &str, salt: &str) -> Vec<u8> {
  jar_bytes(&[(marker, b"\xca\xfe\xba\xbe"), ("META-INF/salt", salt.as_bytes())])
}

/// A plugin jar carrying a `plugin.yml` with the given identity.
pub fn plugin_jar(name: &str, version: &str) -> Vec<u8> {
  let yml = format!("name: {}\nversion: '{}'\nmain: org.example.Main\n", name, version);
  jar_bytes(&[("plugin.yml", yml.as_bytes()), ("org/example/Main.class", b"\xca\xfe")])
}

/// Write bytes to `dir/name` and return the path.
pub fn write_jar(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
  fs::create_dir_all(dir).unwrap();
  let path = dir.join(name);
  fs::write(&path, bytes).unwrap();
  path
}

/// Set a file's modification time to `secs` seconds after the epoch.
pub fn set_mtime(path: &Path, secs: u64) {
  let file = fs::File::options().write(true).open(path).unwrap();
  file
    .set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(secs))
    .unwrap();
}
