//! Shared helpers for library integration tests.

use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

pub const PAPER_MARKER: &str = "io/papermc/paperclip/Paperclip.class";
pub const VELOCITY_MARKER: &str = "com/velocitypowered/proxy/Velocity.class";

pub fn jar(entries: &[(&str, &[u8])]) -> Vec<u8> {
  let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
  for (name, contents) in entries {
    writer.start_file(*name, SimpleFileOptions::default()).unwrap();
    writer.write_all(contents).unwrap();
  }
  writer.finish().unwrap().into_inner()
}

pub fn software(marker: &str, build: &str) -> Vec<u8> {
  jar(&[(marker, build.as_bytes())])
}

pub fn plugin(name: &str, version: &str) -> Vec<u8> {
  let yml = format!("name: {}\nversion: '{}'\nmain: org.example.{}\n", name, version, name);
  jar(&[("plugin.yml", yml.as_bytes())])
}

/// Isolated working root with `repos/`, `configs/` and `servers/`.
pub struct TestRoot {
  pub temp: TempDir,
}

impl TestRoot {
  pub fn new() -> Self {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("servers")).unwrap();
    Self { temp }
  }

  pub fn path(&self) -> &Path {
    self.temp.path()
  }

  pub fn repos_dir(&self) -> PathBuf {
    self.path().join("repos")
  }

  pub fn configs_dir(&self) -> PathBuf {
    self.path().join("configs")
  }

  pub fn location(&self, server: &str) -> PathBuf {
    self.path().join("servers").join(server)
  }

  pub fn add_artifact(&self, repo: &str, file: &str, bytes: &[u8]) -> PathBuf {
    let dir = self.repos_dir().join(repo);
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join(file);
    fs::write(&path, bytes).unwrap();
    path
  }

  pub fn install(&self, server: &str, relative: &str, bytes: &[u8]) -> PathBuf {
    let path = self.location(server).join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, bytes).unwrap();
    path
  }

  pub fn write_config(&self, server: &str, lua: &str) {
    fs::create_dir_all(self.configs_dir()).unwrap();
    fs::write(self.configs_dir().join(format!("{}.lua", server)), lua).unwrap();
  }

  pub fn write_module(&self, name: &str, lua: &str) {
    let dir = self.configs_dir().join("lua");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(format!("{}.lua", name)), lua).unwrap();
  }
}
