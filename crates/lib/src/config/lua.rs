//! Evaluating a server's Lua config file.
//!
//! A server config is a Lua chunk returning a table:
//!
//! ```lua
//! local common = require("common")
//!
//! return {
//!   location = "/srv/minecraft/lobby",
//!   repos = { "main", "lobby" },
//!   software = "paper",
//!   server_properties = {
//!     ["max-players"] = 50,
//!     ["online-mode"] = true,
//!     motd = common.motd,
//!   },
//!   plugins = { "LuckPerms", "ViaVersion" },
//! }
//! ```
//!
//! Shared modules are resolved from the `lua/` folder next to the config.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use mlua::prelude::*;
use mlua::{DeserializeOptions, LuaSerdeExt};
use serde::Deserialize;
use tracing::debug;

use super::ConfigError;
use crate::types::ScalarValue;

/// A config as returned by Lua, before validation.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawConfig {
  #[serde(default)]
  pub location: String,
  #[serde(default)]
  pub repos: Vec<String>,
  #[serde(default)]
  pub software: String,
  #[serde(default, alias = "serverProperties")]
  pub server_properties: BTreeMap<String, ScalarValue>,
  #[serde(default)]
  pub plugins: Vec<String>,
}

/// Create a fresh Lua state for evaluating the config of `server`.
///
/// Registers the `peridot` global (`peridot.server`, `peridot.env(name)`) and
/// prepends `<config_dir>/lua/` to `package.path`.
pub fn create_runtime(config_dir: &Path, server: &str) -> LuaResult<Lua> {
  let lua = Lua::new();

  let package: LuaTable = lua.globals().get("package")?;
  let current_path: String = package.get("path")?;
  let lua_dir = config_dir.join("lua").to_string_lossy().replace('\\', "/");
  package.set(
    "path",
    format!("{dir}/?.lua;{dir}/?/init.lua;{current}", dir = lua_dir, current = current_path),
  )?;

  let peridot = lua.create_table()?;
  peridot.set("server", server)?;
  let env = lua.create_function(|_, name: String| Ok(std::env::var(name).ok()))?;
  peridot.set("env", env)?;
  lua.globals().set("peridot", peridot)?;

  Ok(lua)
}

/// Evaluate the config file at `path` for `server`.
pub fn evaluate_config(path: &Path, server: &str) -> Result<RawConfig, ConfigError> {
  let content = fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
    path: path.to_path_buf(),
    source,
  })?;
  let config_dir = path.parent().unwrap_or(Path::new("."));

  let lua_err = |e: LuaError| ConfigError::Lua {
    path: path.to_path_buf(),
    message: e.to_string(),
  };

  let lua = create_runtime(config_dir, server).map_err(lua_err)?;
  let value = lua
    .load(&content)
    .set_name(format!("@{}", path.display()))
    .eval::<LuaValue>()
    .map_err(lua_err)?;

  if !value.is_table() {
    return Err(lua_err(LuaError::external("config must return a table")));
  }

  let options = DeserializeOptions::new().deny_unsupported_types(false);
  let raw: RawConfig = lua.from_value_with(value, options).map_err(lua_err)?;
  debug!(server, path = %path.display(), "evaluated config");
  Ok(raw)
}
