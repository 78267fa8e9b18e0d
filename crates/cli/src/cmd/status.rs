//! Implementation of the `peridot status` command.
//!
//! Prints the pending changes for every configured server without touching
//! anything.

use anyhow::Result;

use crate::output::{print_json, print_plan};

pub fn cmd_status(server: Option<&str>, json: bool) -> Result<()> {
  let (_, plan) = super::load_plan(server)?;

  if json {
    print_json(&plan)?;
  } else {
    print_plan(&plan);
  }
  Ok(())
}
