//! Implementation of the `peridot apply` command.
//!
//! Stops every affected server through the process-control socket, waits for
//! all of them to go down, writes the plan and starts them again.

use std::sync::Arc;

use anyhow::{Context, Result};

use peridot_lib::apply::{RestartOptions, apply_restart};
use peridot_lib::control::UnixSocketClient;
use peridot_lib::platform::paths::control_socket;

use crate::output::{print_info, print_outcome, print_plan, print_success};
use crate::prompts::{Confirmation, confirm};

pub fn cmd_apply(server: Option<&str>, yes: bool) -> Result<()> {
  let (configs, plan) = super::load_plan(server)?;
  print_plan(&plan);

  if plan.is_empty() {
    return Ok(());
  }

  println!();
  if confirm("Proceed to apply updates?", yes)? == Confirmation::Aborted {
    print_info("Aborting update.");
    return Ok(());
  }

  let socket = control_socket();
  let client = Arc::new(UnixSocketClient::new(&socket));
  print_info(&format!(
    "Stopping {} server(s) via {}",
    plan.affected_servers().len(),
    socket.display()
  ));

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let outcome = rt
    .block_on(apply_restart(&plan, &configs, client, RestartOptions::default()))
    .context("Apply failed")?;

  print_outcome(&outcome);
  if outcome.is_clean() {
    print_success("All updates have been applied successfully!");
  }
  Ok(())
}
