//! Implementation of the `peridot apply-live` command.

use anyhow::Result;

use peridot_lib::apply::apply_live;

use crate::output::{print_info, print_outcome, print_plan, print_success};
use crate::prompts::{Confirmation, confirm};

pub fn cmd_apply_live(server: Option<&str>, yes: bool) -> Result<()> {
  let (configs, plan) = super::load_plan(server)?;
  print_plan(&plan);

  if plan.is_empty() {
    return Ok(());
  }

  println!();
  if confirm("Proceed to apply updates live?", yes)? == Confirmation::Aborted {
    print_info("Aborting live update.");
    return Ok(());
  }

  let outcome = apply_live(&plan, &configs);

  print_outcome(&outcome);
  if outcome.is_clean() {
    print_success(&format!("Applied {} change(s) live.", outcome.applied));
  }
  Ok(())
}
