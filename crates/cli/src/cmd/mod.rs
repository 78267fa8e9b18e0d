mod apply;
mod apply_live;
mod status;

pub use apply::cmd_apply;
pub use apply_live::cmd_apply_live;
pub use status::cmd_status;

use anyhow::{Context, Result};
use tracing::debug;

use peridot_lib::config::{Configs, load_configs};
use peridot_lib::plan::{Plan, plan_all};
use peridot_lib::platform::paths::{configs_dir, repos_dir};
use peridot_lib::repo::load_repositories;

/// Load repositories and configs, then compute the plan.
pub(crate) fn load_plan(server: Option<&str>) -> Result<(Configs, Plan)> {
  let repos_dir = repos_dir();
  let repos =
    load_repositories(&repos_dir).with_context(|| format!("Failed to load repositories from {}", repos_dir.display()))?;

  debug!(count = repos.len(), "repositories loaded");

  let configs_dir = configs_dir();
  let configs = load_configs(&configs_dir, &repos)
    .with_context(|| format!("Failed to load configs from {}", configs_dir.display()))?;
  debug!(count = configs.len(), "configs loaded");

  let plan = plan_all(&repos, &configs, server).context("Failed to compute plan")?;
  Ok((configs, plan))
}
