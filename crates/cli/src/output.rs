//! Terminal output for plans and apply results.
//!
//! Logs go to stderr through tracing; everything here is meant for the
//! operator and goes to stdout unless it is a warning.

use anyhow::Context;
use owo_colors::{OwoColorize, Stream};

use peridot_lib::apply::ApplyOutcome;
use peridot_lib::plan::{Plan, PluginChange};

pub mod symbols {
  pub const SUCCESS: &str = "✓";
  pub const WARNING: &str = "⚠";
  pub const INFO: &str = "•";
  pub const ARROW: &str = "→";
  pub const ADD: &str = "+";
  pub const MODIFY: &str = "~";
  pub const REMOVE: &str = "-";
}

const MISSING: &str = "(missing)";
const REMOVED: &str = "(removed)";
const SEPARATOR: &str = "==============================";

/// Placeholder for an absent previous value.
fn or_missing(value: Option<&str>) -> &str {
  value.unwrap_or(MISSING)
}

/// Placeholder for an absent new value.
fn or_removed(value: Option<&str>) -> &str {
  value.unwrap_or(REMOVED)
}

pub fn print_success(message: &str) {
  println!(
    "{} {}",
    symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()),
    message
  );
}

pub fn print_warning(message: &str) {
  eprintln!(
    "{} {}",
    symbols::WARNING.if_supports_color(Stream::Stderr, |s| s.yellow()),
    message.if_supports_color(Stream::Stderr, |s| s.yellow())
  );
}

pub fn print_info(message: &str) {
  println!(
    "{} {}",
    symbols::INFO.if_supports_color(Stream::Stdout, |s| s.blue()),
    message
  );
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?;
  println!("{}", json);
  Ok(())
}

fn change_symbol(change: PluginChange) -> String {
  match change {
    PluginChange::Install => symbols::ADD.if_supports_color(Stream::Stdout, |s| s.green()).to_string(),
    PluginChange::Update => symbols::MODIFY
      .if_supports_color(Stream::Stdout, |s| s.yellow())
      .to_string(),
    PluginChange::Remove => symbols::REMOVE.if_supports_color(Stream::Stdout, |s| s.red()).to_string(),
  }
}

/// Preview of every pending change, grouped by diff kind then server.
pub fn print_plan(plan: &Plan) {
  if plan.software.is_empty() {
    println!("Software: Up to date");
  } else {
    println!("Pending software updates:");
    for (server, op) in &plan.software {
      println!(
        "  {}: {} ({} {} {})",
        server.if_supports_color(Stream::Stdout, |s| s.bold()),
        op.software_type,
        or_missing(op.prev_hash.as_ref().map(|h| h.short())),
        symbols::ARROW,
        op.new_hash.short()
      );
    }
  }
  println!("{}", SEPARATOR);

  if plan.server_properties.is_empty() {
    println!("Server properties: Up to date");
  } else {
    println!("Pending server properties updates:");
    for (server, ops) in &plan.server_properties {
      println!("  {}", server.if_supports_color(Stream::Stdout, |s| s.bold()));
      for op in ops {
        println!(
          "    {}: {} {} {}",
          op.property,
          or_missing(op.old_value.as_deref()),
          symbols::ARROW,
          op.new_value
        );
      }
    }
  }
  println!("{}", SEPARATOR);

  if plan.plugins.is_empty() {
    println!("Plugins: Up to date");
  } else {
    println!("Pending plugin updates:");
    for (server, ops) in &plan.plugins {
      println!("  {}", server.if_supports_color(Stream::Stdout, |s| s.bold()));
      for op in ops.values() {
        println!(
          "    {} {}: {} {} {}",
          change_symbol(op.change()),
          op.plugin_name,
          or_missing(op.prev_version.as_deref()),
          symbols::ARROW,
          or_removed(op.new_version.as_deref())
        );
      }
    }
  }

  for failure in &plan.failures {
    print_warning(&format!(
      "{}: could not compute {} changes: {}",
      failure.server, failure.kind, failure.message
    ));
  }
}

pub fn print_outcome(outcome: &ApplyOutcome) {
  for failure in &outcome.failed_writes {
    let what = match &failure.target {
      Some(target) => format!("{} {}", failure.kind, target),
      None => failure.kind.to_string(),
    };
    print_warning(&format!("{}: failed to update {}: {}", failure.server, what, failure.message));
  }
  if !outcome.start_failures.is_empty() {
    print_warning(&format!(
      "failed to start, restart manually: {}",
      outcome.start_failures.join(", ")
    ));
  }
}
