mod cmd;
mod output;
mod prompts;

use anyhow::Result;
use clap::{Parser, Subcommand};
use peridot_lib::consts::APP_NAME;
use tracing_subscriber::EnvFilter;

/// peridot - keep a fleet of Minecraft servers in sync with its configs
#[derive(Parser)]
#[command(name = APP_NAME)]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable debug logging
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Show pending changes without applying them
  #[command(visible_alias = "state")]
  Status {
    /// Only consider this server
    server: Option<String>,

    /// Print the plan as JSON
    #[arg(long)]
    json: bool,
  },

  /// Stop affected servers, apply pending changes, then start them again
  Apply {
    /// Only consider this server
    server: Option<String>,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    yes: bool,
  },

  /// Apply pending changes while servers keep running
  ApplyLive {
    /// Only consider this server
    server: Option<String>,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    yes: bool,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let filter = if cli.verbose {
    EnvFilter::new("debug")
  } else {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
  };
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  match cli.command {
    Commands::Status { server, json } => cmd::cmd_status(server.as_deref(), json),
    Commands::Apply { server, yes } => cmd::cmd_apply(server.as_deref(), yes),
    Commands::ApplyLive { server, yes } => cmd::cmd_apply_live(server.as_deref(), yes),
  }
}
