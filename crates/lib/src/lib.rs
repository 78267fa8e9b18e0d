//! peridot-lib: state reconciliation for a fleet of Minecraft servers.
//!
//! A run goes through these stages:
//! - `repo`: index the jars of every artifact repository
//! - `config`: load and validate the desired state of each server
//! - `plan`: diff desired against on-disk state
//! - `apply`: write the plan, live or behind a stop/start cycle driven by `control`

pub mod apply;
pub mod archive;
pub mod config;
pub mod consts;
pub mod control;
pub mod error;
pub mod plan;
pub mod platform;
pub mod repo;
pub mod types;
pub mod util;
