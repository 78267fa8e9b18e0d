//! Load, plan and apply against a real working root.

use std::fs;

use peridot_lib::apply::apply_live;
use peridot_lib::config::load_configs;
use peridot_lib::plan::{DiffKind, PluginChange, plan_all};
use peridot_lib::repo::load_repositories;

use super::common::{PAPER_MARKER, TestRoot, VELOCITY_MARKER, plugin, software};

fn lobby_root() -> TestRoot {
  let root = TestRoot::new();
  root.add_artifact("main", "paper.jar", &software(PAPER_MARKER, "paper-2"));
  root.add_artifact("main", "Vault-1.7.2.jar", &plugin("Vault", "1.7.2"));
  root.add_artifact("main", "Essentials.jar", &plugin("Essentials", "2.20.1"));
  root.add_artifact("overrides", "Vault-1.7.3.jar", &plugin("Vault", "1.7.3"));

  root.write_module(
    "base",
    r#"return {
  repos = { "main", "overrides" },
  plugins = { "Vault", "Essentials" },
}"#,
  );
  root.write_config(
    "lobby",
    &format!(
      r#"local base = require("base")
return {{
  location = [[{}]],
  repos = base.repos,
  software = "paper",
  server_properties = {{ motd = "Lobby", ["max-players"] = 20, ["online-mode"] = false }},
  plugins = base.plugins,
}}"#,
      root.location("lobby").display()
    ),
  );

  root.install("lobby", "paper.jar", &software(PAPER_MARKER, "paper-1"));
  root.install("lobby", "server.properties", b"#Minecraft server properties\nmotd=Old\nmax-players=20\n");
  root.install("lobby", "plugins/Vault.jar", &plugin("Vault", "1.7.2"));
  root.install("lobby", "plugins/OldPlugin.jar", &plugin("OldPlugin", "0.1"));
  root
}

#[test]
fn live_apply_converges() {
  let root = lobby_root();
  let repos = load_repositories(&root.repos_dir()).unwrap();
  let configs = load_configs(&root.configs_dir(), &repos).unwrap();

  let plan = plan_all(&repos, &configs, None).unwrap();
  assert!(plan.failures.is_empty());
  assert!(plan.software.contains_key("lobby"));

  let properties: Vec<_> = plan.server_properties["lobby"]
    .iter()
    .map(|op| op.property.as_str())
    .collect();
  assert_eq!(properties, ["motd", "online-mode"]);

  let plugins = &plan.plugins["lobby"];
  assert_eq!(plugins["Vault"].change(), PluginChange::Update);
  assert_eq!(plugins["Vault"].new_version.as_deref(), Some("1.7.3"));
  assert_eq!(plugins["Essentials"].change(), PluginChange::Install);
  assert_eq!(plugins["OldPlugin"].change(), PluginChange::Remove);
  assert_eq!(plan.change_count(), 6);

  let outcome = apply_live(&plan, &configs);
  assert!(outcome.is_clean(), "{:?}", outcome.failed_writes);
  assert_eq!(outcome.applied, 5);

  let lobby = root.location("lobby");
  assert_eq!(
    fs::read_to_string(lobby.join("server.properties")).unwrap(),
    "#Minecraft server properties\nmotd=Lobby\nmax-players=20\nonline-mode=false\n"
  );
  assert!(!lobby.join("plugins/OldPlugin.jar").exists());
  assert!(!lobby.join("plugins/Vault.jar").exists());
  assert!(lobby.join("plugins/Vault-1.7.3.jar").exists());
  assert!(lobby.join("plugins/Essentials.jar").exists());

  let replan = plan_all(&repos, &configs, None).unwrap();
  assert!(replan.is_empty(), "{:?}", replan);
}

#[test]
fn proxy_ignores_server_properties() {
  let root = TestRoot::new();
  root.add_artifact("main", "velocity.jar", &software(VELOCITY_MARKER, "v1"));
  root.write_config(
    "proxy",
    &format!(
      r#"return {{
  location = [[{}]],
  repos = {{ "main" }},
  software = "velocity",
  server_properties = {{ motd = "ignored" }},
}}"#,
      root.location("proxy").display()
    ),
  );

  let repos = load_repositories(&root.repos_dir()).unwrap();
  let configs = load_configs(&root.configs_dir(), &repos).unwrap();
  let plan = plan_all(&repos, &configs, None).unwrap();

  assert!(plan.server_properties.is_empty());
  assert_eq!(plan.software["proxy"].install_path, root.location("proxy").join("velocity.jar"));
}

#[test]
fn broken_server_does_not_hide_others() {
  let root = lobby_root();
  root.write_config(
    "survival",
    &format!(
      r#"return {{
  location = [[{}]],
  repos = {{ "main" }},
  software = "paper",
}}"#,
      root.location("survival").display()
    ),
  );
  root.install("survival", "plugins/broken.jar", b"PK\x03\x04 truncated");

  let repos = load_repositories(&root.repos_dir()).unwrap();
  let configs = load_configs(&root.configs_dir(), &repos).unwrap();
  let plan = plan_all(&repos, &configs, None).unwrap();

  assert_eq!(plan.failures.len(), 1);
  assert_eq!(plan.failures[0].server, "survival");
  assert_eq!(plan.failures[0].kind, DiffKind::Plugins);
  assert!(plan.software.contains_key("survival"));
  assert!(plan.plugins.contains_key("lobby"));
}

#[test]
fn replaced_jar_with_same_file_name_survives_apply() {
  let root = TestRoot::new();
  root.add_artifact("main", "paper.jar", &software(PAPER_MARKER, "paper-1"));
  root.add_artifact("main", "Vault.jar", &plugin("Vault", "1.7.3"));
  root.write_config(
    "hub",
    &format!(
      r#"return {{
  location = [[{}]],
  repos = {{ "main" }},
  software = "paper",
  plugins = {{ "Vault" }},
}}"#,
      root.location("hub").display()
    ),
  );
  root.install("hub", "paper.jar", &software(PAPER_MARKER, "paper-1"));
  root.install("hub", "plugins/Vault.jar", &plugin("VaultLegacy", "1.0"));

  let repos = load_repositories(&root.repos_dir()).unwrap();
  let configs = load_configs(&root.configs_dir(), &repos).unwrap();
  let plan = plan_all(&repos, &configs, None).unwrap();

  let plugins = &plan.plugins["hub"];
  assert_eq!(plugins.len(), 1);
  assert_eq!(plugins["Vault"].change(), PluginChange::Install);

  let outcome = apply_live(&plan, &configs);
  assert!(outcome.is_clean(), "{:?}", outcome.failed_writes);
  assert!(root.location("hub").join("plugins/Vault.jar").exists());

  let replan = plan_all(&repos, &configs, None).unwrap();
  assert!(replan.is_empty(), "{:?}", replan);
}
