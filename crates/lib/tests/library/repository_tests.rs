use std::fs;

use peridot_lib::repo::{RepoError, load_repositories};
use peridot_lib::types::SoftwareType;

use super::common::{PAPER_MARKER, TestRoot, jar, plugin, software};

#[test]
fn every_folder_is_a_repository() {
  let root = TestRoot::new();
  root.add_artifact("main", "paper.jar", &software(PAPER_MARKER, "1"));
  root.add_artifact("main", "Vault.jar", &plugin("Vault", "1.7.3"));
  root.add_artifact("main", "library.jar", &jar(&[("com/example/Lib.class", b"")]));
  root.add_artifact("main", "README.md", b"not a jar");
  root.add_artifact("extras", "LuckPerms.jar", &plugin("LuckPerms", "5.4"));
  fs::write(root.repos_dir().join("stray.jar"), b"ignored").unwrap();

  let repos = load_repositories(&root.repos_dir()).unwrap();

  assert_eq!(repos.len(), 2);
  let main = repos.get("main").unwrap();
  assert!(main.software.contains_key(&SoftwareType::Paper));
  assert_eq!(main.plugins.keys().collect::<Vec<_>>(), ["Vault"]);
  assert_eq!(repos.get("extras").unwrap().plugins["LuckPerms"].version, "5.4");
}

#[test]
fn last_listed_repository_wins() {
  let root = TestRoot::new();
  root.add_artifact("stable", "paper.jar", &software(PAPER_MARKER, "stable"));
  root.add_artifact("testing", "paper.jar", &software(PAPER_MARKER, "testing"));
  let repos = load_repositories(&root.repos_dir()).unwrap();

  let order = |names: &[&str]| names.iter().map(|n| n.to_string()).collect::<Vec<_>>();
  let testing = repos.get("testing").unwrap().software[&SoftwareType::Paper].checksum.clone();
  let stable = repos.get("stable").unwrap().software[&SoftwareType::Paper].checksum.clone();

  assert_eq!(
    repos
      .resolve_software(&order(&["stable", "testing"]), SoftwareType::Paper)
      .unwrap()
      .checksum,
    testing
  );
  assert_eq!(
    repos
      .resolve_software(&order(&["testing", "stable"]), SoftwareType::Paper)
      .unwrap()
      .checksum,
    stable
  );
}

#[test]
fn corrupt_archive_fails_the_whole_load() {
  let root = TestRoot::new();
  root.add_artifact("main", "paper.jar", &software(PAPER_MARKER, "1"));
  root.add_artifact("main", "broken.jar", b"this is not a zip file");

  let err = load_repositories(&root.repos_dir()).unwrap_err();

  assert!(matches!(err, RepoError::Load { ref name, .. } if name == "main"));
}

#[test]
fn missing_repos_folder_is_empty() {
  let root = TestRoot::new();
  assert!(load_repositories(&root.repos_dir()).unwrap().is_empty());
}
