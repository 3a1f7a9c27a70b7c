// Binary tests for paths that never reach the container engine.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn wp_manager(workspace: &Path) -> Command {
    let mut cmd = Command::cargo_bin("wp-manager").unwrap();
    cmd.env("WP_WORKSPACE_DIR", workspace)
        .env("WP_LOG_OUTPUT", "none")
        .env("NO_COLOR", "1");
    cmd
}

fn initialized() -> TempDir {
    let dir = TempDir::new().unwrap();
    wp_manager(dir.path())
        .args(["init", "demo"])
        .assert()
        .success();
    dir
}

#[test]
fn help_lists_the_command_surface() {
    let dir = TempDir::new().unwrap();
    wp_manager(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("create")
                .and(predicate::str::contains("clone"))
                .and(predicate::str::contains("logs"))
                .and(predicate::str::contains("boot")),
        );
}

#[test]
fn init_writes_a_multi_instance_workspace() {
    let dir = TempDir::new().unwrap();
    wp_manager(dir.path())
        .args(["init", "demo"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Initialized multi-instance workspace 'demo'",
        ));

    let doc = fs::read_to_string(dir.path().join("wp-workspace.json")).unwrap();
    assert!(doc.contains("\"workspaceName\": \"demo\""));
    assert!(doc.contains("\"multi-instance\""));
    assert!(dir.path().join("instances").is_dir());
}

#[test]
fn workspace_flag_overrides_the_environment() {
    let env_dir = TempDir::new().unwrap();
    let flag_dir = TempDir::new().unwrap();
    wp_manager(env_dir.path())
        .args(["init", "demo", "--workspace"])
        .arg(flag_dir.path())
        .assert()
        .success();

    assert!(flag_dir.path().join("wp-workspace.json").is_file());
    assert!(!env_dir.path().join("wp-workspace.json").exists());
}

#[test]
fn init_in_workspace_mode_lays_out_the_site() {
    let dir = TempDir::new().unwrap();
    wp_manager(dir.path())
        .args(["init", "shop", "--type", "workspace", "57", "81", "apache"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Port:       8000"));

    let compose = fs::read_to_string(dir.path().join("site/docker-compose.yml")).unwrap();
    assert!(compose.contains("\"8000:80\""));
    let metadata = fs::read_to_string(dir.path().join("site/instance.env")).unwrap();
    assert!(metadata.contains("NAME=shop\n"));
    assert!(metadata.contains("PORT=8000\n"));
}

#[test]
fn second_init_is_rejected_and_leaves_the_document_alone() {
    let dir = initialized();
    let before = fs::read(dir.path().join("wp-workspace.json")).unwrap();

    wp_manager(dir.path())
        .args(["init", "other", "--type", "workspace"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("already initialized"));

    assert_eq!(fs::read(dir.path().join("wp-workspace.json")).unwrap(), before);
    assert!(!dir.path().join("site").exists());
}

#[test]
fn invalid_workspace_type_is_rejected() {
    let dir = TempDir::new().unwrap();
    wp_manager(dir.path())
        .args(["init", "demo", "--type", "cluster"])
        .assert()
        .failure();
    assert!(!dir.path().join("wp-workspace.json").exists());
}

#[test]
fn create_with_invalid_webserver_changes_nothing() {
    let dir = initialized();
    let before = fs::read(dir.path().join("wp-workspace.json")).unwrap();

    wp_manager(dir.path())
        .args(["create", "alpha", "80", "83", "lighttpd"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("❌"));

    assert_eq!(fs::read(dir.path().join("wp-workspace.json")).unwrap(), before);
    assert!(!dir.path().join("instances/alpha").exists());
}

#[test]
fn remove_without_force_needs_a_terminal() {
    let dir = initialized();
    wp_manager(dir.path())
        .args(["remove", "alpha"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Refusing to remove 'alpha'"));
}

#[test]
fn unknown_clone_strategy_is_rejected() {
    let dir = initialized();
    wp_manager(dir.path())
        .args(["clone", "alpha", "beta", "hardlink"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown clone strategy 'hardlink'"));
}

#[test]
fn unknown_log_service_is_rejected() {
    let dir = initialized();
    wp_manager(dir.path())
        .args(["logs", "alpha", "redis"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown service 'redis'"));
}
