#![allow(deprecated)] // cargo_bin は assert_cmd 2.1 で非推奨

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;

fn cloudbox(root: &Path) -> Command {
    let mut cmd = Command::cargo_bin("cloudbox").unwrap();
    cmd.env("MDS_STACK_ROOT", root)
        .env_remove("CLOUDBOX_BUILD_FAILURE_POLICY")
        .env_remove("RUST_LOG");
    cmd
}

/// CLIヘルプにサブコマンドが並ぶことを確認
#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("cloudbox").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("docker compose"))
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("build"))
        .stdout(predicate::str::contains("up"))
        .stdout(predicate::str::contains("down"));
}

#[test]
fn test_cli_version() {
    let mut cmd = Command::cargo_bin("cloudbox").unwrap();
    cmd.arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("cloudbox"));
}

#[test]
fn test_build_help_lists_policy_flag() {
    let mut cmd = Command::cargo_bin("cloudbox").unwrap();
    cmd.args(["build", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--on-build-failure"));
}

/// init で settings.json を作成し、show ではパスワードを伏せる
#[test]
fn test_init_then_show_masks_password() {
    let dir = tempfile::tempdir().unwrap();

    cloudbox(dir.path())
        .args([
            "init",
            "--admin-password",
            "hunter2-secret",
            "--identity-source",
            "/src/identity/",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("settings.json"));

    let settings: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(dir.path().join("settings.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(settings["defaultAdminPassword"], "hunter2-secret");
    assert_eq!(settings["identityServiceSourceDirectory"], "/src/identity");

    cloudbox(dir.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("********"))
        .stdout(predicate::str::contains("hunter2-secret").not())
        .stdout(predicate::str::contains("/src/identity"));
}

/// 2回目の init は指定した値だけを上書きする
#[test]
fn test_init_keeps_existing_values() {
    let dir = tempfile::tempdir().unwrap();

    cloudbox(dir.path())
        .args(["init", "--admin-password", "first", "--file-source", "/src/file"])
        .assert()
        .success();
    cloudbox(dir.path())
        .args(["init", "--queue-source", "/src/queue"])
        .assert()
        .success();

    let settings: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(dir.path().join("settings.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(settings["defaultAdminPassword"], "first");
    assert_eq!(settings["fileServiceSourceDirectory"], "/src/file");
    assert_eq!(settings["queueServiceSourceDirectory"], "/src/queue");
}

#[test]
fn test_init_requires_admin_password() {
    let dir = tempfile::tempdir().unwrap();

    cloudbox(dir.path())
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--admin-password"));
}

#[test]
fn test_config_set_updates_mode() {
    let dir = tempfile::tempdir().unwrap();

    cloudbox(dir.path())
        .args(["config", "set", "dockerMinion", "localDev"])
        .assert()
        .success()
        .stdout(predicate::str::contains("dockerMinion"));

    let config: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(dir.path().join("config.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(config["dockerMinion"], "localDev");
    assert_eq!(config["identity"], "stable");
}

#[test]
fn test_config_set_rejects_unknown_values() {
    let dir = tempfile::tempdir().unwrap();

    cloudbox(dir.path())
        .args(["config", "set", "billing", "stable"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("billing"));

    cloudbox(dir.path())
        .args(["config", "set", "identity", "nightly"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nightly"));
}

/// settings.json がなければ init を案内する
#[test]
fn test_build_without_settings_fails() {
    let dir = tempfile::tempdir().unwrap();

    cloudbox(dir.path())
        .arg("build")
        .assert()
        .failure()
        .stderr(predicate::str::contains("cloudbox init"));
    assert!(!dir.path().join("docker-compose.yml").exists());
}

#[test]
fn test_build_rejects_unknown_policy() {
    let dir = tempfile::tempdir().unwrap();

    cloudbox(dir.path())
        .args(["build", "--on-build-failure", "sometimes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("sometimes"));
}

#[test]
fn test_build_rejects_unknown_policy_from_env() {
    let dir = tempfile::tempdir().unwrap();

    cloudbox(dir.path())
        .arg("build")
        .env("CLOUDBOX_BUILD_FAILURE_POLICY", "sometimes")
        .assert()
        .failure()
        .stderr(predicate::str::contains("sometimes"));
}

#[test]
fn test_up_requires_manifest() {
    let dir = tempfile::tempdir().unwrap();

    cloudbox(dir.path())
        .arg("up")
        .assert()
        .failure()
        .stderr(predicate::str::contains("cloudbox build"));
}
