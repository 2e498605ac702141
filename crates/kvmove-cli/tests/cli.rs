//! End-to-end tests running the compiled `kvmove` binary.
//!
//! None of these reach a server: they cover argument handling, configuration
//! validation and failures that happen before or instead of network traffic.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const ENV_VARS: &[&str] = &[
    "OLD_ADDR",
    "OLD_TOKEN",
    "OLD_TRANSIT_KEY",
    "NEW_ADDR",
    "NEW_TOKEN",
    "NEW_TRANSIT_KEY",
    "KV_MOUNT",
    "RUST_LOG",
];

/// Fresh command with a scrubbed environment and a config path inside `tempdir`.
#[allow(deprecated)]
fn kvmove_cmd(tempdir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("kvmove").unwrap();
    for var in ENV_VARS {
        cmd.env_remove(var);
    }
    cmd.env("HOME", tempdir.path());
    cmd.current_dir(tempdir.path());
    cmd.arg("--config").arg(tempdir.path().join("config.toml"));
    cmd
}

#[test]
fn test_version_prints_package_version() {
    let temp = TempDir::new().unwrap();
    kvmove_cmd(&temp)
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_both_mode_flags_exit_with_config_error() {
    let temp = TempDir::new().unwrap();
    kvmove_cmd(&temp)
        .args(["--mount", "secret", "--export-only", "--import-only"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("export-only and import-only"));
}

#[test]
fn test_missing_mount_exits_with_config_error() {
    let temp = TempDir::new().unwrap();
    kvmove_cmd(&temp)
        .args(["--old-addr", "http://127.0.0.1:9", "--old-token", "t"])
        .args(["--old-transit", "k", "--export-only"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("mount"));
}

#[test]
fn test_missing_source_token_is_reported_before_export() {
    let temp = TempDir::new().unwrap();
    kvmove_cmd(&temp)
        .args(["--mount", "secret", "--old-addr", "http://127.0.0.1:9"])
        .args(["--old-transit", "k", "--export-only"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("OLD_TOKEN"));
    assert!(!temp.path().join("secrets_export.json").exists());
}

#[test]
fn test_environment_variables_supply_settings() {
    let temp = TempDir::new().unwrap();
    // Everything present via env; the unreachable server makes the export fail with exit 1.
    kvmove_cmd(&temp)
        .env("OLD_ADDR", "http://127.0.0.1:9")
        .env("OLD_TOKEN", "t")
        .env("OLD_TRANSIT_KEY", "k")
        .env("KV_MOUNT", "secret")
        .arg("--export-only")
        .assert()
        .code(1);
    assert!(!temp.path().join("secrets_export.json").exists());
}

#[test]
fn test_import_only_with_malformed_bundle_fails() {
    let temp = TempDir::new().unwrap();
    let bundle = temp.path().join("dump.json");
    fs::write(&bundle, "{\"not\": \"a list\"}").unwrap();

    kvmove_cmd(&temp)
        .args(["--mount", "secret", "--import-only"])
        .args(["--new-addr", "http://127.0.0.1:9", "--new-token", "t"])
        .args(["--new-transit", "k"])
        .arg("--out")
        .arg(&bundle)
        .assert()
        .code(1);
}

#[test]
fn test_config_file_supplies_settings() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("config.toml"),
        "mount = \"secret\"\n[source]\naddr = \"http://127.0.0.1:9\"\ntransit_key = \"k\"\n",
    )
    .unwrap();

    // Only the token is missing, so validation names it rather than the mount.
    kvmove_cmd(&temp)
        .arg("--export-only")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("token"));
}

#[test]
fn test_config_init_writes_template_once() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("config.toml");

    kvmove_cmd(&temp)
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Config initialized"));
    let first = fs::read_to_string(&path).unwrap();
    assert!(first.contains("transit_key"));

    fs::write(&path, "mount = \"kept\"\n").unwrap();
    kvmove_cmd(&temp).args(["config", "init"]).assert().success();
    assert_eq!(fs::read_to_string(&path).unwrap(), "mount = \"kept\"\n");
}

#[test]
fn test_malformed_config_file_exits_with_config_error() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("config.toml"), "mount = [").unwrap();

    kvmove_cmd(&temp)
        .arg("--export-only")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("config file"));
}
