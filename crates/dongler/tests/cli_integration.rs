//! Integration tests for the `dongler-cli` binary.
//!
//! Only commands that work without a dongle attached are run for real;
//! device commands are checked through `--help`.

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

fn cli() -> assert_cmd::Command {
    cargo_bin_cmd!("dongler-cli")
}

/// A config file whose profile store lives next to it.
fn write_config(dir: &Path, extra: &str) -> std::path::PathBuf {
    let profiles = dir.join("profiles.toml");
    let config = dir.join("config.toml");
    std::fs::write(
        &config,
        format!(
            "profiles_path = {:?}\n{extra}",
            profiles.display().to_string()
        ),
    )
    .unwrap();
    config
}

#[test]
fn cli_help_lists_subcommands() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("dongler-cli"))
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("profile"));
}

#[test]
fn cli_version_prints_version() {
    cli()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

// ── config ──

#[test]
fn cli_config_json_reports_custom_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "watch_interval_ms = 250\n");
    let output = cli()
        .args(["--json", "--config"])
        .arg(&config)
        .arg("config")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json: serde_json::Value =
        serde_json::from_slice(&output).expect("config --json should produce valid JSON");
    assert_eq!(json["config_file_exists"], true);
    assert_eq!(json["settings"]["watch_interval_ms"], 250);
    assert_eq!(json["settings"]["transfer_timeout_ms"], 100);
    assert_eq!(json["problems"].as_array().unwrap().len(), 0);
    assert_eq!(json["files"]["profiles_exists"], false);
}

#[test]
fn cli_config_reports_validation_problems() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "preferred_device = \"dawn\"\n");
    cli()
        .arg("--config")
        .arg(&config)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("preferred_device must look like"));
}

#[test]
fn cli_config_init_writes_defaults_once() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("nested").join("config.toml");
    cli()
        .args(["--json", "--config"])
        .arg(&config)
        .args(["config", "--init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"config_file_exists\": true"));
    let written = std::fs::read_to_string(&config).unwrap();
    assert!(written.contains("watch_interval_ms"));

    std::fs::write(&config, "watch_interval_ms = 250\n").unwrap();
    cli()
        .arg("--config")
        .arg(&config)
        .args(["config", "--init"])
        .assert()
        .success();
    assert_eq!(
        std::fs::read_to_string(&config).unwrap(),
        "watch_interval_ms = 250\n"
    );
}

#[test]
fn cli_verbose_flag_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "");
    cli()
        .arg("-v")
        .arg("--config")
        .arg(&config)
        .arg("config")
        .assert()
        .success();
}

// ── features ──

#[test]
fn cli_features_for_model_id() {
    cli()
        .args(["features", "--model", "2972:0047"])
        .assert()
        .success()
        .stdout(predicate::str::contains("FiiO KA5"))
        .stdout(predicate::str::contains("channel_balance"))
        .stdout(predicate::str::contains("class-h, class-ab"));
}

#[test]
fn cli_features_json_lists_keys() {
    let output = cli()
        .args(["--json", "features", "--model", "262a:9038"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(json["model"], "E1DA #9038SG3");
    assert_eq!(json["keys"].as_array().unwrap().len(), 7);
    assert_eq!(json["keys"][0]["key"], "filter");
}

#[test]
fn cli_features_unknown_model_fails() {
    cli()
        .args(["features", "--model", "1234:5678"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Error: Setting error: unknown model"));
}

// ── profile ──

#[test]
fn cli_profile_list_empty_store() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "");
    cli()
        .arg("--config")
        .arg(&config)
        .args(["profile", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No profiles stored."));
}

#[test]
fn cli_profile_list_json_reads_store() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "");
    std::fs::write(
        dir.path().join("profiles.toml"),
        "[[profile]]\nid = 3\nname = \"desk\"\nvendor_id = 12230\nproduct_id = 61546\nfilter = 64\n",
    )
    .unwrap();

    let output = cli()
        .args(["--json", "--config"])
        .arg(&config)
        .args(["profile", "list"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(json[0]["id"], 3);
    assert_eq!(json[0]["name"], "desk");
    assert_eq!(json[0]["usb_id"], "2fc6:f06a");
    assert_eq!(json[0]["model"], "Moondrop Dawn 3.5mm");
}

#[test]
fn cli_profile_delete_missing_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "");
    cli()
        .arg("--config")
        .arg(&config)
        .args(["profile", "delete", "9"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no profile with id 9"));
}

// ── Device commands (help only) ──

#[test]
fn cli_set_requires_key_and_value() {
    cli().args(["set", "filter"]).assert().failure();
}

#[test]
fn cli_volume_rejects_unknown_step() {
    cli().args(["volume", "sideways"]).assert().failure();
}

#[test]
fn cli_device_command_help() {
    for (cmd, text) in [
        ("devices", "List attached"),
        ("status", "Read and show"),
        ("set", "Change one setting"),
        ("volume", "volume one step"),
        ("watch", "Ctrl+C"),
    ] {
        cli()
            .args([cmd, "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains(text));
    }
}
