//! CLI end-to-end tests
//!
//! Tests for the picfolio command-line interface.

mod common;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::tempdir;

/// Get a command for the picfolio binary
#[allow(deprecated)]
fn picfolio_cmd() -> Command {
    Command::cargo_bin("picfolio").unwrap()
}

/// Write a config pointing every path into `dir` and return its path.
fn write_config(dir: &Path) -> PathBuf {
    let config_path = dir.join("picfolio.toml");
    fs::write(
        &config_path,
        format!(
            "[storage]\nimage_dir = {:?}\ndatabase_path = {:?}\n",
            dir.join("images"),
            dir.join("picfolio.db")
        ),
    )
    .unwrap();
    config_path
}

fn run_ok(config: &Path, args: &[&str]) -> String {
    let output = picfolio_cmd()
        .arg("-c")
        .arg(config)
        .args(args)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "{:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).unwrap()
}

#[test]
fn test_cli_no_args_shows_help() {
    picfolio_cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_version_command() {
    picfolio_cmd()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("picfolio"));
}

#[test]
fn test_cli_validate_default_config() {
    let dir = tempdir().unwrap();
    picfolio_cmd()
        .current_dir(dir.path())
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"));
}

#[test]
fn test_cli_validate_rejects_bad_config() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("bad.toml");
    fs::write(&config_path, "[thumbnail]\njpeg_quality = 0\n").unwrap();

    picfolio_cmd()
        .arg("validate")
        .arg(&config_path)
        .assert()
        .failure();
}

#[test]
fn test_cli_rejects_malformed_album_id() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path());

    picfolio_cmd()
        .arg("-c")
        .arg(&config)
        .args(["album", "show", "not-a-uuid"])
        .assert()
        .failure();
}

#[test]
fn test_cli_album_lifecycle() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path());

    let album_id = run_ok(&config, &["album", "create", "Trip", "--description", "Summer"])
        .trim()
        .to_string();
    assert!(dir.path().join("images").join(&album_id).is_dir());

    let list = run_ok(&config, &["album", "list"]);
    assert!(list.contains(&album_id));
    assert!(list.contains("Trip"));

    let photo = dir.path().join("Sunset Beach.jpg");
    fs::write(&photo, common::jpeg(120, 80)).unwrap();
    let uploaded = run_ok(&config, &["upload", &album_id, photo.to_str().unwrap()]);
    let image_id = uploaded.trim().to_string();
    assert!(!image_id.is_empty());

    let shown = run_ok(&config, &["album", "show", &album_id, "--json"]);
    let json: serde_json::Value = serde_json::from_str(&shown).unwrap();
    assert_eq!(json["album"]["title"], "Trip");
    assert_eq!(json["album"]["cover_photo_id"], image_id.as_str());
    assert_eq!(json["images"][0]["width"], 120);
    assert_eq!(json["images"][0]["height"], 80);
    assert_eq!(json["images"][0]["title"], "Sunset Beach.jpg");

    run_ok(&config, &["image", "rotate", &image_id]);
    let shown = run_ok(&config, &["album", "show", &album_id, "--json"]);
    let json: serde_json::Value = serde_json::from_str(&shown).unwrap();
    assert_eq!(json["images"][0]["width"], 80);
    assert_eq!(json["images"][0]["height"], 120);

    // Empty title keeps the old one; empty description clears it.
    run_ok(&config, &["album", "edit", &album_id, "--title", "", "--description", ""]);
    let shown = run_ok(&config, &["album", "show", &album_id, "--json"]);
    let json: serde_json::Value = serde_json::from_str(&shown).unwrap();
    assert_eq!(json["album"]["title"], "Trip");
    assert!(json["album"]["description"].is_null());
    assert_eq!(json["album"]["cover_photo_id"], image_id.as_str());

    run_ok(&config, &["album", "delete", &album_id]);
    assert!(!dir.path().join("images").join(&album_id).exists());
    assert!(!run_ok(&config, &["album", "list"]).contains(&album_id));
}

#[test]
fn test_cli_upload_reports_bad_file() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path());
    let album_id = run_ok(&config, &["album", "create", "Mixed"]).trim().to_string();

    let good = dir.path().join("good.jpg");
    let bad = dir.path().join("bad.jpg");
    fs::write(&good, common::jpeg(10, 10)).unwrap();
    fs::write(&bad, b"not an image").unwrap();

    picfolio_cmd()
        .arg("-c")
        .arg(&config)
        .args(["upload", &album_id])
        .arg(&good)
        .arg(&bad)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Upload incomplete"));

    let shown = run_ok(&config, &["album", "show", &album_id, "--json"]);
    let json: serde_json::Value = serde_json::from_str(&shown).unwrap();
    assert_eq!(json["images"].as_array().unwrap().len(), 1);
}

#[test]
fn test_cli_reconcile_clean_library() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path());
    run_ok(&config, &["album", "create", "Tidy"]);

    let output = run_ok(&config, &["reconcile", "--json"]);
    let report: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(report["orphan_files_removed"], 0);
    assert_eq!(report["failures"], 0);
}
