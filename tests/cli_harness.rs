//! Binary integration harness.
//!
//! Runs the built `refile` binary against snapshot files in a temp directory.
//!
//! # What this covers
//!
//! - Report-only by default: the snapshot file is left byte-for-byte intact.
//! - `--apply` saves the migrated tree back to the snapshot, or to `--out`.
//! - `--json` prints a machine-readable report.
//! - `--init-structure` adds bucket metadata documents.
//! - Unreadable input exits non-zero.
//!
//! # Running
//!
//! ```sh
//! cargo test --test cli_harness
//! ```

mod common;
use common::*;

use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn refile(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_refile"))
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("refile binary runs")
}

fn write_snapshot(dir: &Path) -> PathBuf {
    let path = dir.join("tree.json");
    std::fs::write(&path, serde_json::to_string_pretty(&scattered_tree()).unwrap()).unwrap();
    path
}

fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn report_only_leaves_snapshot_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = write_snapshot(dir.path());
    let before = std::fs::read(&snapshot).unwrap();

    let out = refile(&["--snapshot", snapshot.to_str().unwrap()]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("REPORT (report-only)"));
    assert!(stdout.contains("Feedback documents: 4"));
    assert!(stdout.contains("units/u1/feedback/f1 → feedbacks/madrichim/items/f1"));
    assert_eq!(std::fs::read(&snapshot).unwrap(), before);
}

#[test]
fn apply_saves_to_out_path() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = write_snapshot(dir.path());
    let target = dir.path().join("migrated.json");

    let out = refile(&[
        "--snapshot",
        snapshot.to_str().unwrap(),
        "--out",
        target.to_str().unwrap(),
        "--apply",
    ]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    assert_eq!(read_json(&snapshot), scattered_tree());
    let migrated = read_json(&target);
    let copy = &migrated["feedbacks"]["defense474"]["collections"]["items"]["d1"]["fields"];
    assert_eq!(copy["department"], "474");
    assert_eq!(copy["sourcePath"], "units/u2/sessions/s1/rounds/d1");
}

#[test]
fn json_report_parses() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = write_snapshot(dir.path());

    let out = refile(&["--snapshot", snapshot.to_str().unwrap(), "--json", "--root", "users"]);
    assert!(out.status.success());

    let report: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(report["mode"], "report-only");
    assert_eq!(report["documentsScanned"], 2);
    assert_eq!(report["writes"][0]["targetPath"], "feedbacks/general/items/g1");
}

#[test]
fn init_structure_writes_bucket_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = write_snapshot(dir.path());

    let out = refile(&[
        "--snapshot",
        snapshot.to_str().unwrap(),
        "--apply",
        "--init-structure",
    ]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    assert!(String::from_utf8_lossy(&out.stdout).contains("Bucket metadata:"));

    let migrated = read_json(&snapshot);
    let meta = &migrated["feedbacks"]["general"]["collections"]["items"]["_meta"]["fields"];
    assert_eq!(meta["category"], "general");
}

#[test]
fn missing_snapshot_fails() {
    let dir = tempfile::tempdir().unwrap();
    let out = refile(&["--snapshot", dir.path().join("nope.json").to_str().unwrap()]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("cannot open snapshot"));
}
