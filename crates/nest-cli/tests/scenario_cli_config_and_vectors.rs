//! CLI: config hashing, apportionment and blending
//!
//! GREEN when:
//! - `config-hash` prints a 64-hex hash and the canonical defaults; an overlay
//!   (via --config or positional path) changes the hash identically.
//! - `apportion` reproduces the six-class one-slot-each plan and returns an
//!   empty plan for a zero budget.
//! - A malformed target vector fails with a message naming the input.
//! - `blend` returns the weighted persona vector and the primary persona.

use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;

fn nest() -> Command {
    let mut cmd = Command::cargo_bin("nest").unwrap();
    cmd.env("RUST_LOG", "warn");
    cmd
}

fn stdout_json(cmd: &mut Command) -> Value {
    let out = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&out).unwrap()
}

fn overlay(contents: &str) -> tempfile::NamedTempFile {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    f.write_all(contents.as_bytes()).unwrap();
    f.flush().unwrap();
    f
}

#[test]
fn config_hash_over_defaults_and_overlay() {
    let base = stdout_json(nest().arg("config-hash"));
    let hash = base["config_hash"].as_str().unwrap().to_string();
    assert_eq!(hash.len(), 64);
    assert_eq!(base["config"]["registry_version"], "2");

    let f = overlay("catalog:\n  refresh_interval_secs: 3600\n");
    let path = f.path().to_str().unwrap();

    let via_flag = stdout_json(nest().args(["--config", path, "config-hash"]));
    let via_positional = stdout_json(nest().args(["config-hash", path]));
    assert_ne!(via_flag["config_hash"], Value::String(hash));
    assert_eq!(via_flag["config_hash"], via_positional["config_hash"]);
    assert_eq!(via_flag["config"]["catalog"]["refresh_interval_secs"], 3600);
}

#[test]
fn apportion_six_classes_one_slot_each() {
    let out = stdout_json(nest().args([
        "apportion",
        "--target",
        "equity=0.385,debt=0.32,hybrid=0.135,gold=0.035,international=0.045,liquid=0.06",
        "--slots",
        "6",
    ]));
    assert_eq!(out["assigned"], 6);
    for class in ["equity", "debt", "hybrid", "gold", "international", "liquid"] {
        assert_eq!(out["plan"][class], 1, "{class}");
    }
}

#[test]
fn apportion_zero_budget_is_empty() {
    let out = stdout_json(nest().args(["apportion", "--target", "equity=1", "--slots", "0"]));
    assert_eq!(out["plan"], serde_json::json!({}));
    assert_eq!(out["assigned"], 0);
}

#[test]
fn malformed_target_fails() {
    nest()
        .args(["apportion", "--target", "equity=0.5,crypto=0.5", "--slots", "4"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid target vector"));
}

#[test]
fn blend_weights_personas() {
    let out = stdout_json(nest().args([
        "blend",
        "--weights",
        "capital-guardian=0.30,balanced-voyager=0.45,accelerated-builder=0.25",
    ]));
    assert_eq!(out["primary"], "balanced-voyager");
    let equity = out["blended"]["equity"].as_f64().unwrap();
    assert!((equity - 0.3875).abs() < 1e-9, "{equity}");
    let liquid = out["blended"]["liquid"].as_f64().unwrap();
    assert!((liquid - 0.065).abs() < 1e-9, "{liquid}");
}

#[test]
fn blend_rejects_unknown_persona() {
    nest()
        .args(["blend", "--weights", "daredevil=1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown persona 'daredevil'"));
}
