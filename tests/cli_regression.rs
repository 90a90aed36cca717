// Regression tests for the `retrofit` binary.
// Requires: assert_cmd, predicates crates in [dev-dependencies]

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::{prelude::PredicateBooleanExt, str::contains};

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("retrofit-cli-{name}-{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn retrofit() -> Command {
    let mut cmd = Command::cargo_bin("retrofit").unwrap();
    cmd.env("NO_COLOR", "1").env_remove("RUST_LOG");
    cmd
}

#[test]
fn expand_prints_rewritten_source() {
    let dir = scratch_dir("expand");
    let file = dir.join("a.swift");
    fs::write(&file, "#XCTAssertEqual(a, b)\n").unwrap();

    retrofit()
        .arg("expand")
        .arg(&file)
        .assert()
        .success()
        .stdout("#expect((a) == (b))\n");

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn expand_write_rewrites_in_place() {
    let dir = scratch_dir("write");
    let file = dir.join("a.swift");
    fs::write(&file, "    #XCTFail(\"nope\")\n").unwrap();

    retrofit().args(["expand", "--write"]).arg(&dir).assert().success();
    assert_eq!(fs::read_to_string(&file).unwrap(), "    Issue.record(\"nope\")\n");

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn diff_shows_removed_and_added_lines() {
    let dir = scratch_dir("diff");
    let file = dir.join("a.swift");
    fs::write(&file, "let x = 1\n#XCTAssertNotNil(x)\n").unwrap();

    retrofit()
        .arg("diff")
        .arg(&file)
        .assert()
        .success()
        .stdout(contains("-#XCTAssertNotNil(x)").and(contains("+#expect((x) != nil)")));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn check_fails_on_rewrite_errors_with_miette_output() {
    let dir = scratch_dir("check");
    let file = dir.join("a.swift");
    fs::write(&file, "#XCTAssertEqual(onlyOne)\n").unwrap();

    retrofit()
        .arg("check")
        .arg(&file)
        .assert()
        .failure()
        .code(1)
        .stderr(contains("retrofit::rewrite::insufficient_argument_count").and(contains("1 error(s)")));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn check_json_reports_summary_and_diagnostics() {
    let dir = scratch_dir("json");
    fs::write(dir.join("a.swift"), "#XCTAssert(ok, file: f, sourceLocation: s)\n").unwrap();
    fs::write(dir.join("notes.txt"), "#XCTAssertEqual(x)\n").unwrap();

    let output = retrofit().args(["check", "--json"]).arg(&dir).output().unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["summary"]["files"], 1);
    assert_eq!(report["summary"]["rewritable"], 1);
    assert_eq!(report["summary"]["errors"], 0);
    assert_eq!(report["diagnostics"][0]["severity"], "warning");
    assert_eq!(
        report["diagnostics"][0]["code"],
        "retrofit::rewrite::conflicting_source_location"
    );

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn list_includes_tolerance_rules() {
    retrofit()
        .arg("list")
        .assert()
        .success()
        .stdout(contains("XCTAssertEqual(..., accuracy:)").and(contains("XCTAssertNoThrow")));
}

#[test]
fn list_json_is_parseable() {
    let output = retrofit().args(["list", "--json"]).output().unwrap();
    let entries: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(entries.as_array().map(Vec::len), Some(19));
    assert!(entries
        .as_array()
        .unwrap()
        .iter()
        .any(|e| e["kind"] == "equal-with-accuracy" && e["family"] == "BinaryWithTolerance"));
}

#[test]
fn invalid_config_is_reported() {
    let dir = scratch_dir("config");
    let config = dir.join("retrofit.yaml");
    fs::write(&config, "disabled: [XCTAssertSomething]\n").unwrap();

    retrofit()
        .arg("--config")
        .arg(&config)
        .arg("list")
        .assert()
        .failure()
        .stderr(contains("retrofit::config::invalid_configuration"));

    let _ = fs::remove_dir_all(&dir);
}
