use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::{tempdir, TempDir};

fn notes() -> TempDir {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("projects/garden")).unwrap();
    fs::write(dir.path().join("groceries.md"), "milk\neggs\n").unwrap();
    fs::write(dir.path().join("projects/garden/plan.md"), "plant tomatoes\n").unwrap();
    fs::write(dir.path().join("empty.toml"), "").unwrap();
    dir
}

/// Runs the binary against an explicit, empty config so user files can not interfere.
fn fitgrep(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("fitgrep").unwrap();
    cmd.arg("--config")
        .arg(dir.join("empty.toml"))
        .env("NO_COLOR", "1")
        .env_remove("FITGREP_PASSWORD");
    cmd
}

#[test]
fn test_search_prints_matches() {
    let dir = notes();
    fitgrep(dir.path())
        .args(["search", "garden"])
        .arg(dir.path())
        .assert()
        .code(0)
        .stdout(predicate::str::contains("garden"))
        .stdout(predicate::str::contains("Summary:"));
}

#[test]
fn test_no_match_exits_with_one() {
    let dir = notes();
    fitgrep(dir.path())
        .args(["search", "nothing-here"])
        .arg(dir.path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("No matches found"));
}

#[test]
fn test_bad_regex_exits_with_two() {
    let dir = notes();
    fitgrep(dir.path())
        .args(["search", "--regex", "(open"])
        .arg(dir.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Query can not be compiled"));
}

#[test]
fn test_malformed_config_exits_with_two() {
    let dir = notes();
    let config = dir.path().join("broken.toml");
    fs::write(&config, "[search\n").unwrap();
    Command::cargo_bin("fitgrep")
        .unwrap()
        .arg("--config")
        .arg(&config)
        .args(["search", "milk"])
        .arg(dir.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Failed to parse config file"));
}

#[test]
fn test_content_search_json() {
    let dir = notes();
    let output = fitgrep(dir.path())
        .args(["search", "--content", "--format", "json", "tomatoes"])
        .arg(dir.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["status"], "completed");
    let files = value["files"].as_array().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0]["content_matches"][0]["preview"], "plant tomatoes");
}

#[test]
fn test_max_depth_flag() {
    let dir = notes();
    fitgrep(dir.path())
        .args(["search", "--max-depth", "0", "plan"])
        .arg(dir.path())
        .assert()
        .code(1);
    fitgrep(dir.path())
        .args(["search", "--max-depth", "2", "plan"])
        .arg(dir.path())
        .assert()
        .code(0)
        .stdout(predicate::str::contains("plan.md"));
}

#[test]
fn test_ignore_flag() {
    let dir = notes();
    fitgrep(dir.path())
        .args(["search", "-i", "proj*", "plan"])
        .arg(dir.path())
        .assert()
        .code(1);
}

#[test]
fn test_encrypt_then_search_content() {
    let dir = notes();
    let secret = dir.path().join("diary.md");
    fs::write(&secret, "met alice at the lake\n").unwrap();

    fitgrep(dir.path())
        .arg("encrypt")
        .arg(&secret)
        .env("FITGREP_PASSWORD", "hunter2")
        .assert()
        .success()
        .stdout(predicate::str::contains("diary.md.jenc"));
    fs::remove_file(&secret).unwrap();
    assert!(dir.path().join("diary.md.jenc").exists());

    fitgrep(dir.path())
        .args(["search", "--content", "alice"])
        .arg(dir.path())
        .env("FITGREP_PASSWORD", "hunter2")
        .assert()
        .code(0)
        .stdout(predicate::str::contains("met alice at the lake"));

    fitgrep(dir.path())
        .args(["search", "--content", "alice"])
        .arg(dir.path())
        .assert()
        .code(1);
}

#[test]
fn test_encrypt_requires_password() {
    let dir = notes();
    fitgrep(dir.path())
        .arg("encrypt")
        .arg(dir.path().join("groceries.md"))
        .assert()
        .code(2)
        .stderr(predicate::str::contains("FITGREP_PASSWORD"));
}

#[test]
fn test_interactive_history() {
    let dir = notes();
    fitgrep(dir.path())
        .arg("interactive")
        .arg(dir.path())
        .write_stdin("milk\ngarden\n:history\n:quit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("  1  garden"))
        .stdout(predicate::str::contains("  2  milk"));
}

#[test]
fn test_log_file_option() {
    let dir = notes();
    let log = dir.path().join("logs/fitgrep.log");
    fitgrep(dir.path())
        .arg("--verbose")
        .arg("--log")
        .arg(&log)
        .args(["search", "milk"])
        .arg(dir.path())
        .assert()
        .code(1);

    let content = fs::read_to_string(&log).unwrap();
    assert!(content.contains("[INFO]"));
    assert!(content.contains("Searching"));
}

#[test]
fn test_completions() {
    Command::cargo_bin("fitgrep")
        .unwrap()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("fitgrep"));
}
