use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

fn write_valid_config(dir: &tempfile::TempDir) -> PathBuf {
    let toml = r#"
[[sensor]]
source = "sensor.src_power"
method = "lowpass"
tau_s = 30
update_s = 5
round = 1
"#;
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

fn write_events(dir: &tempfile::TempDir) -> PathBuf {
    // Three numeric readings 100 ms apart.
    let lines = r#"
{"t": 0.0, "state": 100, "unit": "W"}
{"t": 0.1, "state": 200, "unit": "W"}
{"t": 0.2, "state": 150, "unit": "W"}
"#;
    let path = dir.path().join("events.jsonl");
    fs::write(&path, lines.trim_start()).unwrap();
    path
}

#[test]
fn check_config_accepts_a_valid_file() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let mut cmd = Command::cargo_bin("tickfilter_cli").unwrap();
    cmd.args(["--config", cfg.to_str().unwrap(), "check-config"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config ok: 1 sensor(s)"));
}

#[rstest]
#[case("update_s = 0.5", "update_s")]
#[case("tau_s = 0", "tau_s")]
#[case("round = 99", "round")]
fn check_config_rejects_out_of_range_values(#[case] line: &str, #[case] needle: &str) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(
        &path,
        format!(
            r#"
[[sensor]]
source = "sensor.src_power"
method = "lowpass"
{line}
"#
        ),
    )
    .unwrap();
    let mut cmd = Command::cargo_bin("tickfilter_cli").unwrap();
    cmd.args(["--config", path.to_str().unwrap(), "check-config"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(needle));
}

#[test]
fn check_config_rejects_unknown_method() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(
        &path,
        r#"
[[sensor]]
source = "sensor.src_power"
method = "kalman"
"#,
    )
    .unwrap();
    let mut cmd = Command::cargo_bin("tickfilter_cli").unwrap();
    cmd.args(["--config", path.to_str().unwrap(), "check-config"])
        .assert()
        .failure();
}

#[test]
fn replay_publishes_one_line_per_event() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let events = write_events(&dir);
    let mut cmd = Command::cargo_bin("tickfilter_cli").unwrap();
    let assert = cmd
        .args([
            "--config",
            cfg.to_str().unwrap(),
            "replay",
            "--events",
            events.to_str().unwrap(),
        ])
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let published: Vec<&str> = stdout.lines().filter(|l| !l.trim().is_empty()).collect();
    assert_eq!(published.len(), 3, "stdout was: {stdout}");
    // First reading passes straight through.
    assert!(published[0].starts_with("100 W"), "got {}", published[0]);
}

#[test]
fn replay_in_json_mode_emits_machine_readable_updates() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let events = write_events(&dir);
    let mut cmd = Command::cargo_bin("tickfilter_cli").unwrap();
    let assert = cmd
        .args([
            "--config",
            cfg.to_str().unwrap(),
            "--json",
            "replay",
            "--events",
            events.to_str().unwrap(),
        ])
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let first = stdout.lines().next().expect("at least one update");
    let parsed: serde_json::Value = serde_json::from_str(first).expect("valid JSON line");
    assert_eq!(parsed["value"], 100.0);
    assert_eq!(parsed["unit"], "W");
    assert_eq!(parsed["attributes"]["method"], "lowpass");
    assert_eq!(parsed["attributes"]["tau_s"], 30.0);
}

#[test]
fn replay_fails_cleanly_on_a_missing_event_file() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let mut cmd = Command::cargo_bin("tickfilter_cli").unwrap();
    cmd.args([
        "--config",
        cfg.to_str().unwrap(),
        "replay",
        "--events",
        dir.path().join("nope.jsonl").to_str().unwrap(),
    ])
    .assert()
    .failure()
    .stderr(predicate::str::contains("event file"));
}

#[test]
fn replay_selects_a_sensor_by_unique_id() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("multi.toml");
    fs::write(
        &path,
        r#"
[[sensor]]
source = "sensor.src_power"
method = "lowpass"
unique_id = "smooth"

[[sensor]]
source = "sensor.src_power"
method = "integrator"
unique_id = "energy"
unit_of_measurement = "Wh"
"#,
    )
    .unwrap();
    let events = write_events(&dir);
    let mut cmd = Command::cargo_bin("tickfilter_cli").unwrap();
    let assert = cmd
        .args([
            "--config",
            path.to_str().unwrap(),
            "--json",
            "replay",
            "--events",
            events.to_str().unwrap(),
            "--sensor",
            "energy",
        ])
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let first = stdout.lines().next().expect("at least one update");
    let parsed: serde_json::Value = serde_json::from_str(first).expect("valid JSON line");
    assert_eq!(parsed["attributes"]["method"], "integrator");
    assert_eq!(parsed["unit"], "Wh");
    assert_eq!(parsed["state_class"], "total_increasing");
}
