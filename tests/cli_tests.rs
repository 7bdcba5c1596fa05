// End-to-end tests for the tbm-counter binary

use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write_job(dir: &Path, name: &str, json: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, json).unwrap();
    path
}

fn job_json(cycles: u64, runtime: u64) -> String {
    format!(
        r#"{{
    "cycles": {cycles},
    "toi_runtime_observations": [{runtime}],
    "toi_cachemiss_observations": [2],
    "toi_cacheaccess_observations": [20],
    "retired_instruction_count": {retired},
    "branch_count": 3,
    "cache_miss_count": 2,
    "cache_read_reqs_count": 15,
    "cache_write_reqs_count": 5,
    "stalls": {{"frontend": 10, "lsu": 20}},
    "utilizations": {{
        "FE": {{"size": 2, "count": {fetched}, "occupied": {fetched}}},
        "ALU": {{"count": {retired}, "occupied": {retired}}}
    }}
}}"#,
        cycles = cycles,
        runtime = runtime,
        retired = cycles / 2,
        fetched = cycles,
    )
}

// ============================================================================
// Text report
// ============================================================================

#[test]
fn test_two_jobs_text_report() {
    let tmp = TempDir::new().unwrap();
    let first = write_job(tmp.path(), "job1.json", &job_json(100, 5));
    let second = write_job(tmp.path(), "job2.json", &job_json(200, 7));

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("tbm-counter");
    cmd.arg(&first).arg(&second);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("*** number of jobs: 2\n"))
        .stdout(predicate::str::contains("*** cycles: 300\n"))
        .stdout(predicate::str::contains(
            "*** execution time observations: [5, 7]\n",
        ))
        .stdout(predicate::str::contains("*** cache accesses: 40\n"))
        .stdout(predicate::str::contains("*** AMAT observations: [2.0, 2.0]\n"))
        .stdout(predicate::str::contains(
            "*** retired instructions per cycle: 0.50 (150)\n",
        ))
        .stdout(predicate::str::contains(
            "*** retired / fetched instructions: 0.50\n",
        ))
        .stdout(predicate::str::contains("  frontend: 6% (20)\n"))
        .stdout(predicate::str::contains("  lsu: 13% (40)\n"))
        .stdout(predicate::str::contains("  FE: 50% (300)\n"));
}

#[test]
fn test_output_file() {
    let tmp = TempDir::new().unwrap();
    let job = write_job(tmp.path(), "job.json", &job_json(100, 5));
    let out = tmp.path().join("report.txt");

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("tbm-counter");
    cmd.arg("-o").arg(&out).arg(&job);
    cmd.assert().success().stdout(predicate::str::is_empty());

    let report = fs::read_to_string(&out).unwrap();
    assert!(report.starts_with("*** number of jobs: 1\n"));
    assert!(report.contains("*** utilization:\n"));
}

#[test]
fn test_config_overrides_amat_model() {
    let tmp = TempDir::new().unwrap();
    let job = write_job(tmp.path(), "job.json", &job_json(100, 5));
    let config = tmp.path().join("tbm-counter.toml");
    fs::write(&config, "[amat]\nhit_time = 3.0\nmiss_penalty = 10.0\n").unwrap();

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("tbm-counter");
    cmd.arg("--config").arg(&config).arg(&job);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("*** AMAT observations: [4.0]\n"));
}

// ============================================================================
// JSON report
// ============================================================================

#[test]
fn test_json_report() {
    let tmp = TempDir::new().unwrap();
    let job = write_job(tmp.path(), "job.json", &job_json(100, 5));

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("tbm-counter");
    cmd.arg("--format").arg("json").arg(&job);

    let output = cmd.assert().success().get_output().stdout.clone();
    let json: serde_json::Value = serde_json::from_slice(&output).unwrap();

    assert_eq!(json["format"], "tbm-counter-json-v1");
    assert_eq!(json["job_count"], 1);
    assert_eq!(json["cycles"], 100);
    assert_eq!(json["stalls"][0]["name"], "frontend");
    assert_eq!(json["stalls"][0]["percent"], 10);
    assert_eq!(json["units"][1]["name"], "ALU");
}

// ============================================================================
// Contract violations
// ============================================================================

#[test]
fn test_no_runtime_observations_fails() {
    let tmp = TempDir::new().unwrap();
    let job = write_job(tmp.path(), "job.json", r#"{"cycles": 10}"#);

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("tbm-counter");
    cmd.arg(&job);

    cmd.assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("No execution times observed"));
}

#[test]
fn test_stall_key_mismatch_fails() {
    let tmp = TempDir::new().unwrap();
    let first = write_job(tmp.path(), "job1.json", &job_json(100, 5));
    let second = write_job(
        tmp.path(),
        "job2.json",
        r#"{"cycles": 10, "toi_runtime_observations": [1], "stalls": {"frontend": 1}}"#,
    );

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("tbm-counter");
    cmd.arg(&first).arg(&second);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("stall key mismatch"));
}

#[test]
fn test_missing_job_file_fails() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("tbm-counter");
    cmd.arg("/nonexistent/job.json");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read job file"));
}

#[test]
fn test_requires_job_argument() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("tbm-counter");
    cmd.assert().failure();
}
