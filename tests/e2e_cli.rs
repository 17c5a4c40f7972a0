//! CLI end-to-end tests
//!
//! Tests for the ladderforge command-line interface.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::{tempdir, TempDir};

/// Get a command for the ladderforge binary, isolated from any config file in
/// the working directory.
#[allow(deprecated)]
fn ladderforge_cmd(cwd: &Path) -> Command {
    let mut cmd = Command::cargo_bin("ladderforge").unwrap();
    cmd.current_dir(cwd).env_remove("RUST_LOG");
    cmd
}

/// A library with one course holding one video.
fn library() -> TempDir {
    let dir = tempdir().unwrap();
    let course = dir.path().join("input/algebra");
    fs::create_dir_all(&course).unwrap();
    fs::write(course.join("intro.mp4"), b"").unwrap();
    fs::write(course.join("notes.txt"), b"").unwrap();
    dir
}

fn write_config(dir: &Path, body: &str) -> std::path::PathBuf {
    let path = dir.join("ladderforge.toml");
    fs::write(&path, body).unwrap();
    path
}

#[test]
fn test_cli_no_args_shows_help() {
    let dir = tempdir().unwrap();
    ladderforge_cmd(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_help_flag() {
    let dir = tempdir().unwrap();
    ladderforge_cmd(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("ladderforge"))
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_version_command() {
    let dir = tempdir().unwrap();
    ladderforge_cmd(dir.path())
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_cli_validate_defaults() {
    let dir = tempdir().unwrap();
    ladderforge_cmd(dir.path())
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"))
        .stdout(predicate::str::contains("720p, 1080p, 2160p"));
}

#[test]
fn test_cli_validate_gpu_config() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path(), "[encode]\nmode = \"gpu\"\n");
    ladderforge_cmd(dir.path())
        .arg("validate")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("gpu_fan_out"))
        .stdout(predicate::str::contains("1080p, 720p, 480p"))
        .stdout(predicate::str::contains("Segment duration: 10s"));
}

#[test]
fn test_cli_validate_rejects_bad_config() {
    let dir = tempdir().unwrap();
    let config = write_config(
        dir.path(),
        r#"
[ladder]
labels = ["720p", "1080p"]
resolutions = ["1280x720"]
video_bitrates = ["1200k", "2500k"]
"#,
    );
    ladderforge_cmd(dir.path())
        .arg("validate")
        .arg(&config)
        .assert()
        .failure();
}

#[test]
fn test_cli_plan_cpu() {
    let lib = library();
    ladderforge_cmd(lib.path())
        .args(["plan", "--input", "input", "--output", "output"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "3 job(s) for 1 video(s) in 1 course(s) [cpu mode]",
        ))
        .stdout(predicate::str::contains("algebra/intro@720p"))
        .stdout(predicate::str::contains("intro_2160p.m3u8"));

    assert!(!lib.path().join("output").exists());
}

#[test]
fn test_cli_plan_gpu_with_commands() {
    let lib = library();
    ladderforge_cmd(lib.path())
        .args(["plan", "-i", "input", "-o", "output", "--mode", "gpu", "--commands"])
        .assert()
        .success()
        .stdout(predicate::str::contains("algebra/intro@ladder"))
        .stdout(predicate::str::contains("master.m3u8"))
        .stdout(predicate::str::contains("-var_stream_map"))
        .stdout(predicate::str::contains("name:1080p"));
}

#[test]
fn test_cli_plan_json() {
    let lib = library();
    let output = ladderforge_cmd(lib.path())
        .args(["plan", "-i", "input", "-o", "output", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let jobs: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let jobs = jobs.as_array().unwrap();
    assert_eq!(jobs.len(), 3);
    assert_eq!(jobs[0]["id"], "algebra/intro@720p");
    assert_eq!(jobs[0]["target"]["kind"], "rendition");
}

#[test]
fn test_cli_plan_missing_input_root() {
    let dir = tempdir().unwrap();
    ladderforge_cmd(dir.path())
        .args(["plan", "--input", "does-not-exist"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does-not-exist"));
}

#[test]
fn test_cli_run_dry_run_writes_report() {
    let lib = library();
    let report = lib.path().join("report.json");
    ladderforge_cmd(lib.path())
        .args(["run", "-i", "input", "-o", "output", "--dry-run", "--report"])
        .arg(&report)
        .assert()
        .success()
        .stdout(predicate::str::contains("3 job(s): 3 succeeded, 0 failed"));

    assert!(!lib.path().join("output").exists());
    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(json["jobs_total"], 3);
    assert_eq!(json["results"].as_array().unwrap().len(), 3);
}

#[test]
fn test_cli_run_with_succeeding_encoder() {
    if !Path::new("/bin/true").exists() {
        return;
    }
    let lib = library();
    let config = write_config(lib.path(), "[tools]\nffmpeg_path = \"/bin/true\"\n");
    ladderforge_cmd(lib.path())
        .arg("--config")
        .arg(&config)
        .args(["run", "-i", "input", "-o", "output", "--mode", "gpu"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 job(s): 1 succeeded, 0 failed"));

    for label in ["1080p", "720p", "480p"] {
        assert!(lib
            .path()
            .join(format!("output/algebra/intro/stream_{label}"))
            .is_dir());
    }
}

#[test]
fn test_cli_run_with_failing_encoder_exits_2() {
    if !Path::new("/bin/false").exists() {
        return;
    }
    let lib = library();
    let config = write_config(lib.path(), "[tools]\nffmpeg_path = \"/bin/false\"\n");
    ladderforge_cmd(lib.path())
        .arg("--config")
        .arg(&config)
        .args(["run", "-i", "input", "-o", "output", "--window", "2"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("3 job(s): 0 succeeded, 3 failed"));
}
