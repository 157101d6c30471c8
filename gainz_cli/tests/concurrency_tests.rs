//! Concurrency tests for the gainz binary.
//!
//! These tests verify that multiple processes can safely:
//! - Append sessions and sets to the same data directory
//! - Seed the catalog at the same time
//! - Read history while others are writing

use assert_cmd::Command;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

fn cli(root: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("gainz"));
    cmd.env("XDG_CONFIG_HOME", root.join("config"))
        .arg("--data-dir")
        .arg(root.join("data"));
    cmd
}

fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

fn log_workout(root: &Path) {
    cli(root)
        .args(["log", "--exercise", "lat_pulldown", "--set", "60x10", "--set", "60x9"])
        .timeout(Duration::from_secs(10))
        .assert()
        .success();
}

fn count_valid_lines(path: &Path) -> usize {
    let content = std::fs::read_to_string(path).expect("Failed to read JSONL file");
    let mut valid_count = 0;
    for line in content.lines() {
        if line.is_empty() {
            continue;
        }
        let parsed: Result<serde_json::Value, _> = serde_json::from_str(line);
        assert!(parsed.is_ok(), "File contains invalid JSON line: {}", line);
        valid_count += 1;
    }
    valid_count
}

#[test]
fn test_sequential_logging() {
    let temp_dir = setup_test_dir();

    for i in 0..5 {
        thread::sleep(Duration::from_millis(i * 5));
        log_workout(temp_dir.path());
    }

    let data_dir = temp_dir.path().join("data");
    assert_eq!(count_valid_lines(&data_dir.join("sessions.jsonl")), 5);
    assert_eq!(count_valid_lines(&data_dir.join("sets.jsonl")), 10);
}

#[test]
fn test_summary_while_logging() {
    let temp_dir = setup_test_dir();
    let root: PathBuf = temp_dir.path().to_path_buf();

    log_workout(&root);

    let reader_root = root.clone();
    let reader = thread::spawn(move || {
        for _ in 0..3 {
            thread::sleep(Duration::from_millis(5));
            cli(&reader_root).arg("summary").assert().success();
        }
    });

    for _ in 0..3 {
        log_workout(&root);
    }

    reader.join().expect("Summary thread panicked");

    assert_eq!(count_valid_lines(&root.join("data/sessions.jsonl")), 4);
}

#[test]
fn test_no_corruption_under_load() {
    let temp_dir = setup_test_dir();
    let root: PathBuf = temp_dir.path().to_path_buf();

    // Every process races to seed the catalog and append its session
    let handles: Vec<_> = (0..10)
        .map(|i| {
            let root = root.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(i * 5));
                log_workout(&root);
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    let data_dir = root.join("data");
    assert_eq!(count_valid_lines(&data_dir.join("sessions.jsonl")), 10);
    assert_eq!(count_valid_lines(&data_dir.join("sets.jsonl")), 20);

    let catalog = std::fs::read_to_string(data_dir.join("catalog.json")).unwrap();
    assert!(serde_json::from_str::<serde_json::Value>(&catalog).is_ok());
}
