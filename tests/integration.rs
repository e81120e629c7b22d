use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn shelf_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("shelf");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let config_dir = tmp.path().join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let config_path = config_dir.join("shelf.toml");
    fs::write(
        &config_path,
        r#"[tiles]
columns = 2
rows = 1
overlap = 0.0

[scan]
inter_tile_delay_ms = 0
backoff_base_ms = 0

[lookup]
delay_ms = 0
"#,
    )
    .unwrap();

    (tmp, config_path)
}

fn run_shelf(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = shelf_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run shelf binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

fn write_candidates(dir: &Path, content: &str) -> String {
    let path = dir.join("candidates.json");
    fs::write(&path, content).unwrap();
    path.to_str().unwrap().to_string()
}

#[test]
fn test_reconcile_end_to_end() {
    let (tmp, config_path) = setup_test_env();
    let input = write_candidates(
        tmp.path(),
        r#"[
            {"title": "The Great Gatsby", "confidence": "high"},
            {"title": "Connect 4"},
            "9780134685991",
            {"title": "Great Gatsby", "confidence": "medium"}
        ]"#,
    );

    let (stdout, stderr, success) = run_shelf(&config_path, &["reconcile", &input]);
    assert!(success, "reconcile failed: stdout={}, stderr={}", stdout, stderr);

    let titles: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(
        titles,
        serde_json::json!([{"title": "The Great Gatsby", "confidence": "high"}])
    );
}

#[test]
fn test_reconcile_report() {
    let (tmp, config_path) = setup_test_env();
    let input = write_candidates(tmp.path(), r#"["Dune", "by Frank Herbert", "DUNE", 42]"#);

    let (stdout, stderr, success) = run_shelf(&config_path, &["reconcile", &input, "--report"]);
    assert!(success, "reconcile failed: stderr={}", stderr);

    let report: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(report["counts"]["input"], 4);
    assert_eq!(report["counts"]["normalized"], 3);
    assert_eq!(report["counts"]["unique"], 1);
    assert_eq!(report["rejected"][0]["reason"], "non_book_pattern");
    assert_eq!(report["rejected"][0]["detail"], "byline");
    assert_eq!(report["rejected"][1]["stage"], "dedup");
}

#[test]
fn test_reconcile_nothing_detected() {
    let (tmp, config_path) = setup_test_env();
    let input = write_candidates(tmp.path(), r#"["Connect 4", "Penguin Classics", "Monopoly"]"#);

    let (stdout, stderr, success) = run_shelf(&config_path, &["reconcile", &input]);
    assert!(success, "empty result should still succeed: stderr={}", stderr);
    assert_eq!(stdout.trim(), "[]");
    assert!(stderr.contains("No book titles detected"));
}

#[test]
fn test_reconcile_rejects_non_array() {
    let (tmp, config_path) = setup_test_env();
    let input = write_candidates(tmp.path(), r#"{"title": "Dune"}"#);

    let (_, stderr, success) = run_shelf(&config_path, &["reconcile", &input]);
    assert!(!success);
    assert!(stderr.contains("expected a JSON array"), "stderr={}", stderr);
}

#[test]
fn test_check_explains_rejection() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_shelf(&config_path, &["check", "by J.K. Rowling"]);
    assert!(success);
    assert!(stdout.starts_with("rejected"), "stdout={}", stdout);
    assert!(stdout.contains("non_book"));

    let (stdout, _, success) = run_shelf(&config_path, &["check", "The Great Gatsby"]);
    assert!(success);
    assert!(stdout.starts_with("kept"), "stdout={}", stdout);

    let (stdout, _, _) = run_shelf(&config_path, &["check", "Sea", "--confidence", "low"]);
    assert!(stdout.contains("validity"), "stdout={}", stdout);
}

#[test]
fn test_tiles_json() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_shelf(
        &config_path,
        &["tiles", "--width", "200", "--height", "100", "--format", "json"],
    );
    assert!(success, "tiles failed: stderr={}", stderr);

    let tiles: Value = serde_json::from_str(&stdout).unwrap();
    let tiles = tiles.as_array().unwrap();
    assert_eq!(tiles.len(), 2);
    assert_eq!(tiles[1]["x"], 100);
    assert_eq!(tiles[1]["width"], 100);
}

#[test]
fn test_scan_replays_tiles() {
    let (tmp, config_path) = setup_test_env();
    let replies = tmp.path().join("replies");
    fs::create_dir_all(&replies).unwrap();
    fs::write(
        replies.join("tile-00.txt"),
        "```json\n[{\"title\": \"The Great Gatsby\", \"confidence\": \"high\", \"x\": 50, \"y\": 50}]\n```",
    )
    .unwrap();
    fs::write(
        replies.join("tile-01.txt"),
        "[{\"title\": \"Great Gatsby\"}, {\"title\": \"Beloved\", \"x\": 50, \"y\": 50}]",
    )
    .unwrap();

    let (stdout, stderr, success) = run_shelf(
        &config_path,
        &[
            "scan",
            replies.to_str().unwrap(),
            "--width",
            "200",
            "--height",
            "100",
        ],
    );
    assert!(success, "scan failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stderr.contains("Scanned 2/2 tiles"));

    let titles: Value = serde_json::from_str(&stdout).unwrap();
    let titles = titles.as_array().unwrap();
    assert_eq!(titles.len(), 2);
    assert_eq!(titles[0]["title"], "The Great Gatsby");
    assert_eq!(titles[0]["x"], 25.0);
    assert_eq!(titles[1]["title"], "Beloved");
    assert_eq!(titles[1]["x"], 75.0);
}

#[test]
fn test_lookup_against_catalog() {
    let (tmp, config_path) = setup_test_env();
    let input = write_candidates(tmp.path(), r#"["Dune", "Emma", "Moby Dick"]"#);

    let catalog = tmp.path().join("catalog.json");
    fs::write(
        &catalog,
        r#"[
            {"title": "Dune", "authors": ["Frank Herbert"], "isbn": "9780441013593"},
            {"title": "Emma", "authors": ["Jane Austen"], "isbn": "9780141439587"}
        ]"#,
    )
    .unwrap();
    let library = tmp.path().join("library.txt");
    fs::write(&library, "9780141439587\n").unwrap();

    let (stdout, stderr, success) = run_shelf(
        &config_path,
        &[
            "lookup",
            &input,
            "--catalog",
            catalog.to_str().unwrap(),
            "--library",
            library.to_str().unwrap(),
            "--format",
            "json",
        ],
    );
    assert!(success, "lookup failed: stderr={}", stderr);

    let outcome: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(outcome["found"].as_array().unwrap().len(), 1);
    assert_eq!(outcome["found"][0]["title"], "Dune");
    assert_eq!(outcome["already_in_library"][0], "Emma");
    assert_eq!(outcome["not_found"][0], "Moby Dick");
}

#[test]
fn test_missing_config_uses_defaults() {
    let tmp = TempDir::new().unwrap();
    let (stdout, _, success) = run_shelf(
        &tmp.path().join("absent.toml"),
        &["tiles", "--width", "1000", "--height", "800", "--format", "json"],
    );
    assert!(success);
    let tiles: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(tiles.as_array().unwrap().len(), 20);
}

#[test]
fn test_invalid_config_fails() {
    let tmp = TempDir::new().unwrap();
    let config_path = tmp.path().join("shelf.toml");
    fs::write(&config_path, "[tiles]\ncolumns = 0\n").unwrap();

    let (_, stderr, success) = run_shelf(&config_path, &["tiles", "--width", "10", "--height", "10"]);
    assert!(!success);
    assert!(stderr.contains("tiles.columns"));
}
