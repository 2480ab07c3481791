//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own data directory and
//! checks the JSON it prints.

use std::path::Path;
use std::process::Command;

use serde_json::Value;
use tempfile::TempDir;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_wordblock"))
        .args(args)
        .env("WORDBLOCK_DATA_DIR", dir)
        .env_remove("WORDBLOCK_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_json(dir: &Path, args: &[&str]) -> Value {
    let (stdout, stderr, code) = run_cli(dir, args);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    serde_json::from_str(&stdout).unwrap_or_else(|e| panic!("{args:?} printed non-JSON ({e}): {stdout}"))
}

/// Two apps in the foreground for the last 20 minutes, well over the
/// default 15-minute interval.
fn record_heavy_usage(dir: &Path) {
    run_json(dir, &["usage", "record", "com.video", "--minutes", "20"]);
    run_json(dir, &["usage", "record", "com.chat", "--minutes", "20"]);
}

fn add_word(dir: &Path, word: &str) -> String {
    let w = run_json(dir, &["word", "add", word, "a definition", "--difficulty", "easy"]);
    w["id"].as_str().unwrap().to_string()
}

#[test]
fn test_word_add_list_search() {
    let dir = TempDir::new().unwrap();
    add_word(dir.path(), "serendipity");
    add_word(dir.path(), "laconic");

    let all = run_json(dir.path(), &["word", "list"]);
    assert_eq!(all.as_array().unwrap().len(), 2);

    let found = run_json(dir.path(), &["word", "search", "SEREN"]);
    assert_eq!(found[0]["word"], "serendipity");

    let stats = run_json(dir.path(), &["word", "stats"]);
    assert_eq!(stats["total"], 2);
    assert_eq!(stats["easy"], 2);
}

#[test]
fn test_word_learn_and_delete() {
    let dir = TempDir::new().unwrap();
    let id = add_word(dir.path(), "ubiquitous");

    let learned = run_json(dir.path(), &["word", "learn", &id]);
    assert_eq!(learned["isLearned"], true);
    let only_learned = run_json(dir.path(), &["word", "list", "--filter", "learned"]);
    assert_eq!(only_learned.as_array().unwrap().len(), 1);

    run_json(dir.path(), &["word", "delete", &id]);
    let (_, stderr, code) = run_cli(dir.path(), &["word", "delete", &id]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error: word not found"));
}

#[test]
fn test_word_add_rejects_blank_definition() {
    let dir = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["word", "add", "empty", "   "]);
    assert_eq!(code, 1);
    assert!(stderr.contains("definition"));
}

#[test]
fn test_block_check_triggers_once() {
    let dir = TempDir::new().unwrap();
    record_heavy_usage(dir.path());

    let first = run_json(dir.path(), &["block", "check"]);
    assert_eq!(first["status"]["shouldBlock"], true);
    assert_eq!(first["blockPending"], true);
    run_json(dir.path(), &["block", "check"]);

    let status = run_json(dir.path(), &["block", "status"]);
    assert_eq!(status["settings"]["totalBlocksTriggered"], 1);
    assert_eq!(status["blockPending"], true);
}

#[test]
fn test_own_app_usage_is_ignored() {
    let dir = TempDir::new().unwrap();
    run_json(dir.path(), &["usage", "record", "com.wordblock", "--minutes", "40"]);
    let check = run_json(dir.path(), &["block", "check"]);
    assert_eq!(check["status"]["shouldBlock"], false);
    assert_eq!(check["status"]["totalUsageMs"], 0);
}

#[test]
fn test_permission_denied_never_blocks() {
    let dir = TempDir::new().unwrap();
    let (_, _, code) = run_cli(dir.path(), &["config", "set", "monitoring.usage_access", "false"]);
    assert_eq!(code, 0);
    run_json(dir.path(), &["usage", "record", "com.video", "--minutes", "90"]);

    let check = run_json(dir.path(), &["block", "check"]);
    assert_eq!(check["status"]["shouldBlock"], false);
    assert_eq!(check["permissionRequired"], true);
    let permission = run_json(dir.path(), &["block", "permission"]);
    assert_eq!(permission["granted"], false);
}

#[test]
fn test_set_interval_validates() {
    let dir = TempDir::new().unwrap();
    let settings = run_json(dir.path(), &["block", "set-interval", "30"]);
    assert_eq!(settings["intervalMinutes"], 30);

    let (_, stderr, code) = run_cli(dir.path(), &["block", "set-interval", "25"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("intervalMinutes"));
}

#[test]
fn test_short_study_keeps_block_pending() {
    let dir = TempDir::new().unwrap();
    record_heavy_usage(dir.path());
    run_json(dir.path(), &["block", "check"]);

    let session = run_json(dir.path(), &["study", "start"]);
    let id = session["id"].as_str().unwrap();
    let outcome = run_json(dir.path(), &["study", "end", id]);
    assert_eq!(outcome["blockCleared"], false);
    assert_eq!(outcome["progress"]["totalSessions"], 1);

    let (_, _, code) = run_cli(dir.path(), &["study", "end", id]);
    assert_eq!(code, 1);
}

#[test]
fn test_manual_clear_rearms() {
    let dir = TempDir::new().unwrap();
    record_heavy_usage(dir.path());
    run_json(dir.path(), &["block", "check"]);

    let cleared = run_json(dir.path(), &["block", "clear"]);
    assert!(cleared.get("lastBlockTime").is_none());
    assert!(cleared["lastClearedTime"].is_string());

    // The window restarts at the clear, so earlier usage no longer counts.
    let check = run_json(dir.path(), &["block", "check"]);
    assert_eq!(check["status"]["shouldBlock"], false);
}

#[test]
fn test_disabled_blocking_reports_idle() {
    let dir = TempDir::new().unwrap();
    run_json(dir.path(), &["block", "disable"]);
    run_json(dir.path(), &["usage", "record", "com.video", "--minutes", "90"]);
    let check = run_json(dir.path(), &["block", "check"]);
    assert_eq!(check["blockingEnabled"], false);
    assert_eq!(check["status"]["shouldBlock"], false);
}

#[test]
fn test_monitor_emits_events() {
    let dir = TempDir::new().unwrap();
    record_heavy_usage(dir.path());

    let (stdout, stderr, code) = run_cli(
        dir.path(),
        &["monitor", "--check-interval", "1", "--duration", "2"],
    );
    assert_eq!(code, 0, "monitor failed: {stderr}");
    let types: Vec<String> = stdout
        .lines()
        .map(|l| serde_json::from_str::<Value>(l).unwrap()["type"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(types.first().map(String::as_str), Some("PollerStarted"));
    assert_eq!(types.last().map(String::as_str), Some("PollerStopped"));
    assert_eq!(types.iter().filter(|t| *t == "BlockTriggered").count(), 1);
}

#[test]
fn test_usage_visits() {
    let dir = TempDir::new().unwrap();
    let visit = run_json(dir.path(), &["usage", "visit", "Learning", "--seconds", "30"]);
    assert_eq!(visit["duration"], 30_000);
    run_json(dir.path(), &["usage", "visit", "Home", "--seconds", "5"]);

    let screens = run_json(dir.path(), &["usage", "screens"]);
    assert_eq!(screens[0]["screen"], "Learning");
    let daily = run_json(dir.path(), &["usage", "daily"]);
    assert!(!daily.as_array().unwrap().is_empty());
    let cleanup = run_json(dir.path(), &["usage", "cleanup"]);
    assert_eq!(cleanup["removed"], 0);
}

#[test]
fn test_stats_commands() {
    let dir = TempDir::new().unwrap();
    add_word(dir.path(), "alpha");
    let summary = run_json(dir.path(), &["stats", "summary"]);
    assert_eq!(summary["totalWords"], 1);
    assert_eq!(summary["learningRate"], 0.0);

    assert_eq!(run_json(dir.path(), &["stats", "daily"]).as_array().unwrap().len(), 7);
    assert_eq!(run_json(dir.path(), &["stats", "weekly"]).as_array().unwrap().len(), 4);
}

#[test]
fn test_config_get_set() {
    let dir = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["config", "get", "study.min_study_secs"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "20");

    let (_, _, code) = run_cli(dir.path(), &["config", "set", "study.min_study_secs", "45"]);
    assert_eq!(code, 0);
    let (stdout, _, _) = run_cli(dir.path(), &["config", "get", "study.min_study_secs"]);
    assert_eq!(stdout.trim(), "45");

    let (_, _, code) = run_cli(dir.path(), &["config", "get", "study.bogus"]);
    assert_eq!(code, 1);
    let listed = run_json(dir.path(), &["config", "list"]);
    assert_eq!(listed["search"]["max_results"], 50);
}

#[test]
fn test_data_export_import_clear() {
    let dir = TempDir::new().unwrap();
    add_word(dir.path(), "alpha");
    let export_path = dir.path().join("export.json");
    run_json(
        dir.path(),
        &["data", "export", "--output", export_path.to_str().unwrap()],
    );

    let (_, _, code) = run_cli(dir.path(), &["data", "clear"]);
    assert_eq!(code, 1);
    let (_, _, code) = run_cli(dir.path(), &["data", "clear", "--yes"]);
    assert_eq!(code, 0);
    assert!(run_json(dir.path(), &["word", "list"]).as_array().unwrap().is_empty());

    let imported = run_json(dir.path(), &["data", "import", export_path.to_str().unwrap()]);
    assert_eq!(imported["imported"], 1);
    assert_eq!(run_json(dir.path(), &["word", "list"]).as_array().unwrap().len(), 1);
}

#[test]
fn test_data_import_without_sync_time() {
    let dir = TempDir::new().unwrap();
    add_word(dir.path(), "alpha");
    let mut exported = run_json(dir.path(), &["data", "export"]);
    exported.as_object_mut().unwrap().remove("lastSyncTime");
    let path = dir.path().join("never-synced.json");
    std::fs::write(&path, exported.to_string()).unwrap();

    let imported = run_json(dir.path(), &["data", "import", path.to_str().unwrap()]);
    assert_eq!(imported["imported"], 1);
    let after = run_json(dir.path(), &["data", "export"]);
    assert_eq!(after["words"].as_array().unwrap().len(), 1);
}

#[test]
fn test_usage_rejects_out_of_range_amounts() {
    let dir = TempDir::new().unwrap();
    let huge = u64::MAX.to_string();
    for args in [
        vec!["usage", "record", "com.video", "--minutes", huge.as_str()],
        vec!["usage", "record", "com.video", "--minutes", "1", "--ago", huge.as_str()],
        vec!["usage", "visit", "Home", "--seconds", huge.as_str()],
    ] {
        let (_, stderr, code) = run_cli(dir.path(), &args);
        assert_eq!(code, 1, "{args:?}: {stderr}");
        assert!(stderr.contains("out of range"), "{args:?}: {stderr}");
    }

    let days = u32::MAX.to_string();
    run_json(dir.path(), &["usage", "visit", "Home", "--seconds", "5"]);
    let daily = run_json(dir.path(), &["usage", "daily", "--days", &days]);
    assert_eq!(daily.as_array().unwrap().len(), 1);
    let screens = run_json(dir.path(), &["usage", "screens", "--days", &days]);
    assert_eq!(screens[0]["screen"], "Home");
}

#[test]
fn test_completions() {
    let dir = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["completions", "bash"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("wordblock"));
}
