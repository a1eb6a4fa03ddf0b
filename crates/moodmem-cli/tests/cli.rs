use assert_cmd::Command;
use predicates::str::{contains, starts_with};
use std::path::Path;
use tempfile::TempDir;

const EVENTS: &str = r#"[
  {
    "user_id": "u1",
    "conversation_id": "c1",
    "message_id": "m1",
    "persona_id": "p1",
    "emotion": { "label": "ANXIOUS", "intensity": 4 },
    "topics": ["work", null, " "],
    "occurred_at": 1700000000000
  },
  {
    "user_id": "u1",
    "conversation_id": "c1",
    "message_id": "m2",
    "persona_id": "p1",
    "emotion": { "label": "ANXIOUS", "intensity": 2 },
    "topics": ["work"],
    "occurred_at": 1700000060000
  }
]"#;

fn moodmem(db: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("moodmem"));
    cmd.arg("--db-path").arg(db);
    cmd
}

fn recorded_db() -> (TempDir, std::path::PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let db = temp_dir.path().join("memory.db");
    let events = temp_dir.path().join("events.json");
    std::fs::write(&events, EVENTS).unwrap();

    moodmem(&db)
        .arg("record")
        .arg(&events)
        .assert()
        .success()
        .stdout(contains("processed"));

    (temp_dir, db)
}

#[test]
fn test_cli_help() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("moodmem"));
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(contains("MoodMem"));
}

#[test]
fn test_cli_version() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("moodmem"));
    cmd.arg("--version").assert().success();
}

#[test]
fn test_cli_completions() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("moodmem"));
    cmd.args(["completions", "bash"])
        .assert()
        .success()
        .stdout(starts_with("_moodmem"));
}

#[test]
fn test_record_then_block() {
    let (_temp_dir, db) = recorded_db();

    moodmem(&db)
        .args(["block", "--user", "u1", "--conversation", "c1", "--name", "Lin"])
        .assert()
        .success()
        .stdout(contains("[Emotional memory]"))
        .stdout(contains("In this conversation:"))
        .stdout(contains("The user's name is Lin."));

    moodmem(&db)
        .args(["block", "--user", "u1", "--conversation", "c1", "--language", "zh-CN"])
        .assert()
        .success()
        .stdout(contains("【情绪记忆】"));
}

#[test]
fn test_record_rejects_incomplete_event_from_stdin() {
    let temp_dir = TempDir::new().unwrap();
    let db = temp_dir.path().join("memory.db");

    moodmem(&db)
        .args(["record", "-"])
        .write_stdin(r#"{"user_id":"u1","conversation_id":"c1","message_id":"m1"}"#)
        .assert()
        .success()
        .stdout(contains("rejected"));

    moodmem(&db)
        .args(["show", "profile", "u1"])
        .assert()
        .failure();
}

#[test]
fn test_show_state_and_profile_json() {
    let (_temp_dir, db) = recorded_db();

    moodmem(&db)
        .args(["--format", "json", "show", "state", "c1"])
        .assert()
        .success()
        .stdout(contains("\"conversation_id\": \"c1\""))
        .stdout(contains("\"version\": 2"));

    moodmem(&db)
        .args(["--format", "json", "show", "profile", "u1"])
        .assert()
        .success()
        .stdout(contains("\"ANXIOUS\""));
}

#[test]
fn test_block_without_memory_is_empty() {
    let temp_dir = TempDir::new().unwrap();
    let db = temp_dir.path().join("memory.db");

    moodmem(&db)
        .args(["block", "--user", "nobody"])
        .assert()
        .success()
        .stdout("");
}

#[test]
fn test_fact_put_and_list() {
    let temp_dir = TempDir::new().unwrap();
    let db = temp_dir.path().join("memory.db");

    moodmem(&db)
        .args(["fact", "put", "--user", "u1", "--kind", "preference.like", "--value", "rain"])
        .assert()
        .success()
        .stdout(contains("Stored preference.like"));

    moodmem(&db)
        .args(["--format", "json", "fact", "list", "--user", "u1"])
        .assert()
        .success()
        .stdout(contains("\"value\": \"rain\""));

    moodmem(&db)
        .args(["show", "snapshot", "u1"])
        .assert()
        .success()
        .stdout(contains("Likes: rain"));

    moodmem(&db)
        .args(["fact", "clear", "--user", "u1", "--kind", "preference.like"])
        .assert()
        .success()
        .stdout(contains("Removed 1 preference.like"));

    moodmem(&db)
        .args(["show", "snapshot", "u1"])
        .assert()
        .success()
        .stdout(contains("No persona facts"));
}

#[test]
fn test_config_set_and_unknown_key() {
    let temp_dir = TempDir::new().unwrap();
    let db = temp_dir.path().join("memory.db");

    moodmem(&db)
        .args(["config", "set", "window_size", "8"])
        .assert()
        .success()
        .stdout(contains("Set window_size = 8"));

    moodmem(&db)
        .args(["--format", "json", "config", "show"])
        .assert()
        .success()
        .stdout(contains("\"window_size\": 8"));

    moodmem(&db)
        .args(["config", "set", "no_such_key", "1"])
        .assert()
        .failure()
        .stderr(contains("Unknown config key"));
}
