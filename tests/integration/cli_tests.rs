use assert_cmd::Command;
use predicates::str::contains;
use std::path::Path;
use tempfile::tempdir;

fn forgecache(dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_forgecache"));
    cmd.env_remove("RUST_LOG")
        .env("NO_COLOR", "1")
        .env("FORGECACHE_PRETTY", "true")
        .arg("--workspace")
        .arg(dir.join("project"))
        .arg("--user-root")
        .arg(dir.join("user"))
        .arg("--config")
        .arg(dir.join("config.toml"));
    cmd
}

fn setup() -> tempfile::TempDir {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("config.toml"), "atomic_writes = true\n").unwrap();
    dir
}

#[test]
fn test_write_read_end_to_end() {
    let dir = setup();
    forgecache(dir.path())
        .args(["write", "releases/latest", r#"{"tag": "v1.2.0"}"#])
        .assert()
        .success();

    forgecache(dir.path())
        .args(["read", "releases/latest"])
        .assert()
        .success()
        .stdout(contains("\"tag\": \"v1.2.0\""));

    assert!(dir
        .path()
        .join("project/.forge/releases/latest.json")
        .is_file());
}

#[test]
fn test_write_from_stdin() {
    let dir = setup();
    forgecache(dir.path())
        .args(["write", "--scope", "user", "piped", "-"])
        .write_stdin("[1, 2, 3]")
        .assert()
        .success();

    forgecache(dir.path())
        .args(["list", "--scope", "user"])
        .assert()
        .success()
        .stdout(contains("piped.json"));
}

#[test]
fn test_read_missing_exit_code() {
    let dir = setup();
    forgecache(dir.path())
        .args(["read", "nothing"])
        .assert()
        .code(2)
        .stderr(contains("FC002"));
}

#[test]
fn test_json_errors() {
    let dir = setup();
    forgecache(dir.path())
        .args(["--json-errors", "write", "k", "{broken"])
        .assert()
        .code(4)
        .stderr(contains("\"code\": \"FC004\""));
}

#[test]
fn test_clear_scope_needs_confirmation() {
    let dir = setup();
    forgecache(dir.path())
        .args(["write", "a", "1"])
        .assert()
        .success();

    forgecache(dir.path()).args(["clear"]).assert().code(4);
    forgecache(dir.path())
        .args(["clear", "--yes"])
        .assert()
        .success()
        .stdout(contains("cleared 1 entries"));
    forgecache(dir.path())
        .args(["exists", "a"])
        .assert()
        .code(2)
        .stdout(contains("false"));
}

#[test]
fn test_missing_config_file_fails() {
    let dir = tempdir().unwrap();
    forgecache(dir.path())
        .args(["list"])
        .assert()
        .code(1)
        .stderr(contains("Config file not found"));
}

#[test]
fn test_piped_output_is_unstyled() {
    let dir = setup();
    for args in [&["write", "a", "1"][..], &["roots"][..], &["stats"][..]] {
        let output = forgecache(dir.path())
            .env_remove("NO_COLOR")
            .env_remove("CLICOLOR_FORCE")
            .args(args)
            .output()
            .unwrap();
        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(!stdout.contains('\u{1b}'), "escape codes in {args:?}: {stdout:?}");
    }
}

#[test]
fn test_json_errors_include_path() {
    let dir = setup();
    forgecache(dir.path())
        .args(["--json-errors", "read", "nothing"])
        .assert()
        .code(2)
        .stderr(contains("\"code\": \"FC002\""))
        .stderr(contains("\"path\""))
        .stderr(contains("nothing.json"));
}

#[test]
fn test_clear_separator_key_is_rejected() {
    let dir = setup();
    forgecache(dir.path())
        .args(["write", "a", "1"])
        .assert()
        .success();

    forgecache(dir.path())
        .args(["clear", "/"])
        .assert()
        .code(4)
        .stderr(contains("FC004"));
    forgecache(dir.path())
        .args(["exists", "a"])
        .assert()
        .success()
        .stdout(contains("true"));
}
