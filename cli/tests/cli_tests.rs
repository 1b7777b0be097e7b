use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// A `drive` command running in an empty directory with fixed secrets
fn drive(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("drive").unwrap();
    cmd.current_dir(dir.path())
        .env("JWT_SECRET", "cli-test-jwt-secret")
        .env("SECRET_KEY", "cli-test-key-secret")
        .env_remove("TOKEN_TTL_HOURS")
        .env_remove("DRIVE_DATABASE")
        .env_remove("FILES_ROOT")
        .env_remove("DRIVE_USER_PASSWORD");
    cmd
}

#[test]
fn test_cli_help() {
    let dir = TempDir::new().unwrap();
    drive(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Drive CLI"))
        .stdout(predicate::str::contains("serve"));
}

#[test]
fn test_cli_version() {
    let dir = TempDir::new().unwrap();
    drive(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("drive"));
}

#[test]
fn test_user_add_creates_user() {
    let dir = TempDir::new().unwrap();
    drive(&dir)
        .args([
            "user",
            "add",
            "alice",
            "--password",
            "wonderland",
            "-g",
            "read:all",
            "-g",
            "delete:own-all",
            "--database",
            "drive.db",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("User alice created"))
        .stdout(predicate::str::contains("read:all, delete:own-all"));

    assert!(dir.path().join("drive.db").exists());

    // Names are unique
    drive(&dir)
        .args(["user", "add", "alice", "--password", "again", "--database", "drive.db"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to create user alice"));
}

#[test]
fn test_user_add_rejects_malformed_grant() {
    let dir = TempDir::new().unwrap();
    drive(&dir)
        .args([
            "user",
            "add",
            "bob",
            "--password",
            "secret",
            "-g",
            "readall",
            "--database",
            "drive.db",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));

    assert!(!dir.path().join("drive.db").exists());
}

#[test]
fn test_key_derive_then_verify() {
    let dir = TempDir::new().unwrap();
    let output = drive(&dir)
        .args(["key", "derive", "user-42", "--length", "16"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let key = String::from_utf8(output.stdout).unwrap().trim().to_string();
    assert_eq!(key.split(':').count(), 2);

    drive(&dir)
        .args(["key", "verify", &key, "user-42"])
        .assert()
        .success()
        .stdout(predicate::str::contains("valid"));

    drive(&dir)
        .args(["key", "verify", &key, "user-43"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not valid"));

    // A different key secret invalidates every key
    drive(&dir)
        .env("SECRET_KEY", "rotated")
        .args(["key", "verify", &key, "user-42"])
        .assert()
        .failure();
}

#[test]
fn test_health_reports_uninitialized_deployment() {
    let dir = TempDir::new().unwrap();
    drive(&dir)
        .args(["health", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"components\""))
        .stdout(predicate::str::contains("not_initialized"));

    assert!(!dir.path().join("data").join("drive.db").exists());
}

#[test]
fn test_health_after_user_add() {
    let dir = TempDir::new().unwrap();
    drive(&dir)
        .args(["user", "add", "carol", "--password", "pw", "--database", "data/drive.db"])
        .assert()
        .success();

    drive(&dir)
        .arg("health")
        .assert()
        .success()
        .stdout(predicate::str::contains("Drive Health Check"))
        .stdout(predicate::str::contains("drive root is seeded"));
}
