use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn relver_cmd() -> Command {
    Command::cargo_bin("relver").unwrap()
}

fn git_available() -> bool {
    std::process::Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn git(dir: &Path, args: &[&str]) {
    let status = std::process::Command::new("git")
        .args(args)
        .current_dir(dir)
        .status()
        .unwrap();
    assert!(status.success(), "git {args:?} failed");
}

fn setup_repo(root: &Path) {
    fs::write(
        root.join("pom.xml"),
        r#"<?xml version="1.0"?>
<project>
    <groupId>org.example</groupId>
    <artifactId>solo</artifactId>
    <version>1.0.0-SNAPSHOT</version>
</project>
"#,
    )
    .unwrap();
    git(root, &["init", "-q"]);
    git(root, &["config", "user.name", "test"]);
    git(root, &["config", "user.email", "test@example.org"]);
    git(root, &["add", "."]);
    git(root, &["commit", "-q", "-m", "initial import"]);
}

#[test]
fn test_update_rewrites_and_commits_a_snapshot_module() {
    if !git_available() {
        eprintln!("git not available, skipping");
        return;
    }

    let tmp = TempDir::new().unwrap();
    setup_repo(tmp.path());

    relver_cmd()
        .current_dir(tmp.path())
        .args(["update", "--base-version", "1.4.0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated 1 descriptors"));

    let pom = fs::read_to_string(tmp.path().join("pom.xml")).unwrap();
    assert!(pom.contains("<version>1.4.0-"));
    assert!(!pom.contains("SNAPSHOT"));

    // The rewritten descriptor was committed with the relver prefix.
    let log = std::process::Command::new("git")
        .args(["log", "-1", "--format=%s"])
        .current_dir(tmp.path())
        .output()
        .unwrap();
    assert!(String::from_utf8_lossy(&log.stdout).starts_with("[relver]"));

    // A second run sees the version-bump commit as relver's own and
    // leaves the tree alone.
    relver_cmd()
        .current_dir(tmp.path())
        .args(["update", "--base-version", "1.4.0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("up-to-date"));
}

#[test]
fn test_update_metadata_emits_json() {
    if !git_available() {
        eprintln!("git not available, skipping");
        return;
    }

    let tmp = TempDir::new().unwrap();
    setup_repo(tmp.path());

    relver_cmd()
        .current_dir(tmp.path())
        .args(["update", "--base-version", "2.0.0", "--metadata"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"patched_files\""))
        .stdout(predicate::str::contains("\"ordered_modules\""));
}

#[test]
fn test_deferred_update_then_commit() {
    if !git_available() {
        eprintln!("git not available, skipping");
        return;
    }

    let tmp = TempDir::new().unwrap();
    setup_repo(tmp.path());

    relver_cmd()
        .current_dir(tmp.path())
        .args(["update", "--base-version", "1.4.0", "--defer-commit"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Commit deferred"));

    assert!(tmp.path().join("relver-dirty-modules.txt").exists());

    relver_cmd()
        .current_dir(tmp.path())
        .args(["commit"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Committed 1 descriptors"));
}
