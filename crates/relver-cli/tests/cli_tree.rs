use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn relver_cmd() -> Command {
    Command::cargo_bin("relver").unwrap()
}

fn write_pom(dir: &Path, content: &str) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join("pom.xml"), content).unwrap();
}

fn write_tree(root: &Path) {
    write_pom(
        root,
        r#"<?xml version="1.0"?>
<project>
    <groupId>org.example</groupId>
    <artifactId>demo-root</artifactId>
    <version>1.0.0-SNAPSHOT</version>
    <packaging>pom</packaging>
    <modules>
        <module>core</module>
    </modules>
</project>
"#,
    );
    write_pom(
        &root.join("core"),
        r#"<?xml version="1.0"?>
<project>
    <parent>
        <groupId>org.example</groupId>
        <artifactId>demo-root</artifactId>
        <version>1.0.0-SNAPSHOT</version>
    </parent>
    <artifactId>demo-core</artifactId>
    <version>1.0.0-SNAPSHOT</version>
</project>
"#,
    );
}

#[test]
fn test_tree_prints_nested_modules() {
    let tmp = TempDir::new().unwrap();
    write_tree(tmp.path());

    relver_cmd()
        .current_dir(tmp.path())
        .args(["tree"])
        .assert()
        .success()
        .stdout(predicate::str::contains("org.example:demo-root:1.0.0-SNAPSHOT"))
        .stdout(predicate::str::contains("org.example:demo-core:1.0.0-SNAPSHOT"));
}

#[test]
fn test_tree_without_pom_fails() {
    let tmp = TempDir::new().unwrap();

    relver_cmd()
        .current_dir(tmp.path())
        .args(["tree"])
        .assert()
        .failure();
}

#[test]
fn test_update_outside_working_copy_fails() {
    let tmp = TempDir::new().unwrap();
    write_tree(tmp.path());

    // SNAPSHOT versions are always dirty; without a git repository the
    // version assignment must refuse to run.
    relver_cmd()
        .current_dir(tmp.path())
        .args(["update", "--base-version", "1.0.0"])
        .assert()
        .failure();
}

#[test]
fn test_update_requires_a_base_version() {
    let tmp = TempDir::new().unwrap();
    write_tree(tmp.path());

    relver_cmd()
        .current_dir(tmp.path())
        .args(["update"])
        .assert()
        .failure();
}

#[test]
fn test_commit_without_registry_reports_nothing_to_do() {
    let tmp = TempDir::new().unwrap();
    write_tree(tmp.path());

    relver_cmd()
        .current_dir(tmp.path())
        .args(["commit"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to commit"));
}
