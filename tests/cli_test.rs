//! Driver tests: exit-code contract and the suite runner's Je convention.

use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

fn joosc() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_joosc"));
    cmd.arg("--stdlib")
        .arg(concat!(env!("CARGO_MANIFEST_DIR"), "/stdlib"));
    cmd
}

fn write(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn accepted_program_exits_zero() {
    let dir = TempDir::new().unwrap();
    let file = write(
        dir.path(),
        "Main.java",
        "public class Main { public Main() { int x = 1 + 2; } }",
    );

    let output = joosc().arg("check").arg(&file).output().unwrap();
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn rejected_program_exits_42() {
    let dir = TempDir::new().unwrap();
    let file = write(
        dir.path(),
        "Main.java",
        "public class Main { public Main() { int x = true; } }",
    );

    let output = joosc().arg("check").arg(&file).output().unwrap();
    assert_eq!(output.status.code(), Some(42));
}

#[test]
fn syntax_error_exits_42() {
    let dir = TempDir::new().unwrap();
    let file = write(dir.path(), "Main.java", "public class Main {");

    let output = joosc().arg("check").arg(&file).output().unwrap();
    assert_eq!(output.status.code(), Some(42));
}

#[test]
fn missing_file_is_an_internal_failure() {
    let output = joosc().arg("check").arg("no/such/File.java").output().unwrap();
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn json_outcome() {
    let dir = TempDir::new().unwrap();
    let file = write(
        dir.path(),
        "Main.java",
        "public class Main { public Main() { int x = true; } }",
    );

    let output = joosc()
        .arg("check")
        .arg(&file)
        .arg("--json")
        .output()
        .unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    let parsed: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(parsed["outcome"], "rejected");
    assert!(parsed["error"].as_str().unwrap().contains("Cannot assign"));
}

#[test]
fn suite_runner_honors_je_convention() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "Ok.java",
        "public class Ok { public Ok() {} }",
    );
    // Je cases are expected to be rejected; this one is.
    write(
        dir.path(),
        "JeBadAssign.java",
        "public class JeBadAssign { public JeBadAssign() { int x = true; } }",
    );
    // A multi-file case in a subdirectory.
    write(
        dir.path(),
        "pair/A.java",
        "public class A { public A() {} }",
    );
    write(
        dir.path(),
        "pair/B.java",
        "public class B extends A { public B() {} }",
    );

    let output = joosc().arg("suite").arg(dir.path()).output().unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "stdout: {stdout}");
    assert!(stdout.contains("passed 3/3"), "stdout: {stdout}");
}

#[test]
fn suite_runner_reports_unexpected_acceptance() {
    let dir = TempDir::new().unwrap();
    // Expected to fail but actually fine.
    write(
        dir.path(),
        "JeActuallyFine.java",
        "public class JeActuallyFine { public JeActuallyFine() {} }",
    );

    let output = joosc().arg("suite").arg(dir.path()).output().unwrap();
    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("FAILED"));
}

#[test]
fn config_command_prints_effective_settings() {
    let output = joosc().arg("config").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("stdlib_path"));
    assert!(stdout.contains("[logging]"));
}
