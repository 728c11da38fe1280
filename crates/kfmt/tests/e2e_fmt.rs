//! End-to-end integration tests for the `kfmt` binary.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

fn find_kfmt() -> PathBuf {
    let mut path = std::env::current_exe()
        .expect("cannot find current exe")
        .parent()
        .expect("cannot find parent dir")
        .to_path_buf();
    // Walk up from deps dir to the debug dir.
    if path.ends_with("deps") {
        path.pop();
    }
    path.join("kfmt")
}

#[test]
fn fmt_formats_single_file_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("test.kt");
    std::fs::write(&file, "fun add(a:Int,b:Int):Int{\nreturn a+b\n}").unwrap();

    let output = Command::new(find_kfmt())
        .arg(file.to_str().unwrap())
        .output()
        .expect("failed to run kfmt");

    assert!(
        output.status.success(),
        "kfmt failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let contents = std::fs::read_to_string(&file).unwrap();
    assert_eq!(contents, "fun add(a: Int, b: Int): Int {\n    return a + b\n}\n");
}

#[test]
fn fmt_already_formatted_file_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("good.kt");
    let canonical = "fun add(a: Int, b: Int): Int {\n    return a + b\n}\n";
    std::fs::write(&file, canonical).unwrap();

    let output = Command::new(find_kfmt())
        .arg(file.to_str().unwrap())
        .output()
        .expect("failed to run kfmt");

    assert!(output.status.success());
    assert_eq!(std::fs::read_to_string(&file).unwrap(), canonical);
}

#[test]
fn check_exits_1_on_unformatted() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("bad.kt");
    std::fs::write(&file, "val  x=1").unwrap();

    let output = Command::new(find_kfmt())
        .args(["--check", file.to_str().unwrap()])
        .output()
        .expect("failed to run kfmt --check");

    assert_eq!(
        output.status.code(),
        Some(1),
        "Expected exit 1 for unformatted file"
    );

    // File must NOT be modified in check mode.
    assert_eq!(std::fs::read_to_string(&file).unwrap(), "val  x=1");
}

#[test]
fn check_exits_0_on_formatted() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("good.kt");
    std::fs::write(&file, "val x = 1\n").unwrap();

    let output = Command::new(find_kfmt())
        .args(["--check", file.to_str().unwrap()])
        .output()
        .expect("failed to run kfmt --check");

    assert!(
        output.status.success(),
        "Expected exit 0 for formatted file, got: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn directory_formats_all_kotlin_files() {
    let dir = tempfile::tempdir().unwrap();
    let sub = dir.path().join("sub");
    std::fs::create_dir_all(&sub).unwrap();

    std::fs::write(dir.path().join("a.kt"), "val x=1").unwrap();
    std::fs::write(sub.join("b.kts"), "val y=2").unwrap();
    // Non-Kotlin file must be ignored.
    std::fs::write(dir.path().join("readme.txt"), "hello").unwrap();

    let output = Command::new(find_kfmt())
        .arg(dir.path().to_str().unwrap())
        .output()
        .expect("failed to run kfmt on directory");

    assert!(
        output.status.success(),
        "kfmt dir failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    assert_eq!(
        std::fs::read_to_string(dir.path().join("a.kt")).unwrap(),
        "val x = 1\n"
    );
    assert_eq!(std::fs::read_to_string(sub.join("b.kts")).unwrap(), "val y = 2\n");
    assert_eq!(
        std::fs::read_to_string(dir.path().join("readme.txt")).unwrap(),
        "hello"
    );
}

#[test]
fn custom_line_length_changes_breaking() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("test.kt");
    std::fs::write(
        &file,
        "class Person(firstName: String, lastName: String, age: Int)\n",
    )
    .unwrap();

    let output = Command::new(find_kfmt())
        .args(["--max-line-length", "50", file.to_str().unwrap()])
        .output()
        .expect("failed to run kfmt with options");

    assert!(output.status.success());

    let contents = std::fs::read_to_string(&file).unwrap();
    assert_eq!(
        contents,
        "class Person(\n    firstName: String,\n    lastName: String,\n    age: Int\n)\n"
    );
}

#[test]
fn stdin_writes_stdout_and_leaves_no_files() {
    let mut child = Command::new(find_kfmt())
        .arg("--stdin")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn kfmt --stdin");

    child
        .stdin
        .as_mut()
        .unwrap()
        .write_all(b"val  x=1")
        .unwrap();
    let output = child.wait_with_output().unwrap();

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "val x = 1\n");
}

#[test]
fn parse_error_reports_file_and_line() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("broken.kt");
    std::fs::write(&file, "fun broken(").unwrap();

    let output = Command::new(find_kfmt())
        .arg(file.to_str().unwrap())
        .output()
        .expect("failed to run kfmt");

    // The only file failed: unrecoverable.
    assert_eq!(output.status.code(), Some(2));

    let stderr = String::from_utf8_lossy(&output.stderr);
    let expected_prefix = format!("{}:1: parse error:", file.display());
    assert!(
        stderr.contains(&expected_prefix),
        "missing diagnostic line in: {stderr}"
    );

    // The file is untouched.
    assert_eq!(std::fs::read_to_string(&file).unwrap(), "fun broken(");
}

#[test]
fn one_bad_file_does_not_stop_the_rest() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("bad.kt"), "fun broken(").unwrap();
    std::fs::write(dir.path().join("good.kt"), "val x=1").unwrap();

    let output = Command::new(find_kfmt())
        .arg(dir.path().to_str().unwrap())
        .output()
        .expect("failed to run kfmt");

    // Not every file failed, so this is not exit 2.
    assert_eq!(output.status.code(), Some(0));

    assert_eq!(
        std::fs::read_to_string(dir.path().join("good.kt")).unwrap(),
        "val x = 1\n"
    );
    assert_eq!(
        std::fs::read_to_string(dir.path().join("bad.kt")).unwrap(),
        "fun broken("
    );
}

#[test]
fn no_inputs_is_a_configuration_error() {
    let output = Command::new(find_kfmt())
        .output()
        .expect("failed to run kfmt");
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("configuration error"), "stderr: {stderr}");
}
