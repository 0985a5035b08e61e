use std::path::PathBuf;
use std::process::{Command, Output};

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_oasgen"))
        .args(args)
        .output()
        .expect("run binary")
}

fn petstore() -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures/petstore/src")
        .display()
        .to_string()
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

#[test]
fn help_always_exits_one_and_skips_generation() {
    let root = petstore();
    for args in [vec!["--help"], vec!["-h", root.as_str()], vec!["--debug", "-h"]] {
        let out = run(&args);
        assert_eq!(out.status.code(), Some(1));
        assert!(out.stdout.is_empty());
        let err = stderr(&out);
        assert!(err.contains("Usage: oasgen"));
        assert!(!err.contains("Error:"));
    }
}

#[test]
fn missing_paths_show_error_and_usage() {
    let out = run(&["--format", "json"]);
    assert_eq!(out.status.code(), Some(1));
    let err = stderr(&out);
    assert!(err.contains("Error: Specify at least one path."));
    assert!(err.contains("Usage: oasgen"));
}

#[test]
fn unknown_options() {
    let root = petstore();
    let out = run(&[root.as_str(), "--frobnicate"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("Error: Unknown option: --frobnicate"));

    let out = run(&[root.as_str(), "-z"]);
    assert!(stderr(&out).contains("Error: Unknown option: -z"));
    assert!(out.stdout.is_empty());
}

#[test]
fn missing_argument() {
    let root = petstore();
    let out = run(&[root.as_str(), "--output", "--debug"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("Error: Missing argument for --output"));

    let out = run(&[root.as_str(), "-n"]);
    assert!(stderr(&out).contains("Error: Missing argument for -n"));
}

#[test]
fn unreadable_bootstrap() {
    let root = petstore();
    let out = run(&["--bootstrap", "/no/such/bootstrap.toml", root.as_str()]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("Error: Invalid `--bootstrap` value: `/no/such/bootstrap.toml`"));
}

#[test]
fn later_usage_errors_replace_earlier_ones() {
    // The unknown option stops parsing before any path is seen, so the
    // missing-path check runs last and is the one reported.
    let out = run(&["--bogus", "src"]);
    assert_eq!(out.status.code(), Some(1));
    let err = stderr(&out);
    assert!(err.contains("Error: Specify at least one path."));
    assert!(!err.contains("Unknown option"));
}

#[test]
fn missing_root_is_an_uncaught_failure() {
    let out = run(&["/definitely/not/a/project"]);
    assert_eq!(out.status.code(), Some(2));
    assert!(stderr(&out).contains("Error: Directory \"/definitely/not/a/project\" doesn't exist"));
    assert!(!stderr(&out).contains("Usage:"));
}

#[test]
fn invalid_bootstrap_is_an_uncaught_failure() {
    let dir = tempfile::tempdir().unwrap();
    let boot = dir.path().join("boot.toml");
    std::fs::write(&boot, "this is = = not toml").unwrap();
    let boot = boot.display().to_string();
    let root = petstore();
    let out = run(&["--bootstrap", boot.as_str(), root.as_str()]);
    assert_eq!(out.status.code(), Some(1));
    assert!(out.stdout.is_empty());
    let err = stderr(&out);
    assert!(err.contains(&format!("Error: Invalid bootstrap file {boot}")));
    assert!(!err.contains("Usage:"));
}
