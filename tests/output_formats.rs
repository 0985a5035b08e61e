use std::fs;
use std::path::PathBuf;

fn petstore() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/petstore/src")
}

#[test]
fn json_on_stdout_when_requested() {
    let out = std::process::Command::new(env!("CARGO_BIN_EXE_oasgen"))
        .arg(petstore())
        .arg("--format")
        .arg("json")
        .output()
        .expect("run json");
    assert!(out.status.success());
    let s = String::from_utf8_lossy(&out.stdout);
    assert!(s.trim_start().starts_with('{'));
    let v: serde_json::Value = serde_json::from_str(&s).unwrap();
    assert_eq!(v["openapi"], "3.0.0");
    assert_eq!(v["tags"][0]["name"], "pets");
}

#[test]
fn output_directory_gets_default_file_name() {
    let dir = tempfile::tempdir().unwrap();
    let out = std::process::Command::new(env!("CARGO_BIN_EXE_oasgen"))
        .arg("-o")
        .arg(format!("{}/", dir.path().display()))
        .arg(petstore())
        .output()
        .expect("run with output dir");
    assert!(out.status.success());
    assert!(out.stdout.is_empty());
    let written = fs::read_to_string(dir.path().join("openapi.yaml")).unwrap();
    assert!(written.starts_with("openapi: 3.0.0"));
}

#[test]
fn output_file_is_written_in_requested_format() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("spec.json");
    let out = std::process::Command::new(env!("CARGO_BIN_EXE_oasgen"))
        .arg("--output")
        .arg(&target)
        .arg("--format")
        .arg("json")
        .arg("--version")
        .arg("3.1.0")
        .arg(petstore())
        .output()
        .expect("run with output file");
    assert!(out.status.success());
    let v: serde_json::Value = serde_json::from_str(&fs::read_to_string(&target).unwrap()).unwrap();
    assert_eq!(v["openapi"], "3.1.0");

    // `auto` follows the extension.
    let yaml = dir.path().join("spec.yml");
    let out = std::process::Command::new(env!("CARGO_BIN_EXE_oasgen"))
        .arg("--output")
        .arg(&yaml)
        .arg(petstore())
        .output()
        .expect("run with yaml output");
    assert!(out.status.success());
    assert!(fs::read_to_string(&yaml).unwrap().starts_with("openapi:"));
}

#[test]
fn unknown_format_fails_for_stdout_and_files() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("openapi.yaml");
    let runs = [
        vec!["--format".to_string(), "xml".to_string()],
        vec![
            "--format".to_string(),
            "xml".to_string(),
            "-o".to_string(),
            target.display().to_string(),
        ],
    ];
    for args in runs {
        let out = std::process::Command::new(env!("CARGO_BIN_EXE_oasgen"))
            .args(&args)
            .arg(petstore())
            .output()
            .expect("run xml");
        assert_eq!(out.status.code(), Some(1));
        assert!(out.stdout.is_empty());
        assert!(String::from_utf8_lossy(&out.stderr).contains("Unsupported format \"xml\""));
    }
    assert!(!target.exists());
}
