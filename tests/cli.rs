//! Exit codes and output streams of the `udmf` binary.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use pretty_assertions::assert_eq;
use tempfile::tempdir;

fn udmf(args: &[&str], file: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_udmf"))
        .args(args)
        .arg(file)
        .env("NO_COLOR", "1")
        .output()
        .unwrap()
}

fn write_map(dir: &Path, contents: &str) -> PathBuf {
    let path = dir.join("TEXTMAP");
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_parse_success_exits_zero() {
    let fixture =
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/ringracers.textmap");
    let output = udmf(&["parse"], &fixture);
    assert_eq!(output.status.code(), Some(0));
    assert!(output.stdout.is_empty());
}

#[test]
fn test_parse_error_exits_one() {
    let dir = tempdir().unwrap();
    let path = write_map(dir.path(), "namespace = \"ringracers\";\nlinedef { id = ; }\n");

    let output = udmf(&["parse", "--strict"], &path);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("udmf::parse"), "{}", stderr);
}

#[test]
fn test_validation_error_exits_two_only_when_strict() {
    let dir = tempdir().unwrap();
    let path = write_map(
        dir.path(),
        "namespace = \"ringracers\";\nvertex { x = \"left\"; y = 0.0; }\n",
    );

    assert_eq!(udmf(&["parse"], &path).status.code(), Some(2));
    assert_eq!(udmf(&["parse", "--permissive"], &path).status.code(), Some(0));
}

#[test]
fn test_emit_text_writes_canonical_document() {
    let dir = tempdir().unwrap();
    let path = write_map(
        dir.path(),
        "namespace = \"ringracers\"; linedef { id = 0; v1 = 0; v2 = 1; special = 0; }",
    );

    let output = udmf(&["parse", "--emit", "text"], &path);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(
        String::from_utf8(output.stdout).unwrap(),
        "namespace = \"ringracers\";\n\nlinedef\n{\n  id = 0;\n  v1 = 0;\n  v2 = 1;\n  sideback = -1;\n  special = 0;\n  twosided = false;\n}\n"
    );
}

#[test]
fn test_json_report() {
    let dir = tempdir().unwrap();
    let path = write_map(
        dir.path(),
        "namespace = \"ringracers\";\nsector { texturefloor = \"A\"; textureceiling = \"B\"; note = 1; }\n",
    );

    let output = udmf(&["parse", "--format", "json"], &path);
    assert_eq!(output.status.code(), Some(0));

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["namespace"], "ringracers");
    assert_eq!(report["blocks"], 1);
    let codes: Vec<&str> = report["diagnostics"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["code"].as_str().unwrap())
        .collect();
    assert!(codes.contains(&"UnknownField"));
    assert!(codes.contains(&"DefaultInjected"));
}

#[test]
fn test_unknown_profile_is_an_error() {
    let dir = tempdir().unwrap();
    let path = write_map(dir.path(), "namespace = \"ringracers\";");

    let output = udmf(&["parse", "--schema", "quake"], &path);
    assert!(!output.status.success());
    assert_ne!(output.status.code(), Some(0));
}
