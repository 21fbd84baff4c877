//! Command-line behavior of the `droidconf` binary

#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const APP: &str = include_str!("../../../crates/android/tests/fixtures/app.build.gradle.kts");

const LOCAL_PROPERTIES: &str = "\
flutter.compileSdkVersion=35
flutter.ndkVersion=27.0.12077973
flutter.minSdkVersion=21
flutter.targetSdkVersion=35
flutter.versionCode=1
flutter.versionName=1.0.0
";

fn droidconf(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("droidconf").expect("droidconf binary");
    cmd.current_dir(dir.path()).env_remove("RUST_LOG");
    cmd
}

/// Temp project holding the descriptor and a properties file
fn project(descriptor: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("build.gradle.kts");
    fs::write(&path, descriptor).unwrap();
    fs::write(dir.path().join("local.properties"), LOCAL_PROPERTIES).unwrap();
    (dir, path)
}

#[test]
fn test_check_passes_with_warnings() {
    let (dir, path) = project(APP);
    droidconf(&dir)
        .args(["--versions", "local.properties", "check"])
        .arg(&path)
        .assert()
        .success()
        .stderr(predicate::str::contains("DEBUG_SIGNED_RELEASE"))
        .stderr(predicate::str::contains("0 errors, 3 warnings"));
}

#[test]
fn test_check_strict_fails() {
    let (dir, path) = project(APP);
    droidconf(&dir)
        .args(["--versions", "local.properties", "--strict", "check"])
        .arg(&path)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("3 errors, 0 warnings"));
}

#[test]
fn test_missing_symbol_exit_code() {
    let (dir, path) = project(APP);
    droidconf(&dir)
        .arg("check")
        .arg(&path)
        .assert()
        .code(7)
        .stderr(predicate::str::contains("flutter.compileSdkVersion"));
}

#[test]
fn test_defines_satisfy_symbols() {
    let (dir, path) = project(APP);
    droidconf(&dir)
        .args([
            "-D", "compileSdkVersion=35",
            "-D", "ndkVersion=27.0.12077973",
            "-D", "minSdkVersion=21",
            "-D", "targetSdkVersion=35",
            "-D", "versionCode=1",
            "-D", "versionName=1.0.0",
            "emit",
        ])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"minSdk\": 21"));
}

#[test]
fn test_emit_kts() {
    let (dir, path) = project(APP);
    droidconf(&dir)
        .args(["--versions", "local.properties", "--quiet", "emit", "--format", "kts"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("        minSdk = 21\n"))
        .stdout(predicate::str::contains("// id(\"com.google.gms.google-services\")"))
        .stderr(predicate::str::is_empty());
}

#[test]
fn test_emit_refuses_invalid_descriptor() {
    let text = APP.replace("    id(\"kotlin-android\")\n", "    id(\"kotlin-android\")\n    id(\"kotlin-android\")\n");
    let (dir, path) = project(&text);

    droidconf(&dir)
        .args(["--versions", "local.properties", "emit"])
        .arg(&path)
        .assert()
        .code(2)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("DUPLICATE_PLUGIN"));

    droidconf(&dir)
        .args(["--versions", "local.properties", "emit", "--force"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"plugins\""));
}

#[test]
fn test_parse_error_exit_code() {
    let text = APP.replace("com.google.firebase:firebase-bom:34.4.0", "firebase-bom:34.4.0");
    let (dir, path) = project(&text);
    droidconf(&dir)
        .arg("parse")
        .arg(&path)
        .assert()
        .code(6)
        .stderr(predicate::str::contains("line 58"));
}

#[test]
fn test_parse_prints_descriptor() {
    let (dir, path) = project(APP);
    droidconf(&dir)
        .arg("parse")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"flutter.minSdkVersion\""));
}

#[test]
fn test_config_file_policy() {
    let (dir, path) = project(APP);
    fs::write(
        dir.path().join("droidconf.toml"),
        r#"
[versions]
properties = "local.properties"

[validation]
allow_debug_signed_release = false
"#,
    )
    .unwrap();

    droidconf(&dir)
        .arg("check")
        .arg(&path)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("DEBUG_SIGNED_RELEASE"));
}

#[test]
fn test_invalid_config_exit_code() {
    let (dir, path) = project(APP);
    fs::write(dir.path().join(".droidconf.toml"), "[output]\nformat = \"yaml\"\n").unwrap();
    droidconf(&dir).arg("check").arg(&path).assert().code(3);
}

#[test]
fn test_missing_descriptor() {
    let dir = tempfile::tempdir().unwrap();
    droidconf(&dir)
        .args(["parse", "nope.gradle.kts"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("nope.gradle.kts"));
}

#[test]
fn test_bad_define_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    droidconf(&dir)
        .args(["-D", "novalue", "parse", "x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("KEY=VALUE"));
}
