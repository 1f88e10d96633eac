#![allow(deprecated)]
//! Exit codes and output contract of the `tsbridge` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

const ADDRESS_INFO: &str = r#"export interface AddressInfo {
  embedded: {
    address: string
    scriptPubKey: string
    isscript: boolean
    iswitness: boolean
    witness_version: number
    witness_program: string
    script: ScriptType
    hex: string,
    sigsrequired: number
    pubkey: string
    pubkeys: string[]
  }
}
"#;

const FIXTURE: &str = r#"{ "embedded": { "address": "1A1zP1", "scriptPubKey": "76a914",
  "isscript": false, "iswitness": false, "witness_version": 0, "witness_program": "",
  "script": "pubkeyhash", "hex": "76a914", "sigsrequired": 1, "pubkey": "02",
  "pubkeys": ["02"] } }"#;

fn tsbridge(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("tsbridge").unwrap();
    cmd.current_dir(dir).env("RUST_LOG", "warn").env_remove("TSBRIDGE_CONFIG");
    cmd
}

fn write(dir: &Path, name: &str, text: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, text).unwrap();
    path
}

#[test]
fn transpile_to_stdout_with_header() {
    let dir = tempdir().unwrap();
    write(dir.path(), "nested_types.ts", ADDRESS_INFO);

    tsbridge(dir.path())
        .args(["transpile", "nested_types.ts", "--target", "rust"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("// @generated by tsbridge"))
        .stdout(predicate::str::contains("from nested_types.ts; source sha256: "))
        .stdout(predicate::str::contains("pub struct AddressInfoEmbedded {"))
        .stdout(predicate::str::contains("#[serde(rename = \"scriptPubKey\")]"));
}

#[test]
fn transpile_writes_output_file() {
    let dir = tempdir().unwrap();
    write(dir.path(), "nested_types.ts", ADDRESS_INFO);

    tsbridge(dir.path())
        .args(["transpile", "nested_types.ts", "-t", "proto", "-o", "gen/address.proto"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Wrote gen/address.proto"));

    let text = fs::read_to_string(dir.path().join("gen/address.proto")).unwrap();
    assert!(text.contains("syntax = \"proto3\";"));
    assert!(text.contains("  message Embedded {"));
}

#[test]
fn config_file_is_picked_up_from_working_directory() {
    let dir = tempdir().unwrap();
    write(dir.path(), "nested_types.ts", ADDRESS_INFO);
    write(
        dir.path(),
        "tsbridge.yaml",
        "header: false\nrust:\n  number_type: i64\nproto:\n  package: bitcoin.rpc\n",
    );

    tsbridge(dir.path())
        .args(["transpile", "nested_types.ts", "--target", "rust"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("use serde::"))
        .stdout(predicate::str::contains("pub witness_version: i64,"));

    tsbridge(dir.path())
        .args(["transpile", "nested_types.ts", "--target", "proto"])
        .assert()
        .success()
        .stdout(predicate::str::contains("package bitcoin.rpc;"));
}

#[test]
fn invalid_config_is_a_config_error() {
    let dir = tempdir().unwrap();
    write(dir.path(), "nested_types.ts", ADDRESS_INFO);
    write(dir.path(), "tsbridge.yaml", "rust:\n  numbr_type: i64\n");

    tsbridge(dir.path())
        .args(["transpile", "nested_types.ts", "--target", "rust"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("tsbridge.yaml"));
}

#[test]
fn parse_error_exit_code_and_position() {
    let dir = tempdir().unwrap();
    write(dir.path(), "broken.ts", "export interface A {\n  a: string\n  b: string c: number\n}\n");

    tsbridge(dir.path())
        .args(["transpile", "broken.ts", "--target", "rust"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("parse error in broken.ts:3:"));
}

#[test]
fn unmodelled_type_warns_then_fails_in_strict_mode() {
    let dir = tempdir().unwrap();
    write(dir.path(), "both.ts", "export interface A {\n  a: string\n  b: A & B\n}\n");

    tsbridge(dir.path())
        .args(["transpile", "both.ts", "--target", "rust"])
        .assert()
        .success()
        .stdout(predicate::str::contains("pub b: serde_json::Value,"))
        .stderr(predicate::str::contains("1 warning(s)"));

    tsbridge(dir.path())
        .args(["transpile", "both.ts", "--target", "rust", "--strict"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("type `A & B` of 'b'"));
}

#[test]
fn missing_input_and_unknown_target() {
    let dir = tempdir().unwrap();
    tsbridge(dir.path())
        .args(["transpile", "nope.ts", "--target", "rust"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("failed to read nope.ts"));

    write(dir.path(), "a.ts", ADDRESS_INFO);
    tsbridge(dir.path())
        .args(["transpile", "a.ts", "--target", "kotlin"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown target 'kotlin'"));
}

#[test]
fn strict_flag_fails_on_unsupported_constructs() {
    let dir = tempdir().unwrap();
    write(
        dir.path(),
        "client.ts",
        "export class Client {\n  async ping (): Promise<string> {\n    return 'pong'\n  }\n}\n",
    );

    tsbridge(dir.path())
        .args(["transpile", "client.ts", "--target", "rust"])
        .assert()
        .success()
        .stderr(predicate::str::contains("1 warning(s)"));

    tsbridge(dir.path())
        .args(["transpile", "client.ts", "--target", "rust", "--strict"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("method 'ping' has no recognised RPC call"));
}

#[test]
fn check_detects_stale_output() {
    let dir = tempdir().unwrap();
    let input = write(dir.path(), "nested_types.ts", ADDRESS_INFO);

    tsbridge(dir.path())
        .args(["transpile", "nested_types.ts", "-t", "rust", "-o", "out.rs"])
        .assert()
        .success();

    tsbridge(dir.path())
        .args(["check", "nested_types.ts", "-t", "rust", "--against", "out.rs"])
        .assert()
        .success()
        .stderr(predicate::str::contains("up to date"));

    fs::write(&input, ADDRESS_INFO.replace("pubkeys: string[]", "pubkeys?: string[]")).unwrap();
    tsbridge(dir.path())
        .args(["check", "nested_types.ts", "-t", "rust", "--against", "out.rs"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("changed since it was generated"));
}

#[test]
fn inspect_dumps_declaration_model() {
    let dir = tempdir().unwrap();
    write(dir.path(), "nested_types.ts", ADDRESS_INFO);

    let output = tsbridge(dir.path())
        .args(["inspect", "nested_types.ts"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let doc: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let decl = &doc["declarations"][0];
    assert_eq!(decl["kind"], "interface");
    assert_eq!(decl["name"], "AddressInfo");

    tsbridge(dir.path())
        .args(["inspect", "nested_types.ts", "--format", "yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("name: AddressInfo"));
}

#[test]
fn conform_accepts_fixture_and_reports_violations() {
    let dir = tempdir().unwrap();
    write(dir.path(), "nested_types.ts", ADDRESS_INFO);
    write(dir.path(), "good.json", FIXTURE);
    write(
        dir.path(),
        "bad.json",
        &FIXTURE
            .replace("\"witness_version\": 0", "\"witness_version\": \"0\"")
            .replace(",\n  \"pubkeys\": [\"02\"]", ""),
    );

    tsbridge(dir.path())
        .args(["conform", "nested_types.ts", "--type", "AddressInfo", "good.json", "--strict"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    tsbridge(dir.path())
        .args(["conform", "nested_types.ts", "--type", "AddressInfo", "bad.json"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains(
            "/embedded/witness_version: expected number, found string",
        ))
        .stdout(predicate::str::contains("/embedded/pubkeys: missing required field"));
}

#[test]
fn conform_json_report() {
    let dir = tempdir().unwrap();
    write(dir.path(), "nested_types.ts", ADDRESS_INFO);
    write(dir.path(), "fixture.json", FIXTURE);

    let output = tsbridge(dir.path())
        .args([
            "conform",
            "nested_types.ts",
            "--type",
            "Missing",
            "fixture.json",
            "--format",
            "json",
        ])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["conforms"], false);
    assert_eq!(report["violations"][0]["kind"], "unknown_type");
}

#[test]
fn version_prints_package_version() {
    let dir = tempdir().unwrap();
    tsbridge(dir.path())
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::diff(format!("{}\n", env!("CARGO_PKG_VERSION"))));
}
