mod common;

use std::fs;

use abi_core::dump;
use abi_diff::commands::summarize_dump;
use abi_diff::sha256_hex;
use common::{library, with_private_record, write_dump};
use predicates::prelude::*;
use tempfile::tempdir;

/// inspect prints per-kind type counts and entity totals.
#[test]
fn inspect_prints_counts() {
    let dir = tempdir().expect("tempdir");
    let path = write_dump(dir.path(), "lib.lsdump", &with_private_record(library("int", &["bar"]), 4));

    assert_cmd::cargo::cargo_bin_cmd!("abi-diff")
        .arg("inspect")
        .arg("--dump")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Dump: "))
        .stdout(predicate::str::contains("- builtin: 2"))
        .stdout(predicate::str::contains("- record: 1"))
        .stdout(predicate::str::contains("Functions: 2"))
        .stdout(predicate::str::contains("ELF objects: 1"));
}

/// inspect --json emits the summary as JSON.
#[test]
fn inspect_json_matches_summary() {
    let dir = tempdir().expect("tempdir");
    let path = write_dump(dir.path(), "lib.lsdump", &library("int", &[]));

    let assert = assert_cmd::cargo::cargo_bin_cmd!("abi-diff")
        .arg("inspect")
        .arg("--dump")
        .arg(&path)
        .arg("--json")
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8");
    let value: serde_json::Value = serde_json::from_str(&stdout).expect("json");

    let summary = summarize_dump(&path).expect("summarize");
    assert_eq!(value["functions"], summary.functions);
    assert_eq!(value["types"]["builtin"], 2);
    assert_eq!(value["sha256"], summary.sha256);
    assert_eq!(summary.sha256, sha256_hex(&fs::read(&path).expect("read dump")));
}

/// inspect fails on a dump that violates the schema.
#[test]
fn inspect_rejects_malformed_dump() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("bad.lsdump");
    fs::write(&path, r#"{ "record_types": [ { "name": "Foo" } ] }"#).expect("write");

    assert_cmd::cargo::cargo_bin_cmd!("abi-diff")
        .arg("inspect")
        .arg("--dump")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load dump"));
}

/// format-dump rewrites a hand-written dump into canonical form.
#[test]
fn format_dump_writes_canonical_form() {
    let dir = tempdir().expect("tempdir");
    let input = dir.path().join("hand.lsdump");
    fs::write(
        &input,
        r#"{
  "elf_functions": [ { "name": "_Z1bv" }, { "name": "_Z1av", "binding": "global" } ],
  "builtin_types": [ { "linker_set_key": "int", "name": "int", "size": 4, "alignment": 4 } ]
}"#,
    )
    .expect("write input");
    let output = dir.path().join("canonical.lsdump");

    assert_cmd::cargo::cargo_bin_cmd!("abi-diff")
        .arg("format-dump")
        .arg("--dump")
        .arg(&input)
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Formatted dump:"))
        .stdout(predicate::str::contains("Entities: 3"));

    let written = fs::read(&output).expect("read output");
    let module = dump::load(&written).expect("reload");
    assert_eq!(written, dump::save(&module).expect("save"));

    let text = String::from_utf8(written).expect("utf8");
    let first = text.find("_Z1av").expect("_Z1av present");
    let second = text.find("_Z1bv").expect("_Z1bv present");
    assert!(first < second, "ELF functions should be sorted by name");
    assert!(!text.contains("\"binding\""));
}
