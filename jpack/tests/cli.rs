//! End-to-end tests driving the `jpack` binary against real temp files.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

fn jpack() -> Command {
    Command::cargo_bin("jpack").unwrap()
}

#[test]
fn compresses_and_decompresses_abracadabra_via_the_bwt_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("abracadabra.txt");
    fs::write(&source, "abracadabra").unwrap();

    let compressed = dir.path().join("abracadabra.txt.pck");
    jpack()
        .arg("-c")
        .arg(&source)
        .current_dir(dir.path())
        .assert()
        .success();
    assert!(compressed.exists());

    let restored = dir.path().join("restored.txt");
    jpack()
        .arg("-d")
        .arg(&compressed)
        .arg(&restored)
        .assert()
        .success();

    assert_eq!(fs::read_to_string(&restored).unwrap(), "abracadabra");
}

#[test]
fn self_test_round_trips_through_the_documented_stem_layout() {
    let dir = tempfile::tempdir().unwrap();
    let stem = dir.path().join("sample");
    fs::write(dir.path().join("sample.txt"), "mississippi river").unwrap();

    jpack()
        .arg("-t")
        .arg(&stem)
        .assert()
        .success()
        .stdout(predicate::str::contains("self-test passed"));

    assert!(dir.path().join("sample.pck").exists());
    assert_eq!(
        fs::read_to_string(dir.path().join("sample-R.txt")).unwrap(),
        "mississippi river"
    );
}

#[test]
fn empty_file_round_trips_to_empty_output() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("empty.txt");
    fs::write(&source, "").unwrap();

    let compressed = dir.path().join("empty.pck");
    jpack()
        .arg("compress")
        .arg(&source)
        .arg(&compressed)
        .assert()
        .success();

    let restored = dir.path().join("empty-R.txt");
    jpack()
        .arg("decompress")
        .arg(&compressed)
        .arg(&restored)
        .assert()
        .success();

    assert_eq!(fs::read_to_string(&restored).unwrap(), "");
}

#[test]
fn vitter_codec_round_trips_via_the_codec_flag() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("vitter.txt");
    fs::write(&source, "abracadabra").unwrap();

    let compressed = dir.path().join("vitter.bin");
    jpack()
        .args(["compress", "--codec", "vitter"])
        .arg(&source)
        .arg(&compressed)
        .assert()
        .success();

    let restored = dir.path().join("vitter-R.txt");
    jpack()
        .args(["decompress", "--codec", "vitter"])
        .arg(&compressed)
        .arg(&restored)
        .assert()
        .success();

    assert_eq!(fs::read_to_string(&restored).unwrap(), "abracadabra");
}

#[test]
fn missing_input_file_is_a_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    jpack()
        .arg("-c")
        .arg(dir.path().join("does-not-exist.txt"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn stats_flag_prints_a_compression_report() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("stats.txt");
    fs::write(&source, "abracadabra abracadabra abracadabra").unwrap();

    jpack()
        .arg("-c")
        .arg("--stats")
        .arg(&source)
        .assert()
        .success()
        .stdout(predicate::str::contains("Compression Statistics"));
}
