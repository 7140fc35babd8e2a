//! CLI tests for the winext command-line interface.

use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;

fn winext() -> Command {
    let mut cmd = Command::cargo_bin("winext").unwrap();
    cmd.env_remove("RUST_LOG").env_remove("WINEXT_NODE_ID");
    cmd
}

/// Test that the CLI binary exists and shows help.
#[test]
fn test_cli_help() {
    winext()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("decode"))
        .stdout(predicate::str::contains("encode"))
        .stdout(predicate::str::contains("models"))
        .stdout(predicate::str::contains("tags"));
}

/// Test that providing no subcommand shows an error.
#[test]
fn test_no_subcommand_shows_error() {
    winext().assert().failure().code(2);
}

#[test]
fn test_decode_temperature() {
    winext()
        .args(["decode", "001009c4"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"temperature\": 25.0"))
        .stdout(predicate::str::contains("\"errors\": []"));
}

#[test]
fn test_decode_partial_frame_succeeds() {
    winext()
        .args(["decode", "00 10 09 c4 fe"])
        .assert()
        .success()
        .stdout(predicate::str::contains("unknown tag 0xfe"));
}

#[test]
fn test_decode_short_frame_fails() {
    winext()
        .args(["decode", "00"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("frame too short"));
}

#[test]
fn test_decode_wrong_port_fails() {
    winext()
        .args(["decode", "001009c4", "--port", "1"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("unexpected application port 1"));
}

#[test]
fn test_decode_invalid_hex() {
    winext()
        .args(["decode", "zz"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid hex frame"));
}

#[test]
fn test_encode_single_write() {
    winext()
        .args(["encode", "setTemperature=25.5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"hex\": \"0606000409f6\""))
        .stdout(predicate::str::contains("\"kind\": \"single_write\""));
}

#[test]
fn test_encode_multi_write_with_node_id() {
    winext()
        .args([
            "encode",
            "setTemperature=25.5",
            "workMode=1",
            "fanSpeed=2",
            "--node-id",
            "2",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"hex\": \"0702100004000306"))
        .stdout(predicate::str::contains("\"kind\": \"multi_write\""));
}

#[test]
fn test_encode_no_consolidate() {
    winext()
        .args(["encode", "power=on", "lock=off", "--no-consolidate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"hex\": \"060610000001\""))
        .stdout(predicate::str::contains("multi-register writes disabled"));
}

#[test]
fn test_encode_unknown_only_fails() {
    winext()
        .args(["encode", "colour=red"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("no recognized control attributes"));
}

#[test]
fn test_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "node_id = 9").unwrap();

    winext()
        .arg("--config")
        .arg(file.path())
        .args(["encode", "workMode=1", "fanSpeed=1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"hex\": \"0709"));
}

#[test]
fn test_missing_config_file() {
    winext()
        .args(["--config", "/nonexistent/winext.toml", "models"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load config"));
}

#[test]
fn test_models_and_tags() {
    winext()
        .arg("models")
        .assert()
        .success()
        .stdout(predicate::str::contains("AN-303"));

    winext()
        .arg("tags")
        .assert()
        .success()
        .stdout(predicate::str::contains("temperature"))
        .stdout(predicate::str::contains("/100"));
}

#[test]
fn test_at_commands() {
    winext()
        .args(["at", "interval", "300"])
        .assert()
        .success()
        .stdout("AT+INTERVAL=300\n");

    winext()
        .args(["at", "deveui", "--query"])
        .assert()
        .success()
        .stdout("AT+DEVEUI?\n");

    winext()
        .args(["at", "re boot"])
        .assert()
        .failure();
}
