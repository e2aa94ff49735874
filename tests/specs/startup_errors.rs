//! A malformed session payload and a missing-argument variant both exit
//! nonzero without ever reaching the main loop.

use assert_cmd::Command;

fn confab_syncd() -> Command {
    Command::cargo_bin("confab-syncd").expect("confab-syncd binary should build")
}

#[test]
fn missing_payload_argument_fails() {
    confab_syncd().assert().failure();
}

#[test]
fn malformed_payload_json_fails() {
    confab_syncd().arg("{not valid json").assert().failure();
}

#[test]
fn payload_missing_required_fields_fails() {
    confab_syncd()
        .arg(serde_json::json!({"external_id": "ext-1"}).to_string())
        .assert()
        .failure();
}
