//! `validate` checks the settings file without network access.

use predicates::prelude::*;

use crate::common::TestEnv;

#[test]
fn test_valid_settings() {
    let env = TestEnv::new().set("IMMICH_API_KEY", "abcdefghijklmnop");

    env.command()
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("Valid settings file"))
        .stdout(predicate::str::contains("abcd****"))
        .stdout(predicate::str::contains("abcdefghijklmnop").not());
}

#[test]
fn test_validate_json() {
    let env = TestEnv::new().with_gotify();

    let output = env
        .command()
        .args(["validate", "--format", "json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let report: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(report["valid"], true);
    assert_eq!(report["settings"]["notify_method"], "gotify");
    assert_eq!(report["settings"]["gotify_token"], "goti****");
    assert_eq!(report["warnings"].as_array().unwrap().len(), 0);
}

#[test]
fn test_missing_file() {
    let env = TestEnv::new();

    env.command()
        .args(["validate", "--config"])
        .arg(env.temp.path().join("nope.conf"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Configuration file not found"));
}

#[test]
fn test_missing_keys_are_listed() {
    let mut env = TestEnv::new();
    env.settings = env
        .settings
        .clone()
        .unset("IMMICH_HOST")
        .set("NOTIFY_METHOD", "gotify");

    env.command()
        .arg("validate")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("IMMICH_HOST"))
        .stderr(predicate::str::contains("GOTIFY_URL"))
        .stderr(predicate::str::contains("GOTIFY_TOKEN"));
}

#[test]
fn test_unknown_notify_method() {
    let env = TestEnv::new().set("NOTIFY_METHOD", "pigeon");

    env.command()
        .arg("validate")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("NOTIFY_METHOD must be one of"));
}

#[test]
fn test_invalid_email_address() {
    let env = TestEnv::new()
        .set("NOTIFY_METHOD", "email")
        .set("EMAIL_TO", "not an address");

    env.command()
        .arg("validate")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("EMAIL_TO"));
}

#[test]
fn test_strict_mode_fails_on_warnings() {
    let env = TestEnv::new().set("IMMICH_DIR", "/definitely/not/here");

    env.command()
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("Warning: IMMICH_DIR"));

    env.command()
        .args(["validate", "--strict"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("strict mode"));
}
