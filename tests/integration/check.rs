//! `check` reports the decision and changes nothing.

use predicates::prelude::*;

use crate::common::{SAFE_NOTES, TestEnv};

#[test]
fn test_check_reports_update() {
    let mut env = TestEnv::new().with_gotify();
    let _release = env.release("v1.117.0", 30, SAFE_NOTES);
    let _running = env.running("v1.116.2");
    let notify = env.expect_no_notification();

    env.command()
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("Running version: 1.116.2"))
        .stdout(predicate::str::contains("Latest release:  1.117.0"))
        .stdout(predicate::str::contains("update"));

    notify.assert();
    assert!(env.docker.invocations().is_empty());
    assert!(!env.lock_path().exists());
    assert!(!env.log_path().exists(), "check must not write the run log");
}

#[test]
fn test_check_json() {
    let mut env = TestEnv::new();
    let _release = env.release("v1.117.0", 3, SAFE_NOTES);
    let _running = env.running("v1.116.2");

    let output = env
        .command()
        .args(["check", "--format", "json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let report: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(report["action"], "skip");
    assert_eq!(report["days_since_release"], 3);
    assert_eq!(report["tag"], "v1.117.0");
}

#[test]
fn test_check_blocked_exits_nonzero() {
    let mut env = TestEnv::new().with_gotify();
    let _release = env.release("v1.117.0", 30, "**Caution**: back up your database first");
    let _running = env.running("v1.116.2");
    let notify = env.expect_no_notification();

    env.command()
        .arg("check")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("release notes mention 'caution'"));

    notify.assert();
}
