//! `notify-test` surfaces delivery failures.

use mockito::Matcher;
use predicates::prelude::*;

use crate::common::TestEnv;

#[test]
fn test_sends_low_priority_message() {
    let mut env = TestEnv::new().with_gotify();
    let gotify = env.expect_notification(2, "immich-autoupdate test");

    env.command()
        .arg("notify-test")
        .assert()
        .success()
        .stdout(predicate::str::contains("Test notification sent via gotify"));

    gotify.assert();
}

#[test]
fn test_custom_message_and_priority() {
    let mut env = TestEnv::new().with_gotify();
    let gotify = env
        .server
        .mock("POST", "/message")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "message": "say \"cheese\"",
            "priority": 8,
        })))
        .with_status(200)
        .create();

    env.command()
        .args(["notify-test", "--priority", "high", "--message", "say \"cheese\""])
        .assert()
        .success();

    gotify.assert();
}

#[test]
fn test_delivery_failure_exits_nonzero() {
    let mut env = TestEnv::new().with_gotify();
    let _gotify = env
        .server
        .mock("POST", "/message")
        .with_status(401)
        .with_body(r#"{"error":"Unauthorized"}"#)
        .create();

    env.command()
        .arg("notify-test")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Notification via gotify failed"));
}

#[test]
fn test_disabled_notifications() {
    let env = TestEnv::new();

    env.command()
        .arg("notify-test")
        .assert()
        .success()
        .stdout(predicate::str::contains("nothing to send"));
}
