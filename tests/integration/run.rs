//! Full runs of the default command.

use predicates::prelude::*;

use crate::common::{SAFE_NOTES, TestEnv, assert_log_format};

#[test]
fn test_up_to_date_run_is_quiet() {
    let mut env = TestEnv::new().with_gotify();
    let _release = env.release("v1.117.0", 30, SAFE_NOTES);
    let _running = env.running("v1.117.0");
    let notify = env.expect_no_notification();

    env.command().assert().success();

    notify.assert();
    assert!(env.docker.invocations().is_empty());
    assert!(!env.lock_path().exists(), "lock marker left behind");

    let log = env.log();
    assert_log_format(&log);
    assert!(log.contains("Immich 1.117.0 is up to date"), "log: {log}");
}

#[test]
fn test_update_pulls_restarts_and_notifies() {
    let mut env = TestEnv::new().with_gotify();
    let _release = env.release("v1.117.0", 30, SAFE_NOTES);
    // The first probe reports the old version, later ones the new one
    let _before = env.running("v1.116.2").expect(1);
    let _after = env.running("v1.117.0");
    let notify = env.expect_notification(5, "Immich updated");

    env.command().arg("run").assert().success();

    notify.assert();
    assert_eq!(
        env.docker.invocations(),
        vec![
            "compose pull",
            "compose up -d",
            "image prune -a -f --filter until=24h",
        ]
    );

    let log = env.log();
    assert_log_format(&log);
    assert!(log.contains("Updated Immich from 1.116.2 to 1.117.0"), "log: {log}");
    assert!(log.contains("ok: compose pull"), "compose output not logged: {log}");
}

#[test]
fn test_recent_release_is_skipped() {
    let mut env = TestEnv::new().with_gotify();
    let _release = env.release("v1.118.0", 2, SAFE_NOTES);
    let _running = env.running("v1.117.0");
    let notify = env.expect_no_notification();

    env.command().assert().success();

    notify.assert();
    assert!(env.docker.invocations().is_empty());
    assert!(env.log().contains("Skipped Immich 1.118.0: released 2 day(s) ago"));
}

#[test]
fn test_breaking_change_blocks_update() {
    let mut env = TestEnv::new().with_gotify();
    let _release = env.release("v2.0.0", 30, "## Breaking Changes\n\nThe database moved.");
    let _running = env.running("v1.117.0");
    let notify = env.expect_notification(8, "Immich update needs review");

    env.command()
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("needs manual review"))
        .stderr(predicate::str::contains("breaking change"));

    notify.assert();
    assert!(env.docker.invocations().is_empty());
    assert!(!env.lock_path().exists());
    assert!(env.log().contains(" - ERROR: "));
}

#[test]
fn test_release_api_down_fails_without_touching_docker() {
    let mut env = TestEnv::new().with_gotify();
    let _release = env
        .server
        .mock("GET", "/release")
        .with_status(503)
        .expect(2)
        .create();
    let notify = env.expect_notification(8, "Immich update failed");

    env.command()
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Release API unavailable after 2 attempt(s)"));

    notify.assert();
    assert!(env.docker.invocations().is_empty());
}

#[test]
fn test_unreachable_server_fails() {
    let mut env = TestEnv::new();
    let _release = env.release("v1.117.0", 30, SAFE_NOTES);
    let _running = env
        .server
        .mock("GET", "/api/server/about")
        .with_status(401)
        .create();

    env.command()
        .assert()
        .code(1)
        .stderr(predicate::str::contains("status endpoint unreachable"));
}

#[test]
fn test_pull_failure_is_reported() {
    let mut env = TestEnv::with_docker(Some("compose pull")).with_gotify();
    let _release = env.release("v1.117.0", 30, SAFE_NOTES);
    let _running = env.running("v1.116.2");
    let notify = env.expect_notification(8, "Immich update failed");

    env.command()
        .assert()
        .code(1)
        .stderr(predicate::str::contains("compose pull"));

    notify.assert();
    assert_eq!(env.docker.invocations(), vec!["compose pull"]);
    assert!(!env.lock_path().exists());
    assert!(env.log().contains("simulated failure"));
}

#[test]
fn test_slow_restart_still_succeeds() {
    let mut env = TestEnv::new()
        .with_gotify()
        .set("READY_TIMEOUT_SECS", "1")
        .set("READY_INTERVAL_SECS", "1")
        .set("PRUNE_IMAGES", "no");
    let _release = env.release("v1.117.0", 30, SAFE_NOTES);
    let _running = env.running("v1.116.2").expect(1);
    let _down = env
        .server
        .mock("GET", "/api/server/about")
        .with_status(502)
        .create();
    let notify = env.expect_notification(8, "Immich updated but not responding");

    env.command().assert().success();

    notify.assert();
    assert_eq!(env.docker.invocations(), vec!["compose pull", "compose up -d"]);
    assert!(env.log().contains(" - WARNING: "), "log: {}", env.log());
}

#[test]
fn test_notification_failure_does_not_change_exit_code() {
    let mut env = TestEnv::new().with_gotify();
    let _release = env.release("v1.117.0", 30, SAFE_NOTES);
    let _before = env.running("v1.116.2").expect(1);
    let _after = env.running("v1.117.0");
    let _gotify = env
        .server
        .mock("POST", "/message")
        .with_status(500)
        .create();

    env.command().assert().success();
    assert!(env.log().contains("Notification via gotify failed"));
}

#[test]
fn test_missing_settings_file() {
    let env = TestEnv::new();
    let mut cmd = env.command();
    cmd.env("IMMICH_AUTOUPDATE_CONFIG", env.temp.path().join("missing.conf"));

    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("Configuration file not found"))
        .stderr(predicate::str::contains("--config"));
    assert!(!env.lock_path().exists());
}

#[test]
fn test_invalid_email_address_is_logged() {
    let env = TestEnv::new()
        .set("NOTIFY_METHOD", "email")
        .set("EMAIL_TO", "root");

    env.command()
        .assert()
        .code(1)
        .stderr(predicate::str::contains("EMAIL_TO is not a valid address"));

    let log = env.log();
    assert_log_format(&log);
    assert!(log.contains(" - ERROR: "), "log: {log}");
    assert!(log.contains("EMAIL_TO"), "log: {log}");
    assert!(!env.lock_path().exists());
}

#[test]
fn test_invalid_settings_fail_before_any_request() {
    let mut env = TestEnv::new().with_gotify();
    env.settings = env.settings.clone().unset("GOTIFY_TOKEN");
    let release = env.server.mock("GET", "/release").expect(0).create();
    let status = env.server.mock("GET", "/api/server/about").expect(0).create();
    let notify = env.expect_no_notification();

    env.command()
        .assert()
        .code(1)
        .stderr(predicate::str::contains("GOTIFY_TOKEN"));

    release.assert();
    status.assert();
    notify.assert();
    assert!(env.docker.invocations().is_empty());
    assert!(env.log().contains(" - ERROR: "), "log: {}", env.log());
}
