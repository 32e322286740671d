//! Overlapping runs are refused; stale markers are cleaned up.

use predicates::prelude::*;
use std::fs;

use crate::common::{SAFE_NOTES, TestEnv, write_lock};

#[test]
fn test_live_lock_refuses_to_run() {
    let mut env = TestEnv::new().with_gotify();
    // The test process is alive and is not the binary under test
    write_lock(&env.lock_path(), std::process::id());
    let release = env.server.mock("GET", "/release").expect(0).create();
    let notify = env.expect_no_notification();

    env.command()
        .assert()
        .code(1)
        .stderr(predicate::str::contains("already in progress"));

    release.assert();
    notify.assert();
    assert!(env.log().contains(" - ERROR: "), "log: {}", env.log());
    assert_eq!(
        fs::read_to_string(env.lock_path()).unwrap().trim(),
        std::process::id().to_string(),
        "another run's marker must not be removed"
    );
}

#[cfg(unix)]
#[test]
fn test_stale_lock_is_replaced() {
    let mut env = TestEnv::new();
    // Beyond any pid_max, so never alive
    write_lock(&env.lock_path(), i32::MAX as u32);
    let _release = env.release("v1.117.0", 30, SAFE_NOTES);
    let _running = env.running("v1.117.0");

    env.command().assert().success();

    assert!(!env.lock_path().exists());
    assert!(env.log().contains("stale"), "log: {}", env.log());
}

#[test]
fn test_no_lock_flag_ignores_marker() {
    let mut env = TestEnv::new();
    write_lock(&env.lock_path(), std::process::id());
    let _release = env.release("v1.117.0", 30, SAFE_NOTES);
    let _running = env.running("v1.117.0");

    env.command().arg("--no-lock").assert().success();

    assert!(env.lock_path().exists(), "--no-lock must leave the marker alone");
}
