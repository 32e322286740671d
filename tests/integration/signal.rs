//! An interrupted run removes its lock marker and exits non-zero.

use assert_cmd::cargo::cargo_bin;
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use std::net::TcpListener;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::common::{BIN, TestEnv};

fn wait_until(what: &str, timeout: Duration, mut done: impl FnMut() -> bool) {
    let deadline = Instant::now() + timeout;
    while !done() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        thread::sleep(Duration::from_millis(20));
    }
}

#[test]
fn test_sigterm_releases_lock() {
    // Accepts connections but never answers, so the run hangs on its first request
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.set_nonblocking(true).unwrap();
    let host = format!("http://{}", listener.local_addr().unwrap());

    let env = TestEnv::new()
        .set("IMMICH_HOST", &host)
        .set("RELEASE_URL", &format!("{host}/release"))
        .set("HTTP_TIMEOUT_SECS", "60");
    env.settings.write_to(&env.config_path()).unwrap();

    let mut child = Command::new(cargo_bin(BIN))
        .env("IMMICH_AUTOUPDATE_CONFIG", env.config_path())
        .env("IMMICH_AUTOUPDATE_LOG", env.log_path())
        .env("IMMICH_AUTOUPDATE_LOCK", env.lock_path())
        .env_remove("RUST_LOG")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();

    let mut connections = Vec::new();
    wait_until("the release request", Duration::from_secs(20), || {
        if let Ok((stream, _)) = listener.accept() {
            connections.push(stream);
        }
        !connections.is_empty()
    });
    assert!(env.lock_path().exists(), "lock marker missing during the run");

    // Signal handlers are installed in the same poll as the first request
    thread::sleep(Duration::from_millis(300));
    kill(Pid::from_raw(child.id() as i32), Signal::SIGTERM).unwrap();

    let mut status = None;
    wait_until("the process to exit", Duration::from_secs(20), || {
        status = child.try_wait().unwrap();
        status.is_some()
    });
    let status = status.unwrap();

    assert_eq!(status.code(), Some(1), "unexpected status: {status:?}");
    assert!(!env.lock_path().exists(), "lock marker left behind");
    assert!(env.log().contains("Interrupted by SIGTERM"), "log: {}", env.log());
}
