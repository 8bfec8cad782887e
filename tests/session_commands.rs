use assert_cmd::Command;
use predicates::prelude::predicate;
use session_guard::config::{SESSION_DIR_ENV, SESSION_NAME_ENV};
use session_guard::core::{PidRecord, pid_file, store};
use tempfile::tempdir;

fn guard_cmd(dir: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("session-guard").unwrap();
    cmd.env_remove(SESSION_DIR_ENV)
        .env_remove(SESSION_NAME_ENV)
        .env_remove("RUST_LOG")
        .arg("--session-dir")
        .arg(dir)
        .args(["--session", "job"]);
    cmd
}

#[test]
fn status_without_pidfile_is_stopped() {
    let td = tempdir().unwrap();
    guard_cmd(td.path())
        .arg("status")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("stopped"));
}

#[test]
fn status_reports_stale_record() {
    let td = tempdir().unwrap();
    store::write(&pid_file(td.path(), "job"), PidRecord::new(u32::MAX - 1)).unwrap();

    guard_cmd(td.path())
        .arg("status")
        .assert()
        .code(1)
        .stdout(predicate::str::contains(format!("stale (pid={})", u32::MAX - 1)));
}

#[test]
fn status_reports_corrupt_record() {
    let td = tempdir().unwrap();
    std::fs::write(pid_file(td.path(), "job"), [9u8]).unwrap();

    guard_cmd(td.path())
        .arg("status")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("corrupt"));
}

#[test]
fn session_dir_can_come_from_env() {
    let td = tempdir().unwrap();
    let mut cmd = Command::cargo_bin("session-guard").unwrap();
    cmd.env(SESSION_DIR_ENV, td.path())
        .env(SESSION_NAME_ENV, "from-env")
        .arg("clear")
        .assert()
        .success()
        .stdout(predicate::str::contains("nothing to clear"));
}

#[test]
fn clear_removes_stale_record() {
    let td = tempdir().unwrap();
    let path = pid_file(td.path(), "job");
    store::write(&path, PidRecord::new(u32::MAX - 1)).unwrap();

    guard_cmd(td.path())
        .arg("clear")
        .assert()
        .success()
        .stdout(predicate::str::contains("removed"));
    assert!(!path.exists());
}

// The checks below rely on unix liveness, where any live pid counts.
// On windows the recorded image must match the session-guard binary.

#[cfg(unix)]
#[test]
fn status_reports_live_owner() {
    let td = tempdir().unwrap();
    let me = std::process::id();
    store::write(&pid_file(td.path(), "job"), PidRecord::new(me)).unwrap();

    guard_cmd(td.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("running (pid={me})")));
}

#[cfg(unix)]
#[test]
fn clear_refuses_live_owner() {
    let td = tempdir().unwrap();
    let path = pid_file(td.path(), "job");
    store::write(&path, PidRecord::new(std::process::id())).unwrap();

    guard_cmd(td.path())
        .arg("clear")
        .assert()
        .failure()
        .stderr(predicate::str::contains("refusing to clear"));
    assert!(path.exists());
}

#[cfg(unix)]
#[test]
fn run_propagates_exit_code_and_releases() {
    let td = tempdir().unwrap();
    let path = pid_file(td.path(), "job");
    let script = format!("test -f '{}' && exit 3", path.display());

    guard_cmd(td.path())
        .args(["run", "--", "sh", "-c"])
        .arg(script)
        .assert()
        .code(3);
    assert!(!path.exists());
}

#[cfg(unix)]
#[test]
fn run_succeeds_and_writes_log() {
    let td = tempdir().unwrap();

    guard_cmd(td.path())
        .args(["run", "--", "true"])
        .assert()
        .success()
        .stderr(predicate::str::contains("session claimed"));

    let logs = std::fs::read_dir(td.path())
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.file_name().to_string_lossy().starts_with("job.log"))
        .count();
    assert_eq!(logs, 1);
    assert!(!pid_file(td.path(), "job").exists());
}

#[cfg(unix)]
#[test]
fn run_refuses_while_owner_is_alive() {
    let td = tempdir().unwrap();
    let path = pid_file(td.path(), "job");
    let me = std::process::id();
    store::write(&path, PidRecord::new(me)).unwrap();

    guard_cmd(td.path())
        .args(["run", "--", "true"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(format!("running on pid {me}")));
    assert_eq!(store::read(&path).unwrap(), Some(PidRecord::new(me)));
}

#[cfg(unix)]
#[test]
fn sigterm_right_after_claim_releases_session() {
    use assert_cmd::cargo::CommandCargoExt;
    use nix::{
        sys::signal::{Signal, kill},
        unistd::Pid,
    };
    use std::time::{Duration, Instant};

    let td = tempdir().unwrap();
    let path = pid_file(td.path(), "job");

    // Signal as early as possible, several times, to hit the startup window
    for _ in 0..5 {
        let mut child = std::process::Command::cargo_bin("session-guard")
            .unwrap()
            .env_remove(SESSION_DIR_ENV)
            .env_remove(SESSION_NAME_ENV)
            .arg("--session-dir")
            .arg(td.path())
            .args(["--session", "job", "run", "--", "sleep", "30"])
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .spawn()
            .unwrap();

        let deadline = Instant::now() + Duration::from_secs(10);
        while !path.exists() {
            assert!(Instant::now() < deadline, "pidfile never appeared");
            std::thread::sleep(Duration::from_millis(1));
        }

        let pid = Pid::from_raw(i32::try_from(child.id()).unwrap());
        kill(pid, Signal::SIGTERM).unwrap();

        let status = child.wait().unwrap();
        assert_eq!(status.code(), Some(130));
        assert!(!path.exists(), "pidfile left behind after SIGTERM");
    }
}
