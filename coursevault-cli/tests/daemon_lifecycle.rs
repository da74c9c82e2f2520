use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread::sleep;
use std::time::{Duration, Instant};

use tempfile::TempDir;

use coursevault_core::{settings, Settings};

fn coursevault_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_coursevault"))
}

fn command(home: &Path) -> Command {
    let mut cmd = Command::new(coursevault_bin());
    cmd.env("HOME", home)
        .env("USERPROFILE", home)
        .env("COURSEVAULT_TOKEN", "test-token");
    cmd
}

/// Foreground daemon, stopped over the socket (or killed) on drop.
struct DaemonProcess {
    child: Child,
    home: PathBuf,
}

impl DaemonProcess {
    fn start(home: &Path) -> Self {
        let child = command(home)
            .args(["daemon", "run"])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .expect("spawn daemon");
        Self {
            child,
            home: home.to_path_buf(),
        }
    }

    fn wait_exit(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if self.child.try_wait().expect("poll daemon").is_some() {
                return true;
            }
            sleep(Duration::from_millis(50));
        }
        false
    }
}

impl Drop for DaemonProcess {
    fn drop(&mut self) {
        let _ = command(&self.home).args(["daemon", "stop"]).output();
        if !self.wait_exit(Duration::from_secs(2)) {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

fn daemon_json(home: &Path, sub: &str) -> serde_json::Value {
    let output = command(home)
        .args(["daemon", sub])
        .output()
        .expect("run daemon subcommand");
    assert!(
        output.status.success(),
        "daemon {sub} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("daemon json")
}

fn wait_until_running(home: &Path) -> serde_json::Value {
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        let status = daemon_json(home, "status");
        if status["running"] == true && !status["next_run_at"].is_null() {
            return status;
        }
        assert!(Instant::now() < deadline, "daemon never came up");
        sleep(Duration::from_millis(100));
    }
}

#[test]
fn daemon_answers_status_sync_and_stop() {
    let home = TempDir::new().expect("home");
    let mut config = Settings::default();
    config.vault_path = Some(home.path().join("Vault"));
    config.set("sync_time", "03:00").expect("sync_time");
    settings::save_at(home.path(), &config).expect("save settings");

    let mut daemon = DaemonProcess::start(home.path());

    let status = wait_until_running(home.path());
    assert!(status["pid"].as_u64().is_some());
    assert!(status["last_sync"].is_null());
    let next_run = status["next_run_at"].as_str().expect("next run scheduled");
    assert!(next_run.contains("T03:00:00"), "unexpected next run {next_run}");

    // Nothing selected, so the queued run finishes without touching Canvas.
    let summary = daemon_json(home.path(), "sync");
    assert_eq!(summary["source"], "socket");
    assert_eq!(summary["written"], 0);

    let status = daemon_json(home.path(), "status");
    assert_eq!(status["last_sync"]["source"], "socket");

    let stop = command(home.path())
        .args(["daemon", "stop"])
        .output()
        .expect("stop");
    assert!(stop.status.success());
    assert!(
        daemon.wait_exit(Duration::from_secs(5)),
        "daemon should exit after stop"
    );
    assert!(!home.path().join(".coursevault/daemon.sock").exists());
}
