//! `coursevault daemon`: background scheduler lifecycle.

use std::collections::VecDeque;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread::sleep;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};

use coursevault_daemon::paths::{logs_dir, socket_path, stderr_log_path, stdout_log_path};
use coursevault_daemon::protocol::Command as DaemonCmd;
use coursevault_daemon::{
    request_status, request_stop, request_sync, send_request, start_blocking, DaemonError,
    DaemonRequest,
};

use super::home;

const STARTUP_CHECKS: usize = 10;

#[derive(Subcommand, Debug)]
pub enum DaemonCommand {
    /// Start the daemon in the background, logging under ~/.coursevault/logs.
    Start,
    /// Run the daemon in the foreground.
    Run(RunArgs),
    /// Ask a running daemon to shut down.
    Stop,
    /// Query the running daemon.
    Status,
    /// Ask the running daemon to sync now and wait for the result.
    Sync,
    /// Print recent daemon log lines.
    Logs(DaemonLogsArgs),
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Log as JSON lines instead of plain text.
    #[arg(long)]
    pub json_logs: bool,
}

#[derive(Args, Debug)]
pub struct DaemonLogsArgs {
    /// Number of trailing lines to show.
    #[arg(long, default_value_t = 100)]
    pub lines: usize,

    /// Show only the stderr log file.
    #[arg(long)]
    pub stderr_only: bool,
}

pub fn run(command: DaemonCommand) -> Result<()> {
    let home = home()?;

    match command {
        DaemonCommand::Start => start_background(&home)?,
        DaemonCommand::Run(args) => {
            start_blocking(&home, args.json_logs).context("daemon exited with error")?;
        }
        DaemonCommand::Stop => match request_stop(&home) {
            Ok(()) => println!("daemon stop requested"),
            Err(DaemonError::DaemonNotRunning { .. }) => println!("daemon is not running"),
            Err(err) => return Err(err).context("failed to stop daemon"),
        },
        DaemonCommand::Status => {
            let payload = match request_status(&home) {
                Ok(status) => status,
                Err(DaemonError::DaemonNotRunning { .. }) => serde_json::json!({
                    "running": false,
                    "socket": socket_path(&home).display().to_string(),
                }),
                Err(err) => return Err(err).context("failed to query daemon status"),
            };
            println!(
                "{}",
                serde_json::to_string_pretty(&payload)
                    .context("failed to render daemon status JSON")?
            );
        }
        DaemonCommand::Sync => {
            let summary = request_sync(&home).context("daemon sync failed")?;
            println!(
                "{}",
                serde_json::to_string_pretty(&summary).context("failed to render sync summary")?
            );
        }
        DaemonCommand::Logs(args) => {
            if !args.stderr_only {
                print_tail(&stdout_log_path(&home), args.lines)
                    .context("failed to read daemon stdout log")?;
            }
            print_tail(&stderr_log_path(&home), args.lines)
                .context("failed to read daemon stderr log")?;
        }
    }

    Ok(())
}

fn is_running(home: &Path) -> Result<bool> {
    match send_request(home, &DaemonRequest::from(DaemonCmd::Status)) {
        Ok(_) => Ok(true),
        Err(DaemonError::DaemonNotRunning { .. }) => Ok(false),
        Err(err) => Err(err).context("failed to query daemon status"),
    }
}

fn open_log(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("cannot open {}", path.display()))
}

/// Re-exec this binary as `daemon run`, detached, with output appended to
/// the log files, then wait for its socket to answer.
fn start_background(home: &Path) -> Result<()> {
    if is_running(home)? {
        println!("daemon is already running");
        return Ok(());
    }

    let logs = logs_dir(home);
    fs::create_dir_all(&logs).with_context(|| format!("cannot create {}", logs.display()))?;
    let exe = std::env::current_exe().context("cannot locate the coursevault binary")?;
    let mut child = Command::new(exe)
        .args(["daemon", "run"])
        .stdin(Stdio::null())
        .stdout(open_log(&stdout_log_path(home))?)
        .stderr(open_log(&stderr_log_path(home))?)
        .spawn()
        .context("failed to spawn daemon")?;

    for _ in 0..STARTUP_CHECKS {
        if let Some(status) = child.try_wait().context("failed to poll daemon")? {
            bail!(
                "daemon exited during startup ({status}); see {}",
                stderr_log_path(home).display()
            );
        }
        if is_running(home)? {
            println!("daemon started (pid {})", child.id());
            return Ok(());
        }
        sleep(Duration::from_millis(200));
    }
    bail!(
        "daemon did not answer on {}; see {}",
        socket_path(home).display(),
        stderr_log_path(home).display()
    )
}

fn print_tail(path: &Path, lines: usize) -> Result<()> {
    if !path.exists() {
        println!("log file not found: {}", path.display());
        return Ok(());
    }

    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut tail = VecDeque::<String>::with_capacity(lines);
    for line in BufReader::new(file).lines() {
        let line = line.with_context(|| format!("read {}", path.display()))?;
        if tail.len() == lines {
            tail.pop_front();
        }
        tail.push_back(line);
    }

    println!("==> {} <==", path.display());
    for line in tail {
        println!("{line}");
    }
    Ok(())
}
