use std::fs;
use std::io::ErrorKind;
use std::os::unix::net::UnixStream as StdUnixStream;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, NaiveTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::unix::OwnedWriteHalf;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{broadcast, mpsc, oneshot, RwLock};
use tokio::time::Instant;

use coursevault_core::{settings, SyncReport};
use coursevault_sync::{load_last_report, run_configured};

use crate::error::{io_err, DaemonError};
use crate::paths::{logs_dir, socket_path, DAEMON_NAME};
use crate::protocol::{Command, DaemonRequest, DaemonResponse};
use crate::schedule::{next_run_after, until};

/// Longest single timer sleep. The wall clock is re-checked after each one,
/// so a suspended machine or an edited `sync_time` is noticed quickly.
const TIMER_TICK: Duration = Duration::from_secs(60);
const LOG_ROTATION_INTERVAL: Duration = Duration::from_secs(5);

/// Runs one full sync for the settings under `home`. Called off the runtime
/// via `spawn_blocking`.
pub type SyncRunner = Arc<dyn Fn(&Path) -> Result<SyncReport, DaemonError> + Send + Sync>;

struct SyncJob {
    source: &'static str,
    respond_to: oneshot::Sender<Result<SyncSummary, String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncSummary {
    pub source: String,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u128,
    pub written: usize,
    pub skipped_conflicts: usize,
    pub courses_synced: Vec<String>,
    pub errors: Vec<String>,
}

impl SyncSummary {
    fn from_report(source: &str, report: &SyncReport, duration: Duration) -> Self {
        Self {
            source: source.to_string(),
            started_at: report.started_at.unwrap_or_else(Utc::now),
            duration_ms: duration.as_millis(),
            written: report.written,
            skipped_conflicts: report.skipped_conflicts,
            courses_synced: report.courses_synced.clone(),
            errors: report.errors.clone(),
        }
    }
}

#[derive(Debug, Default)]
struct DaemonState {
    next_run_at: Option<DateTime<Local>>,
    last_sync: Option<SyncSummary>,
    last_error: Option<String>,
}

type SharedState = Arc<RwLock<DaemonState>>;

/// Start the daemon and block the current thread until it exits.
pub fn start_blocking(home: &Path, json_logs: bool) -> Result<(), DaemonError> {
    init_tracing(json_logs);
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;
    runtime.block_on(run(home.to_path_buf()))
}

fn run_configured_sync(home: &Path) -> Result<SyncReport, DaemonError> {
    Ok(run_configured(home)?)
}

/// Run the daemon against Canvas with the settings under `home`.
pub async fn run(home: PathBuf) -> Result<(), DaemonError> {
    run_with(home, Arc::new(run_configured_sync)).await
}

/// Run the daemon with a custom sync runner.
pub async fn run_with(home: PathBuf, runner: SyncRunner) -> Result<(), DaemonError> {
    ensure_runtime_dirs(&home)?;

    let state: SharedState = Arc::new(RwLock::new(DaemonState::default()));
    let started_at = Utc::now();

    let (sync_tx, sync_rx) = mpsc::channel::<SyncJob>(64);
    let (shutdown_tx, _) = broadcast::channel::<()>(16);

    let timer_handle = {
        let shutdown = shutdown_tx.clone();
        let home = home.clone();
        let sync_tx = sync_tx.clone();
        let state = state.clone();
        tokio::spawn(async move {
            let result = timer_task(home, sync_tx, state, shutdown.subscribe()).await;
            let _ = shutdown.send(());
            result
        })
    };

    let processor_handle = {
        let shutdown = shutdown_tx.clone();
        let home = home.clone();
        let state = state.clone();
        tokio::spawn(async move {
            let result =
                sync_processor_task(home, runner, state, sync_rx, shutdown.subscribe()).await;
            let _ = shutdown.send(());
            result
        })
    };

    let socket_handle = {
        let shutdown = shutdown_tx.clone();
        let home = home.clone();
        let state = state.clone();
        let sync_tx = sync_tx.clone();
        tokio::spawn(async move {
            let result = socket_server_task(
                home,
                state,
                sync_tx,
                shutdown.clone(),
                shutdown.subscribe(),
                started_at,
            )
            .await;
            let _ = shutdown.send(());
            result
        })
    };
    drop(sync_tx);

    let rotation_handle = {
        let shutdown = shutdown_tx.clone();
        let home = home.clone();
        tokio::spawn(async move {
            let result = log_rotation_task(home, shutdown.subscribe()).await;
            let _ = shutdown.send(());
            result
        })
    };

    let signal_handle = {
        let shutdown = shutdown_tx.clone();
        tokio::spawn(async move {
            let mut shutdown_rx = shutdown.subscribe();
            tokio::select! {
                _ = shutdown_rx.recv() => Ok(()),
                signal = termination_signal() => match signal {
                    Ok(name) => {
                        tracing::info!(signal = name, "shutting down daemon");
                        let _ = shutdown.send(());
                        Ok(())
                    }
                    Err(err) => Err(io_err("signal handler", err)),
                }
            }
        })
    };

    tracing::info!(home = %home.display(), "daemon started");
    let (timer_result, processor_result, socket_result, rotation_result, signal_result) = tokio::join!(
        timer_handle,
        processor_handle,
        socket_handle,
        rotation_handle,
        signal_handle
    );

    handle_join("timer", timer_result)?;
    handle_join("sync_processor", processor_result)?;
    handle_join("socket_server", socket_result)?;
    handle_join("log_rotation", rotation_result)?;
    handle_join("signal_handler", signal_result)?;
    tracing::info!("daemon stopped");
    Ok(())
}

/// The configured daily sync time, or the default when settings are unreadable.
fn scheduled_time(home: &Path) -> NaiveTime {
    match settings::load_at(home).and_then(|s| s.sync_time()) {
        Ok(at) => at,
        Err(err) => {
            tracing::warn!(error = %err, "cannot read sync_time; using default");
            settings::parse_sync_time(settings::DEFAULT_SYNC_TIME).unwrap_or_default()
        }
    }
}

async fn timer_task(
    home: PathBuf,
    sync_tx: mpsc::Sender<SyncJob>,
    state: SharedState,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DaemonError> {
    loop {
        let now = Local::now();
        let next = next_run_after(&now, scheduled_time(&home));
        {
            let mut guard = state.write().await;
            if guard.next_run_at != Some(next) {
                tracing::info!(next_run_at = %next.to_rfc3339(), "next scheduled sync");
                guard.next_run_at = Some(next);
            }
        }

        tokio::select! {
            _ = shutdown_rx.recv() => break,
            _ = tokio::time::sleep(until(&now, &next).min(TIMER_TICK)) => {
                if Local::now() < next {
                    continue;
                }
                match enqueue_sync(&sync_tx, "timer").await {
                    Ok(summary) => tracing::info!(
                        written = summary.written,
                        skipped_conflicts = summary.skipped_conflicts,
                        errors = summary.errors.len(),
                        duration_ms = summary.duration_ms,
                        "scheduled sync completed",
                    ),
                    Err(DaemonError::QueueClosed(what)) => {
                        tracing::warn!(channel = what, "sync queue closed; timer exiting");
                        break;
                    }
                    Err(err) => tracing::error!(error = %err, "scheduled sync failed"),
                }
            }
        }
    }
    Ok(())
}

async fn sync_processor_task(
    home: PathBuf,
    runner: SyncRunner,
    state: SharedState,
    mut sync_rx: mpsc::Receiver<SyncJob>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DaemonError> {
    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            maybe_job = sync_rx.recv() => {
                let Some(job) = maybe_job else { break };
                let started = Instant::now();
                tracing::info!(source = job.source, "sync starting");

                let runner = runner.clone();
                let home_for_sync = home.clone();
                let result = tokio::task::spawn_blocking(move || runner(&home_for_sync))
                    .await
                    .map_err(|err| DaemonError::Protocol(format!("sync task join error: {err}")))?;

                let outcome = match result {
                    Ok(report) => {
                        let summary = SyncSummary::from_report(job.source, &report, started.elapsed());
                        let mut guard = state.write().await;
                        guard.last_sync = Some(summary.clone());
                        guard.last_error = None;
                        Ok(summary)
                    }
                    Err(err) => {
                        let message = err.to_string();
                        tracing::error!(source = job.source, error = %message, "sync failed");
                        state.write().await.last_error = Some(message.clone());
                        Err(message)
                    }
                };

                let _ = job.respond_to.send(outcome);
            }
        }
    }
    Ok(())
}

async fn socket_server_task(
    home: PathBuf,
    state: SharedState,
    sync_tx: mpsc::Sender<SyncJob>,
    shutdown_tx: broadcast::Sender<()>,
    mut shutdown_rx: broadcast::Receiver<()>,
    started_at: DateTime<Utc>,
) -> Result<(), DaemonError> {
    let socket = socket_path(&home);
    prepare_socket_for_bind(&socket)?;

    let listener = UnixListener::bind(&socket).map_err(|e| io_err(&socket, e))?;
    set_socket_permissions(&socket)?;

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            accepted = listener.accept() => {
                let (stream, _) = accepted.map_err(|e| io_err(&socket, e))?;
                let home = home.clone();
                let state = state.clone();
                let sync_tx = sync_tx.clone();
                let shutdown_tx = shutdown_tx.clone();
                tokio::spawn(async move {
                    if let Err(err) = handle_socket_client(
                        stream,
                        home,
                        state,
                        sync_tx,
                        shutdown_tx,
                        started_at,
                    ).await {
                        tracing::error!(error = %err, "socket client error");
                    }
                });
            }
        }
    }

    if socket.exists() {
        let _ = fs::remove_file(&socket);
    }
    Ok(())
}

async fn handle_socket_client(
    stream: UnixStream,
    home: PathBuf,
    state: SharedState,
    sync_tx: mpsc::Sender<SyncJob>,
    shutdown_tx: broadcast::Sender<()>,
    started_at: DateTime<Utc>,
) -> Result<(), DaemonError> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|e| io_err("daemon socket read", e))?
    {
        if line.trim().is_empty() {
            continue;
        }

        let request: DaemonRequest = match serde_json::from_str(&line) {
            Ok(request) => request,
            Err(err) => {
                write_response(
                    &mut writer,
                    &DaemonResponse::error(format!("invalid request: {err}")),
                )
                .await?;
                continue;
            }
        };

        let response = match request.cmd {
            Command::Status => {
                DaemonResponse::ok(build_status_payload(&home, &state, started_at).await)
            }
            Command::Sync => match enqueue_sync(&sync_tx, "socket").await {
                Ok(summary) => DaemonResponse::ok(json!(summary)),
                Err(err) => DaemonResponse::error(err.to_string()),
            },
            Command::Stop => {
                tracing::info!("stop requested over socket");
                let _ = shutdown_tx.send(());
                DaemonResponse::ok(json!({ "stopping": true }))
            }
        };

        write_response(&mut writer, &response).await?;
        if request.cmd == Command::Stop {
            break;
        }
    }

    Ok(())
}

async fn build_status_payload(home: &Path, state: &SharedState, started_at: DateTime<Utc>) -> Value {
    let (next_run_at, last_sync, last_error) = {
        let guard = state.read().await;
        (
            guard.next_run_at.map(|t| t.to_rfc3339()),
            guard.last_sync.clone(),
            guard.last_error.clone(),
        )
    };

    let vault = settings::load_at(home)
        .ok()
        .map(|s| s.vault_path_or_default(home));
    let last_report = vault
        .as_deref()
        .and_then(|vault| match load_last_report(vault) {
            Ok(report) => report,
            Err(err) => {
                tracing::warn!(error = %err, "cannot read last report");
                None
            }
        });

    json!({
        "running": true,
        "name": DAEMON_NAME,
        "pid": std::process::id(),
        "started_at": started_at.to_rfc3339(),
        "next_run_at": next_run_at,
        "last_sync": last_sync,
        "last_error": last_error,
        "last_report": last_report,
        "vault": vault.map(|v| v.display().to_string()),
        "socket": socket_path(home).display().to_string(),
    })
}

async fn enqueue_sync(
    sync_tx: &mpsc::Sender<SyncJob>,
    source: &'static str,
) -> Result<SyncSummary, DaemonError> {
    let (tx, rx) = oneshot::channel();
    sync_tx
        .send(SyncJob {
            source,
            respond_to: tx,
        })
        .await
        .map_err(|_| DaemonError::QueueClosed("sync queue"))?;

    let outcome = rx
        .await
        .map_err(|_| DaemonError::QueueClosed("sync response"))?;
    outcome.map_err(DaemonError::Protocol)
}

async fn log_rotation_task(
    home: PathBuf,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DaemonError> {
    let mut interval = tokio::time::interval(LOG_ROTATION_INTERVAL);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    interval.tick().await;

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            _ = interval.tick() => {
                let home = home.clone();
                tokio::task::spawn_blocking(move || {
                    crate::log_rotation::rotate_daemon_logs(&home);
                })
                .await
                .ok();
            }
        }
    }
    Ok(())
}

fn prepare_socket_for_bind(socket: &Path) -> Result<(), DaemonError> {
    if !socket.exists() {
        return Ok(());
    }

    match StdUnixStream::connect(socket) {
        Ok(_) => {
            return Err(DaemonError::Protocol(format!(
                "daemon already running on {}",
                socket.display()
            )));
        }
        Err(err) => {
            tracing::warn!(
                socket = %socket.display(),
                error = %err,
                "removing stale daemon socket before bind",
            );
        }
    }

    match fs::remove_file(socket) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(io_err(socket, err)),
    }
}

fn ensure_runtime_dirs(home: &Path) -> Result<(), DaemonError> {
    let logs = logs_dir(home);
    fs::create_dir_all(&logs).map_err(|e| io_err(&logs, e))
}

async fn write_response(
    writer: &mut OwnedWriteHalf,
    response: &DaemonResponse,
) -> Result<(), DaemonError> {
    let mut payload = serde_json::to_string(response)?;
    payload.push('\n');
    writer
        .write_all(payload.as_bytes())
        .await
        .map_err(|e| io_err("daemon socket write", e))?;
    writer
        .flush()
        .await
        .map_err(|e| io_err("daemon socket flush", e))
}

/// Resolves on ctrl-c, or SIGTERM where available, with the signal's name.
#[cfg(unix)]
async fn termination_signal() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut term = signal(SignalKind::terminate())?;
    tokio::select! {
        res = tokio::signal::ctrl_c() => res.map(|()| "SIGINT"),
        _ = term.recv() => Ok("SIGTERM"),
    }
}

#[cfg(not(unix))]
async fn termination_signal() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await.map(|()| "ctrl-c")
}

fn handle_join(
    task: &str,
    result: Result<Result<(), DaemonError>, tokio::task::JoinError>,
) -> Result<(), DaemonError> {
    match result {
        Ok(inner) => inner,
        Err(err) if err.is_panic() => Err(DaemonError::Protocol(format!("{task} task panicked"))),
        Err(err) => Err(DaemonError::Protocol(format!("{task} task was cancelled: {err}"))),
    }
}

fn init_tracing(json_logs: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = if json_logs {
        fmt().json().with_env_filter(filter).try_init()
    } else {
        fmt().with_env_filter(filter).with_target(false).try_init()
    };
}

#[cfg(unix)]
fn set_socket_permissions(path: &Path) -> Result<(), DaemonError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600)).map_err(|e| io_err(path, e))
}

#[cfg(not(unix))]
fn set_socket_permissions(_path: &Path) -> Result<(), DaemonError> {
    Ok(())
}
