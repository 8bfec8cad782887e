use std::{ffi::OsString, process::ExitStatus};

use anyhow::{Context, Result};
use tokio::process::{Child, Command};
use tracing::{info, warn};

use crate::{config::GuardConfig, core::guard::SessionGuard};

/// Exit code reported when the child was stopped by a termination signal.
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

/// How long a signalled child gets to exit before it is killed.
#[cfg(unix)]
const STOP_GRACE: std::time::Duration = std::time::Duration::from_secs(5);

/// Claim the session, run `command` until it exits or we are told to stop,
/// then release the session.
///
/// Returns the exit code to report: the child's own code, `128 + signal` if
/// the child died from a signal, or [`INTERRUPTED_EXIT_CODE`] when shutdown
/// was requested.
///
/// # Errors
/// Returns an error if signal handlers cannot be installed, the session
/// cannot be claimed, or the child cannot be spawned or waited on. The
/// session is released in the last two cases.
pub fn run_supervised(cfg: &GuardConfig, command: &[OsString]) -> Result<i32> {
    let (program, args) = command.split_first().context("no command given")?;

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    rt.block_on(async {
        // Handlers must be in place before the pidfile exists, otherwise a
        // signal's default action would leave it behind.
        let mut signals = ShutdownSignals::install()?;

        let mut guard = SessionGuard::acquire(&cfg.session_dir, &cfg.session_name)
            .with_context(|| format!("failed to claim session '{}'", cfg.session_name))?;
        let outcome = supervise(program, args, &mut signals).await;

        guard.release();
        outcome
    })
}

async fn supervise(
    program: &OsString,
    args: &[OsString],
    signals: &mut ShutdownSignals,
) -> Result<i32> {
    // A signal delivered while claiming the session is already queued.
    tokio::select! {
        biased;
        () = signals.recv() => {
            warn!("termination requested before start");
            return Ok(INTERRUPTED_EXIT_CODE);
        }
        () = std::future::ready(()) => {}
    }

    let mut child = Command::new(program)
        .args(args)
        .kill_on_drop(true)
        .spawn()
        .with_context(|| format!("failed to spawn {}", program.to_string_lossy()))?;
    info!(pid = ?child.id(), "started {}", program.to_string_lossy());

    let finished = tokio::select! {
        status = child.wait() => Some(status.context("failed to wait for child")?),
        () = signals.recv() => None,
    };

    if let Some(status) = finished {
        let code = exit_code(status);
        info!(code, "child exited");
        return Ok(code);
    }

    warn!("termination requested, stopping child");
    stop_child(&mut child).await?;
    Ok(INTERRUPTED_EXIT_CODE)
}

/// Ask the child to terminate, killing it if it outlives the grace period.
async fn stop_child(child: &mut Child) -> Result<()> {
    #[cfg(unix)]
    if let Some(pid) = child.id().and_then(|id| i32::try_from(id).ok()) {
        use nix::{
            sys::signal::{self, Signal},
            unistd::Pid,
        };

        if let Err(e) = signal::kill(Pid::from_raw(pid), Signal::SIGTERM) {
            warn!("failed to send SIGTERM to {pid}: {e}");
        } else if let Ok(status) = tokio::time::timeout(STOP_GRACE, child.wait()).await {
            status.context("failed to wait for child")?;
            return Ok(());
        }
    }

    child.kill().await.context("failed to kill child")
}

/// SIGTERM and SIGINT on unix, ctrl-c on windows. Registered on creation, so
/// signals arriving before the first `recv` are not lost.
struct ShutdownSignals {
    #[cfg(unix)]
    term: tokio::signal::unix::Signal,
    #[cfg(unix)]
    int: tokio::signal::unix::Signal,
    #[cfg(windows)]
    ctrl_c: tokio::signal::windows::CtrlC,
}

impl ShutdownSignals {
    fn install() -> Result<Self> {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};

            Ok(Self {
                term: signal(SignalKind::terminate()).context("cannot listen for SIGTERM")?,
                int: signal(SignalKind::interrupt()).context("cannot listen for SIGINT")?,
            })
        }

        #[cfg(windows)]
        {
            Ok(Self {
                ctrl_c: tokio::signal::windows::ctrl_c().context("cannot listen for ctrl-c")?,
            })
        }
    }

    async fn recv(&mut self) {
        #[cfg(unix)]
        tokio::select! {
            _ = self.term.recv() => {}
            _ = self.int.recv() => {}
        }

        #[cfg(windows)]
        self.ctrl_c.recv().await;
    }
}

fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(sig) = status.signal() {
            return 128 + sig;
        }
    }

    1
}
