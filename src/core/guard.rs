//! Single-instance ownership of a named session.
//!
//! A [`SessionGuard`] checks the session's pidfile for a live owner, claims
//! the session for the current process and records that claim on disk until
//! it is released.
//!
//! The read, probe and write steps are not atomic. Two instances started
//! within the same narrow window can both find the session free and both
//! claim it.

use std::path::{Path, PathBuf};

use tracing::info;

use super::{
    error::PidfileError,
    probe::{LivenessProbe, SystemProbe},
    report::{Reporter, Severity, TracingReporter},
    store::{self, PidRecord},
};

/// Path of the pidfile for `session_name` inside `session_dir`.
#[must_use]
pub fn pid_file(session_dir: &Path, session_name: &str) -> PathBuf {
    session_dir.join(format!("{session_name}.pid"))
}

/// Lifecycle of a [`SessionGuard`]. States are only ever visited in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum GuardState {
    Uninitialized,
    Checked,
    Claimed,
    Persisted,
    Released,
}

/// What a pidfile currently says about its session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// No pidfile.
    Vacant,
    /// Recorded pid is not a running instance.
    Stale(u32),
    /// Recorded pid is a running instance.
    Running(u32),
    /// Pidfile shorter than one record.
    Corrupt,
}

/// Read-only look at the pidfile at `path`.
///
/// # Errors
/// Returns [`PidfileError::Io`] if the pidfile exists but cannot be read.
pub fn inspect(path: &Path, probe: &impl LivenessProbe) -> Result<SessionStatus, PidfileError> {
    match store::read(path) {
        Ok(None) => Ok(SessionStatus::Vacant),
        Ok(Some(PidRecord { pid })) if pid != 0 && probe.is_alive(pid) => {
            Ok(SessionStatus::Running(pid))
        }
        Ok(Some(PidRecord { pid })) => Ok(SessionStatus::Stale(pid)),
        Err(PidfileError::CorruptRecord { .. }) => Ok(SessionStatus::Corrupt),
        Err(e) => Err(e),
    }
}

/// Exclusive claim on a session, backed by `<session_dir>/<session_name>.pid`.
pub struct SessionGuard<P: LivenessProbe = SystemProbe, R: Reporter = TracingReporter> {
    path: PathBuf,
    record: PidRecord,
    state: GuardState,
    probe: P,
    reporter: R,
}

impl SessionGuard {
    /// Guard using the platform probe and `tracing` for reports.
    #[must_use]
    pub fn new(session_dir: &Path, session_name: &str) -> Self {
        Self::with_parts(session_dir, session_name, SystemProbe, TracingReporter)
    }

    /// Check, claim and persist in one step.
    ///
    /// # Errors
    /// Any error from [`SessionGuard::init`] or [`SessionGuard::persist`].
    pub fn acquire(session_dir: &Path, session_name: &str) -> Result<Self, PidfileError> {
        let mut guard = Self::new(session_dir, session_name);
        guard.init()?;
        guard.persist()?;
        Ok(guard)
    }
}

impl<P: LivenessProbe, R: Reporter> SessionGuard<P, R> {
    pub fn with_parts(session_dir: &Path, session_name: &str, probe: P, reporter: R) -> Self {
        Self {
            path: pid_file(session_dir, session_name),
            record: PidRecord::default(),
            state: GuardState::Uninitialized,
            probe,
            reporter,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub const fn state(&self) -> GuardState {
        self.state
    }

    /// The pid this guard claimed, once claimed.
    #[must_use]
    pub fn pid(&self) -> Option<u32> {
        (self.state >= GuardState::Claimed).then_some(self.record.pid)
    }

    /// Make sure no live instance owns the session, then claim it for this
    /// process. Nothing is written yet; see [`SessionGuard::persist`].
    ///
    /// # Errors
    /// - [`PidfileError::AlreadyRunning`] if the recorded pid is alive; the
    ///   pidfile is left as it is.
    /// - [`PidfileError::CorruptRecord`] if the pidfile is truncated.
    /// - [`PidfileError::Io`] if the pidfile cannot be read.
    /// - [`PidfileError::InvalidState`] unless the guard is uninitialized.
    pub fn init(&mut self) -> Result<(), PidfileError> {
        self.expect_state("init", GuardState::Uninitialized)?;

        let existing = store::read(&self.path).map_err(|e| self.fail(e))?;
        if let Some(PidRecord { pid }) = existing
            && pid != 0
        {
            if self.probe.is_alive(pid) {
                let image = self.probe.image_path(pid);
                return Err(self.fail(PidfileError::AlreadyRunning { pid, image }));
            }
            info!(pid, path = %self.path.display(), "ignoring stale pidfile");
        }
        self.state = GuardState::Checked;

        self.record.pid = std::process::id();
        self.state = GuardState::Claimed;
        Ok(())
    }

    /// Write the claimed pid to the pidfile.
    ///
    /// # Errors
    /// - [`PidfileError::Io`] if the pidfile cannot be written. Not retried.
    /// - [`PidfileError::InvalidState`] unless the guard has been claimed.
    pub fn persist(&mut self) -> Result<(), PidfileError> {
        self.expect_state("persist", GuardState::Claimed)?;

        store::write(&self.path, self.record).map_err(|e| self.fail(e))?;
        self.state = GuardState::Persisted;
        info!(pid = self.record.pid, path = %self.path.display(), "session claimed");
        Ok(())
    }

    /// Give up the session. Removes the pidfile if this guard wrote it.
    ///
    /// Safe to call any number of times and from any state.
    pub fn release(&mut self) {
        if self.state == GuardState::Persisted {
            match store::remove(&self.path) {
                Ok(()) => info!(path = %self.path.display(), "session released"),
                Err(e) => self.reporter.report(Severity::Warning, &e.to_string()),
            }
        }
        self.state = GuardState::Released;
    }

    fn expect_state(&self, op: &'static str, expected: GuardState) -> Result<(), PidfileError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(self.fail(PidfileError::InvalidState {
                op,
                state: self.state,
            }))
        }
    }

    fn fail(&self, err: PidfileError) -> PidfileError {
        self.reporter.report(Severity::Error, &err.to_string());
        err
    }
}

impl<P: LivenessProbe, R: Reporter> Drop for SessionGuard<P, R> {
    fn drop(&mut self) {
        self.release();
    }
}
