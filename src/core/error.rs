use std::{io, path::PathBuf};

use thiserror::Error;

use super::guard::GuardState;

/// Failures surfaced by the pidfile store and the session guard.
///
/// A missing pidfile is not represented here: the store reports it as
/// `Ok(None)` because it is the normal first-run state.
#[derive(Debug, Error)]
pub enum PidfileError {
    /// The pidfile exists but holds fewer bytes than one full record.
    #[error("cannot read {}: expected {expected} bytes, found {len}", .path.display())]
    CorruptRecord {
        path: PathBuf,
        len: usize,
        expected: usize,
    },

    /// Open, read, write or unlink failed.
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A live process owns the session.
    #[error("already an instance{} running on pid {pid}", image_suffix(.image.as_ref()))]
    AlreadyRunning { pid: u32, image: Option<PathBuf> },

    /// A guard operation was called out of order.
    #[error("cannot {op} a session guard in state {state:?}")]
    InvalidState { op: &'static str, state: GuardState },
}

impl PidfileError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// The competing pid, if this error reports one.
    #[must_use]
    pub const fn competing_pid(&self) -> Option<u32> {
        match self {
            Self::AlreadyRunning { pid, .. } => Some(*pid),
            _ => None,
        }
    }
}

fn image_suffix(image: Option<&PathBuf>) -> String {
    image.map_or_else(String::new, |image| format!(" {}", image.display()))
}
