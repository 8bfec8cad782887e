use std::fmt;

use tracing::{error, info, warn};

/// How serious a reported event is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        })
    }
}

/// Receives guard failures before they are returned to the caller.
pub trait Reporter {
    fn report(&self, severity: Severity, message: &str);
}

/// Forwards reports to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Info => info!("{message}"),
            Severity::Warning => warn!("{message}"),
            Severity::Error => error!("{message}"),
        }
    }
}

impl<F> Reporter for F
where
    F: Fn(Severity, &str),
{
    fn report(&self, severity: Severity, message: &str) {
        self(severity, message);
    }
}


#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn closures_are_reporters() {
        let seen = Cell::new(None);
        let reporter = |severity: Severity, _: &str| seen.set(Some(severity));
        reporter.report(Severity::Warning, "disk almost full");
        assert_eq!(seen.get(), Some(Severity::Warning));
    }

    #[test]
    fn severity_displays_lowercase() {
        assert_eq!(Severity::Error.to_string(), "error");
    }
}
