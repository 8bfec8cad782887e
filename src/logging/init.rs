use std::{path::Path, sync::Mutex};

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

// Global guard to keep the file appender alive
static FILE_APPENDER_GUARD: Mutex<Option<tracing_appender::non_blocking::WorkerGuard>> =
    Mutex::new(None);

/// Flush and close the log file appender.
/// Must be called before `std::process::exit`, which skips destructors.
pub fn flush_logs() {
    // Taking the guard will drop it, which flushes pending logs
    if let Ok(mut guard_holder) = FILE_APPENDER_GUARD.lock()
        && let Some(guard) = guard_holder.take()
    {
        drop(guard);
    }
}

/// `RUST_LOG` (if set) takes precedence. Otherwise -v/-vv map to "debug"/"trace".
fn filter_layer(verbosity: u8) -> Result<EnvFilter> {
    let base = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| base.to_string());
    EnvFilter::try_new(filter).context("invalid RUST_LOG / filter")
}

/// Initialize console tracing on stderr.
pub fn init_tracing(verbosity: u8) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*};

    let fmt_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    // Allow re-init to be a no-op in tests
    let _ = tracing_subscriber::registry()
        .with(filter_layer(verbosity)?)
        .with(fmt_layer)
        .try_init();

    Ok(())
}

/// Initialize tracing to stderr and to a daily log file
/// `<session_dir>/<session_name>.log`.
pub fn init_tracing_with_file(session_dir: &Path, session_name: &str, verbosity: u8) -> Result<()> {
    use tracing_appender::rolling;
    use tracing_subscriber::{fmt, prelude::*};

    let file_appender = rolling::daily(session_dir, format!("{session_name}.log"));
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // Store the guard globally to keep it alive for the program duration
    if let Ok(mut guard_holder) = FILE_APPENDER_GUARD.lock() {
        *guard_holder = Some(guard);
    }

    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_target(false)
        .with_writer(non_blocking);
    let console_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    let _ = tracing_subscriber::registry()
        .with(filter_layer(verbosity)?)
        .with(file_layer)
        .with(console_layer)
        .try_init();

    Ok(())
}
