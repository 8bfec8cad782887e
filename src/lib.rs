//! Single-instance guard for named sessions.
//!
//! Before a session starts, [`core::SessionGuard`] checks
//! `<session_dir>/<session_name>.pid` for a live owner and, if there is none,
//! records the current process id there until the session is released.

pub mod app;
pub mod cli;
pub mod commands;
pub mod config;
pub mod core;
pub mod logging;
