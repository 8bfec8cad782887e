use std::{ffi::OsString, path::PathBuf};

use clap::{ArgAction, Parser, Subcommand};

/// session-guard command-line interface
#[derive(Parser, Debug, Clone)]
#[command(name = "session-guard", version, about = "Run a command as the only live instance of a named session", long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv). `RUST_LOG` overrides this.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Directory holding session pidfiles (env: `SESSION_GUARD_DIR`)
    #[arg(long, value_name = "DIR", global = true)]
    pub session_dir: Option<PathBuf>,

    /// Session name; the pidfile is <DIR>/<NAME>.pid (env: `SESSION_GUARD_NAME`)
    #[arg(short, long = "session", value_name = "NAME", global = true)]
    pub session: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Claim the session and run a command until it exits
    Run {
        /// Program and arguments to run
        #[arg(
            value_name = "COMMAND",
            required = true,
            trailing_var_arg = true,
            allow_hyphen_values = true
        )]
        command: Vec<OsString>,
    },

    /// Exit 0 if a live instance owns the session, non-zero otherwise
    Status,

    /// Remove a stale or corrupt pidfile
    Clear,
}
