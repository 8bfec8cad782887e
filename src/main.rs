use anyhow::Result;
use clap::Parser;
use session_guard::app::context::AppContext;
use session_guard::cli::{Cli, Commands};
use session_guard::commands::dispatch;
use session_guard::logging::init::{flush_logs, init_tracing, init_tracing_with_file};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let ctx = AppContext::from_cli(&cli)?;

    // Only `run` hosts a session; it also logs to a file in the session dir
    match &cli.command {
        Commands::Run { .. } => {
            init_tracing_with_file(&ctx.cfg.session_dir, &ctx.cfg.session_name, ctx.verbosity)?;
        }
        _ => {
            init_tracing(ctx.verbosity)?;
        }
    }

    let result = dispatch(&cli, &ctx);
    flush_logs();
    result
}
