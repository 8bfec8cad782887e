use anyhow::{Result, bail};

use super::Command;
use crate::{
    app::context::AppContext,
    core::{SessionStatus, SystemProbe, inspect, pid_file, store},
};

pub struct ClearCommand;

impl Command for ClearCommand {
    fn run(&self, ctx: &AppContext) -> Result<()> {
        let path = pid_file(&ctx.cfg.session_dir, &ctx.cfg.session_name);
        match inspect(&path, &SystemProbe)? {
            SessionStatus::Running(pid) => {
                bail!(
                    "session '{}' is running (pid={pid}); refusing to clear",
                    ctx.cfg.session_name
                );
            }
            SessionStatus::Vacant => println!("nothing to clear"),
            SessionStatus::Stale(_) | SessionStatus::Corrupt => {
                store::remove(&path)?;
                println!("removed {}", path.display());
            }
        }
        Ok(())
    }
}
