use anyhow::Result;

use super::Command;
use crate::{
    app::context::AppContext,
    core::{SessionStatus, SystemProbe, inspect, pid_file},
};

pub struct StatusCommand;

impl Command for StatusCommand {
    fn run(&self, ctx: &AppContext) -> Result<()> {
        let path = pid_file(&ctx.cfg.session_dir, &ctx.cfg.session_name);
        match inspect(&path, &SystemProbe)? {
            SessionStatus::Running(pid) => {
                println!("running (pid={pid})");
                std::process::exit(0);
            }
            SessionStatus::Stale(pid) => println!("stale (pid={pid})"),
            SessionStatus::Corrupt => println!("corrupt"),
            SessionStatus::Vacant => println!("stopped"),
        }
        std::process::exit(1);
    }
}
