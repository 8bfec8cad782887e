use std::ffi::OsString;

use anyhow::Result;

use super::Command;
use crate::{app::context::AppContext, core::runtime::supervise, logging::init::flush_logs};

pub struct RunCommand<'a> {
    pub command: &'a [OsString],
}

impl Command for RunCommand<'_> {
    fn run(&self, ctx: &AppContext) -> Result<()> {
        let code = supervise::run_supervised(&ctx.cfg, self.command)?;
        if code != 0 {
            flush_logs();
            std::process::exit(code);
        }
        Ok(())
    }
}
