use anyhow::Result;

use crate::{cli::Cli, config::GuardConfig};

#[derive(Debug, Clone)]
pub struct AppContext {
    pub cfg: GuardConfig,
    pub verbosity: u8,
}

impl AppContext {
    pub const fn new(cfg: GuardConfig, verbosity: u8) -> Self {
        Self { cfg, verbosity }
    }

    /// Convenience constructor resolving config from CLI flags and environment.
    ///
    /// # Errors
    /// Returns an error if the session name is invalid or the session dir
    /// cannot be created.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let cfg = GuardConfig::load(cli.session_dir.as_deref(), cli.session.as_deref())?;
        Ok(Self::new(cfg, cli.verbose))
    }
}
