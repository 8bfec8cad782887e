use std::{
    env, fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};

/// Environment variable overriding the session directory.
pub const SESSION_DIR_ENV: &str = "SESSION_GUARD_DIR";
/// Environment variable overriding the session name.
pub const SESSION_NAME_ENV: &str = "SESSION_GUARD_NAME";
/// Session name used when none is given.
pub const DEFAULT_SESSION_NAME: &str = "session-guard";

/// Where a session's pidfile lives and what it is called.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardConfig {
    /// Directory holding `<session_name>.pid`.
    pub session_dir: PathBuf,
    /// Name of the session; one pidfile per name.
    pub session_name: String,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            session_dir: default_session_dir(),
            session_name: DEFAULT_SESSION_NAME.to_string(),
        }
    }
}

impl GuardConfig {
    /// Resolve configuration with precedence: flag → environment → default.
    /// The session directory is created if it does not exist.
    ///
    /// # Errors
    /// Returns an error if the session name is invalid or the session
    /// directory cannot be created.
    pub fn load(session_dir: Option<&Path>, session_name: Option<&str>) -> Result<Self> {
        let mut out = Self::default();

        if let Some(dir) = session_dir {
            out.session_dir = dir.to_path_buf();
        } else if let Some(dir) = env::var_os(SESSION_DIR_ENV)
            && !dir.is_empty()
        {
            out.session_dir = PathBuf::from(dir);
        }

        if let Some(name) = session_name {
            out.session_name = name.to_string();
        } else if let Ok(name) = env::var(SESSION_NAME_ENV)
            && !name.is_empty()
        {
            out.session_name = name;
        }

        validate_session_name(&out.session_name)?;

        fs::create_dir_all(&out.session_dir).with_context(|| {
            format!(
                "failed to create session dir at {}",
                out.session_dir.display()
            )
        })?;

        Ok(out)
    }
}

fn default_session_dir() -> PathBuf {
    env::var_os("XDG_RUNTIME_DIR")
        .filter(|d| !d.is_empty())
        .map_or_else(env::temp_dir, PathBuf::from)
}

/// The name becomes a file name, so it must be a single path component.
fn validate_session_name(name: &str) -> Result<()> {
    if name.is_empty() {
        bail!("session name must not be empty");
    }
    if name == "." || name == ".." || name.contains(['/', '\\']) || name.contains('\0') {
        bail!("invalid session name '{name}': must be a plain file name");
    }
    Ok(())
}
