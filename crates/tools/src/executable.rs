use crate::error::{ErrorKind, Result};
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

/// Represents how an external tool is launched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Executable {
    /// A directly executable binary.
    Binary { path: PathBuf },
    /// A program that runs the tool on our behalf (`flatpak run <app>`,
    /// `docker run <image>`, a shell). Tool arguments are appended after
    /// `args`.
    Launcher { program: PathBuf, args: Vec<OsString> },
}
impl Executable {
    pub fn binary(path: impl Into<PathBuf>) -> Self {
        Self::Binary { path: path.into() }
    }

    pub fn launcher(program: impl Into<PathBuf>, args: impl IntoIterator<Item = impl Into<OsString>>) -> Self {
        Self::Launcher { program: program.into(), args: args.into_iter().map(Into::into).collect() }
    }

    /// Searches `PATH` for `name`, then checks each fallback location in order.
    pub fn discover(name: &str, fallbacks: &[&str]) -> Result<Self> {
        if let Ok(path) = which::which(name) {
            return Ok(Self::Binary { path });
        }
        tracing::info!(name, "Executable not found in PATH");
        for fallback in fallbacks.iter().map(Path::new) {
            if fallback.is_file() {
                tracing::debug!(name, path = %fallback.display(), "Using fallback install location");
                return Ok(Self::binary(fallback));
            }
        }
        exn::bail!(ErrorKind::NotFound(name.to_string()));
    }

    /// Uses the configured program if there is one (bare names are looked up
    /// in `PATH`, anything with a separator is checked as a path), otherwise
    /// falls back to [`discover`](Self::discover).
    pub fn resolve(configured: Option<&Path>, name: &str, fallbacks: &[&str]) -> Result<Self> {
        match configured {
            Some(program) => match which::which(program) {
                Ok(path) => Ok(Self::Binary { path }),
                Err(_) => exn::bail!(ErrorKind::NotFound(program.display().to_string())),
            },
            None => Self::discover(name, fallbacks),
        }
    }

    /// A command for this executable with stdin closed. The child is killed
    /// if its handle is dropped before it has been waited on.
    pub(crate) fn command(&self) -> Command {
        let mut command = match self {
            Self::Binary { path } => Command::new(path),
            Self::Launcher { program, args } => {
                let mut command = Command::new(program);
                command.args(args);
                command
            },
        };
        command.stdin(Stdio::null()).kill_on_drop(true);
        command
    }
}
impl fmt::Display for Executable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Binary { path } => write!(f, "{}", path.display()),
            Self::Launcher { program, .. } => write!(f, "{} (launcher)", program.display()),
        }
    }
}
