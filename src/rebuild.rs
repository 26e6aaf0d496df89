//! Self-rebuild bootstrapper.
//!
//! When the recorded source is newer than the running binary, the binary is
//! moved aside to `<binary>.old`, recompiled in place and re-launched with the
//! original arguments. The steps form a small state machine:
//!
//! ```text
//! Check -> Backup -> Recompile -> Relaunch -> Done
//!                        |
//!                        +-> Restore -> (error)
//! ```
use std::{
    ffi::OsString,
    fs, io,
    path::{Path, PathBuf},
};

use tracing::{debug, error, info, warn};

use crate::{
    command::Command,
    error::{ProcessError, RebuildError},
    process::Runner,
};

/// Placeholder replaced by the binary path in the compile command.
pub const BINARY_PLACEHOLDER: &str = "{binary}";

/// Placeholder replaced by the source path in the compile command.
pub const SOURCE_PLACEHOLDER: &str = "{source}";

/// Result of a bootstrap pass that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildOutcome {
    /// The binary is current; normal execution continues.
    UpToDate,
    /// A rebuilt binary ran in a child process. The caller must exit with the
    /// child's result instead of continuing.
    Relaunched {
        /// Whether the re-launched binary succeeded.
        success: bool,
    },
}

impl RebuildOutcome {
    /// Exit code the bootstrapping process should terminate with, if any.
    pub fn exit_code(&self) -> Option<u8> {
        match self {
            Self::UpToDate => None,
            Self::Relaunched { success: true } => Some(0),
            Self::Relaunched { success: false } => Some(1),
        }
    }
}

/// How the binary compares to its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Staleness {
    /// Binary is at least as new as the source.
    Fresh,
    /// Source is strictly newer than the binary.
    Stale,
    /// The binary does not exist.
    Missing,
}

enum State {
    Check,
    Backup,
    Recompile { backup: Option<PathBuf> },
    Restore { backup: PathBuf, cause: ProcessError },
    Relaunch,
    Done(RebuildOutcome),
}

/// Compares modification times of `binary` and `source`.
pub fn staleness(binary: &Path, source: &Path) -> Result<Staleness, RebuildError> {
    let binary_time = match fs::metadata(binary).and_then(|meta| meta.modified()) {
        Ok(time) => time,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Staleness::Missing),
        Err(source) => {
            return Err(RebuildError::Stat {
                path: binary.to_path_buf(),
                source,
            });
        }
    };

    let source_time = fs::metadata(source)
        .and_then(|meta| meta.modified())
        .map_err(|err| RebuildError::Stat {
            path: source.to_path_buf(),
            source: err,
        })?;

    if source_time > binary_time {
        Ok(Staleness::Stale)
    } else {
        Ok(Staleness::Fresh)
    }
}

/// Returns `true` if `binary` is missing or older than `source`.
pub fn needs_rebuild(binary: &Path, source: &Path) -> Result<bool, RebuildError> {
    Ok(staleness(binary, source)? != Staleness::Fresh)
}

/// Renames `from` to `to`.
pub fn move_path(from: &Path, to: &Path) -> Result<(), RebuildError> {
    info!("moving {} -> {}.", from.display(), to.display());
    fs::rename(from, to).map_err(|source| RebuildError::Move {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    })
}

/// `<binary>.old`.
pub fn backup_path(binary: &Path) -> PathBuf {
    let mut backup = OsString::from(binary.as_os_str());
    backup.push(".old");
    PathBuf::from(backup)
}

/// Drives one self-rebuild check.
pub struct Bootstrapper<'a> {
    binary: PathBuf,
    source: PathBuf,
    compile: Vec<String>,
    args: Vec<String>,
    runner: &'a dyn Runner,
}

impl<'a> Bootstrapper<'a> {
    /// Creates a bootstrapper for `binary` built from `source`.
    ///
    /// `compile` is the compiler command template; `{binary}` and `{source}`
    /// tokens are substituted. `args` are the arguments (program name
    /// excluded) the rebuilt binary is re-launched with.
    pub fn new(
        binary: impl Into<PathBuf>,
        source: impl Into<PathBuf>,
        compile: Vec<String>,
        args: Vec<String>,
        runner: &'a dyn Runner,
    ) -> Self {
        Self {
            binary: binary.into(),
            source: source.into(),
            compile,
            args,
            runner,
        }
    }

    /// Compiler invocation with placeholders substituted.
    pub fn compile_command(&self) -> Result<Command, RebuildError> {
        if self.compile.is_empty() {
            return Err(RebuildError::EmptyCommand);
        }

        let binary = self.binary.to_string_lossy();
        let source = self.source.to_string_lossy();
        Ok(self
            .compile
            .iter()
            .map(|token| {
                token
                    .replace(BINARY_PLACEHOLDER, &binary)
                    .replace(SOURCE_PLACEHOLDER, &source)
            })
            .collect())
    }

    /// The rebuilt binary followed by the original arguments.
    pub fn relaunch_command(&self) -> Command {
        let mut command = Command::new();
        command
            .arg(self.binary.to_string_lossy())
            .args(self.args.iter().cloned());
        command
    }

    /// Runs the state machine to completion.
    pub fn run(&self) -> Result<RebuildOutcome, RebuildError> {
        let mut state = State::Check;
        loop {
            state = match state {
                State::Check => match staleness(&self.binary, &self.source)? {
                    Staleness::Fresh => {
                        debug!("{} is up to date", self.binary.display());
                        State::Done(RebuildOutcome::UpToDate)
                    }
                    Staleness::Stale => {
                        info!(
                            "{} is newer than {}, rebuilding.",
                            self.source.display(),
                            self.binary.display()
                        );
                        State::Backup
                    }
                    Staleness::Missing => {
                        info!("{} does not exist, rebuilding.", self.binary.display());
                        State::Recompile { backup: None }
                    }
                },
                State::Backup => {
                    let backup = backup_path(&self.binary);
                    move_path(&self.binary, &backup)?;
                    State::Recompile {
                        backup: Some(backup),
                    }
                }
                State::Recompile { backup } => {
                    let command = self.compile_command()?;
                    match (self.runner.run_sync(&command), backup) {
                        (Ok(()), _) => State::Relaunch,
                        (Err(cause), Some(backup)) => State::Restore { backup, cause },
                        (Err(cause), None) => {
                            return Err(RebuildError::CompileFailed {
                                binary: self.binary.clone(),
                                restored: false,
                                source: cause,
                            });
                        }
                    }
                }
                State::Restore { backup, cause } => {
                    let restored = match move_path(&backup, &self.binary) {
                        Ok(()) => true,
                        Err(err) => {
                            warn!("{err}.");
                            false
                        }
                    };
                    return Err(RebuildError::CompileFailed {
                        binary: self.binary.clone(),
                        restored,
                        source: cause,
                    });
                }
                State::Relaunch => {
                    let success = match self.runner.run_sync(&self.relaunch_command()) {
                        Ok(()) => true,
                        Err(err) => {
                            error!("rebuilt binary failed: {err}.");
                            false
                        }
                    };
                    State::Done(RebuildOutcome::Relaunched { success })
                }
                State::Done(outcome) => return Ok(outcome),
            };
        }
    }
}
