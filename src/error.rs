//! Error handling for mbuild.
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while launching or awaiting a child process.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The command contained no tokens.
    #[error("could not run an empty command")]
    EmptyCommand,

    /// A token could not be passed to `exec` because it contains a NUL byte.
    #[error("command token {token:?} contains an interior NUL byte")]
    InvalidToken {
        /// The offending token.
        token: String,
    },

    /// `fork` failed.
    #[error("could not fork child process: {0}")]
    Fork(#[source] nix::errno::Errno),

    /// The handle passed to `await_process` was the invalid sentinel.
    #[error("could not await an invalid process handle")]
    InvalidHandle,

    /// `waitpid` failed.
    #[error("could not await command (pid {pid}): {source}")]
    Await {
        /// Pid of the awaited child.
        pid: i32,
        /// The underlying error that occurred.
        #[source]
        source: nix::errno::Errno,
    },

    /// The child exited normally with a non-zero code.
    #[error("command exited with code {0}")]
    ExitCode(i32),

    /// The child was terminated by a signal.
    #[error("command process was terminated by {0}")]
    Signaled(String),
}

/// Errors raised by the self-rebuild bootstrapper.
#[derive(Debug, Error)]
pub enum RebuildError {
    /// Stat of the binary or the source failed for a reason other than the
    /// binary being missing.
    #[error("could not stat {}: {source}", path.display())]
    Stat {
        /// Path that could not be inspected.
        path: PathBuf,
        /// The underlying error that occurred.
        #[source]
        source: std::io::Error,
    },

    /// Moving the binary to or from its backup failed.
    #[error("could not move {} to {}: {source}", from.display(), to.display())]
    Move {
        /// Original location.
        from: PathBuf,
        /// Requested location.
        to: PathBuf,
        /// The underlying error that occurred.
        #[source]
        source: std::io::Error,
    },

    /// The compile command template has no tokens.
    #[error("rebuild command is empty")]
    EmptyCommand,

    /// Recompilation failed. `restored` records whether the previous binary
    /// was moved back into place.
    #[error("could not rebuild {}: {source}", binary.display())]
    CompileFailed {
        /// Binary that was being rebuilt.
        binary: PathBuf,
        /// Whether the `.old` backup was restored.
        restored: bool,
        /// Why the compiler invocation failed.
        #[source]
        source: ProcessError,
    },
}

/// Errors raised while loading the project configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Error reading the configuration file.
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    /// Error parsing YAML configuration.
    #[error("Invalid YAML format: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// A `${VAR}` reference names an unset environment variable.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    /// The configuration parsed but describes an unusable project.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Errors raised while building a target registry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// Two targets were registered under the same name.
    #[error("target `{0}` is registered more than once")]
    DuplicateTarget(String),

    /// A target was registered with an empty name.
    #[error("target names cannot be empty")]
    EmptyName,
}

/// Errors raised while dispatching command-line selectors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    /// No target selector was supplied.
    #[error("no targets were provided")]
    NoTargets,

    /// A selector did not match any registered target.
    #[error("could not find a provided build target `{0}` in targets vector")]
    UnknownTarget(String),

    /// A selected target's invoker reported failure.
    #[error("build target `{0}` failed")]
    TargetFailed(String),
}
