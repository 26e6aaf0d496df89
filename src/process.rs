//! Child process execution.
//!
//! Every invocation moves through `Unstarted -> Running -> {Succeeded, Failed}`:
//! [`run_async`] forks and execs, [`await_process`] blocks until the child
//! reaches a terminal state and [`run_sync`] composes the two.
use std::fmt;

use nix::{
    errno::Errno,
    sys::wait::{WaitStatus, waitpid},
    unistd::{ForkResult, Pid, execvp, fork},
};
use tracing::{debug, error, info};

use crate::{command::Command, error::ProcessError};

/// `tracing` target of the per-invocation `proc:` preview lines. The binary
/// keeps it enabled at INFO whatever the configured level is.
pub const PREVIEW_TARGET: &str = "mbuild::proc";

/// Identifier of an in-flight child process.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ProcessHandle(Option<Pid>);

impl ProcessHandle {
    /// The sentinel that never refers to a real process.
    pub const fn invalid() -> Self {
        Self(None)
    }

    /// Returns `false` for the invalid sentinel.
    pub fn is_valid(&self) -> bool {
        self.0.is_some()
    }

    /// Raw platform pid, if the handle is valid.
    pub fn pid(&self) -> Option<i32> {
        self.0.map(Pid::as_raw)
    }
}

impl fmt::Debug for ProcessHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(pid) => write!(f, "ProcessHandle({pid})"),
            None => f.write_str("ProcessHandle(invalid)"),
        }
    }
}

/// Launches `command` without waiting for it.
///
/// Logs a one-line preview of the command, forks and replaces the child's
/// image with the command. The parent gets the child's handle back
/// immediately.
pub fn run_async(command: &Command) -> Result<ProcessHandle, ProcessError> {
    if command.is_empty() {
        error!("{}.", ProcessError::EmptyCommand);
        return Err(ProcessError::EmptyCommand);
    }

    // Everything the child needs is prepared before forking.
    let argv = command.to_argv()?;

    info!(target: PREVIEW_TARGET, "proc: {}.", command.preview());

    match unsafe { fork() } {
        Ok(ForkResult::Parent { child }) => {
            debug!("spawned pid {child} for `{}`", command.preview());
            Ok(ProcessHandle(Some(child)))
        }
        Ok(ForkResult::Child) => {
            let errno = match execvp(&argv[0], &argv) {
                Ok(never) => match never {},
                Err(errno) => errno,
            };
            exit_child(errno)
        }
        Err(errno) => {
            let err = ProcessError::Fork(errno);
            error!("{err}.");
            Err(err)
        }
    }
}

/// Reports a failed `exec` from inside the forked child and terminates it.
///
/// Only async-signal-safe calls are made here.
fn exit_child(errno: Errno) -> ! {
    let parts: [&[u8]; 3] = [
        b"error: could not execute child process: ",
        errno.desc().as_bytes(),
        b".\n",
    ];
    unsafe {
        for part in parts {
            libc::write(libc::STDERR_FILENO, part.as_ptr().cast(), part.len());
        }
        libc::_exit(1)
    }
}

/// Blocks until the child behind `handle` exits or is killed by a signal.
///
/// Stop and continue notifications are not terminal and are waited past.
pub fn await_process(handle: ProcessHandle) -> Result<(), ProcessError> {
    let Some(pid) = handle.0 else {
        return Err(ProcessError::InvalidHandle);
    };

    loop {
        match waitpid(pid, None) {
            Ok(WaitStatus::Exited(_, 0)) => return Ok(()),
            Ok(WaitStatus::Exited(_, code)) => {
                let err = ProcessError::ExitCode(code);
                error!("{err}.");
                return Err(err);
            }
            Ok(WaitStatus::Signaled(_, signal, _)) => {
                let err = ProcessError::Signaled(signal.as_str().to_string());
                error!("{err}.");
                return Err(err);
            }
            Ok(status) => {
                debug!("pid {pid} reported non-terminal status {status:?}");
            }
            Err(Errno::EINTR) => continue,
            Err(source) => {
                let err = ProcessError::Await {
                    pid: pid.as_raw(),
                    source,
                };
                error!("{err}.");
                return Err(err);
            }
        }
    }
}

/// Runs `command` and waits for it to finish.
pub fn run_sync(command: &Command) -> Result<(), ProcessError> {
    let handle = run_async(command)?;
    await_process(handle)
}

/// Synchronous command execution seam.
///
/// Targets and the rebuild bootstrapper go through a runner so tests can
/// observe the commands they issue without forking.
pub trait Runner {
    /// Runs `command` to completion.
    fn run_sync(&self, command: &Command) -> Result<(), ProcessError>;
}

/// Default runner backed by `fork`/`execvp`/`waitpid`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ForkRunner;

impl Runner for ForkRunner {
    fn run_sync(&self, command: &Command) -> Result<(), ProcessError> {
        run_sync(command)
    }
}
