//! Turns command-line selectors into target invocations.
use std::io::Write;

use tracing::{error, info};

use crate::{
    buffer::GrowableBuffer,
    error::DispatchError,
    target::{Invoke, Target, TargetRegistry},
};

/// Version reported by `-v`/`--version`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Selector tokens from the command line, program options already removed.
#[derive(Debug, Clone, Copy, Default)]
pub struct Request<'a> {
    /// Tokens in the order they were supplied.
    pub tokens: &'a [String],
}

/// Resolved form of a [`Request`].
#[derive(Debug)]
pub enum Selection {
    /// Print the usage banner and stop.
    Help,
    /// Print the version and stop.
    Version,
    /// Run these targets in order. Repeats are kept.
    Run(GrowableBuffer<Target>),
}

/// Resolves the request against `registry`, one token at a time.
///
/// `-h`/`--help` and `-v`/`--version` end the walk as soon as they are seen,
/// so an unknown target placed before them is still an error.
pub fn select(
    registry: &TargetRegistry,
    request: &Request<'_>,
) -> Result<Selection, DispatchError> {
    if request.tokens.is_empty() {
        return Err(DispatchError::NoTargets);
    }

    let mut selected = GrowableBuffer::new();
    for token in request.tokens {
        match token.as_str() {
            "-h" | "--help" => return Ok(Selection::Help),
            "-v" | "--version" => return Ok(Selection::Version),
            name => {
                let target = registry
                    .find(name)
                    .ok_or_else(|| DispatchError::UnknownTarget(name.to_string()))?;
                selected.append(target.clone());
            }
        }
    }

    Ok(Selection::Run(selected))
}

/// Invokes `selected` in order and stops at the first failing target.
pub fn run_selected(selected: &[Target]) -> Result<(), DispatchError> {
    for target in selected {
        info!("running target `{}`", target.name());
        if !target.invoke() {
            return Err(DispatchError::TargetFailed(target.name().to_string()));
        }
    }

    Ok(())
}

/// Resolves and runs `request`, writing usage to `out` when it was asked for
/// and to `err` when the request was invalid.
///
/// Returns `Ok(())` when the process should exit successfully.
pub fn apply<O: Write, E: Write>(
    registry: &TargetRegistry,
    program: &str,
    request: &Request<'_>,
    out: &mut O,
    err: &mut E,
) -> Result<(), DispatchError> {
    let selection = match select(registry, request) {
        Ok(selection) => selection,
        Err(failure) => {
            error!("{failure}.");
            let _ = registry.usage(err, program);
            return Err(failure);
        }
    };

    match selection {
        Selection::Help => {
            let _ = registry.usage(out, program);
            Ok(())
        }
        Selection::Version => {
            let _ = writeln!(out, "v{VERSION}");
            Ok(())
        }
        Selection::Run(selected) => run_selected(&selected).inspect_err(|failure| {
            error!("{failure}.");
        }),
    }
}
