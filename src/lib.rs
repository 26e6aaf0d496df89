//! mbuild is a small build driver for multi-component C projects. It turns a
//! YAML manifest into a registry of named targets (clean, build, lint, run and
//! docs per profile and component), runs the selected targets in order as
//! child processes, and rebuilds its own binary when its source has changed.

/// Growable buffers used for command tokens and text.
pub mod buffer;

/// CLI interface.
pub mod cli;

/// External command values.
pub mod command;

/// Configuration management.
pub mod config;

/// Command-line target selection and execution.
pub mod dispatch;

/// Error handling.
pub mod error;

/// Child process spawning and waiting.
pub mod process;

/// Targets generated from the project configuration.
pub mod project;

/// Self-rebuild of the running binary.
pub mod rebuild;

/// Targets and the registry that holds them.
pub mod target;
