//! Argv-style representation of an external process invocation.
use std::{ffi::CString, fmt};

use crate::{
    buffer::{GrowableBuffer, StringBuffer},
    error::ProcessError,
};

/// Ordered list of tokens, program name first.
///
/// A command is built by appending whole tokens and is never shared between
/// two process launches.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Command {
    tokens: GrowableBuffer<String>,
}

impl Command {
    /// Creates an empty command.
    pub const fn new() -> Self {
        Self {
            tokens: GrowableBuffer::new(),
        }
    }

    /// Appends one token.
    pub fn arg(&mut self, token: impl Into<String>) -> &mut Self {
        self.tokens.append(token.into());
        self
    }

    /// Appends a group of tokens in order.
    pub fn args<I, S>(&mut self, tokens: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let group: Vec<String> = tokens.into_iter().map(Into::into).collect();
        self.tokens.append_many(&group);
        self
    }

    /// Drops every token but keeps the allocation for the next invocation.
    pub fn clear(&mut self) {
        self.tokens.clear();
    }

    /// Number of tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Returns `true` when the command has no program to run.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Borrows the tokens.
    pub fn tokens(&self) -> &[String] {
        self.tokens.as_slice()
    }

    /// Program name, if any.
    pub fn program(&self) -> Option<&str> {
        self.tokens.first().map(String::as_str)
    }

    /// Human-readable, space-joined rendering of every token.
    pub fn preview(&self) -> String {
        let mut preview = StringBuffer::new();
        for (index, token) in self.tokens.iter().enumerate() {
            if index > 0 {
                preview.append(&[" "]);
            }
            preview.append(&[token.as_str()]);
        }
        preview.to_string()
    }

    /// Converts the tokens into NUL-terminated strings for `exec`.
    pub fn to_argv(&self) -> Result<Vec<CString>, ProcessError> {
        self.tokens
            .iter()
            .map(|token| {
                CString::new(token.as_bytes()).map_err(|_| ProcessError::InvalidToken {
                    token: token.clone(),
                })
            })
            .collect()
    }
}

impl<S: Into<String>> FromIterator<S> for Command {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut command = Self::new();
        command.args(iter);
        command
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.preview())
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.tokens.iter()).finish()
    }
}
