//! Diagnostic error taxonomy.
//!
//! [`DiagnosticError`] is the error raised by internal invariant checks. Both
//! of its kinds carry a formatted message and a textual stack captured when the
//! error was built. [`ErrorContext`] is the structured summary attached to log
//! records.

use std::backtrace::{Backtrace, BacktraceStatus};
use std::fmt::Display;
use std::panic::Location;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Captured stacks are opaque text, truncated to this many characters.
pub const MAX_CAPTURED_STACK_CHARS: usize = 4096;

/// Logger tree misconfiguration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiagnosticsError {
    /// No level is set on the logger or any of its ancestors.
    #[error("no log level configured for logger '{logger}' or any of its ancestors")]
    NoLevelConfigured {
        /// Dotted name of the logger that was queried.
        logger: String,
    },

    /// The logger id does not belong to this manager.
    #[error("unknown logger id {0}")]
    UnknownLogger(usize),
}

/// Reading a frame's caller is not permitted by the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("caller of frame {frame} is not accessible")]
pub struct StackAccessError {
    /// Index of the frame whose caller could not be read.
    pub frame: usize,
}

/// Errors raised by diagnostic checks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiagnosticError {
    /// A general diagnostic failure.
    #[error("{message}")]
    Debug {
        /// Error message.
        message: String,
        /// Stack captured at construction.
        stack: String,
    },

    /// An assertion on an internal invariant failed.
    #[error("{message}")]
    Assertion {
        /// Formatted message, prefixed with `Assertion failed`.
        message: String,
        /// Stack captured at construction.
        stack: String,
    },
}

impl DiagnosticError {
    /// Create a general diagnostic error, capturing the current stack.
    #[must_use]
    #[track_caller]
    pub fn debug(message: impl Into<String>) -> Self {
        Self::Debug {
            message: message.into(),
            stack: capture_stack(Location::caller()),
        }
    }

    /// Create an assertion failure.
    ///
    /// `pattern` is substituted with `args` using [`subs`]. Without a pattern
    /// the message is just `Assertion failed`.
    #[must_use]
    #[track_caller]
    pub fn assertion(pattern: Option<&str>, args: &[&dyn Display]) -> Self {
        let message = match pattern {
            Some(pattern) => format!("Assertion failed: {}", subs(pattern, args)),
            None => "Assertion failed".to_string(),
        };
        Self::Assertion {
            message,
            stack: capture_stack(Location::caller()),
        }
    }

    /// The formatted message.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Debug { message, .. } | Self::Assertion { message, .. } => message,
        }
    }

    /// The stack captured when the error was built.
    #[must_use]
    pub fn captured_stack(&self) -> &str {
        match self {
            Self::Debug { stack, .. } | Self::Assertion { stack, .. } => stack,
        }
    }

    /// Short name of the error kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Debug { .. } => "DebugError",
            Self::Assertion { .. } => "AssertionError",
        }
    }
}

/// Check an invariant, failing with a formatted assertion error.
///
/// # Errors
///
/// Returns [`DiagnosticError::Assertion`] when `condition` is false.
#[track_caller]
pub fn assert_that(
    condition: bool,
    pattern: Option<&str>,
    args: &[&dyn Display],
) -> Result<(), DiagnosticError> {
    if condition {
        Ok(())
    } else {
        Err(DiagnosticError::assertion(pattern, args))
    }
}

/// Unconditionally fail with a formatted assertion error.
#[must_use]
#[track_caller]
pub fn fail(pattern: Option<&str>, args: &[&dyn Display]) -> DiagnosticError {
    DiagnosticError::assertion(pattern, args)
}

/// Replace each `%s` in `pattern` with the next argument, left to right.
///
/// Placeholders beyond the last argument are left as `%s`; arguments beyond
/// the last placeholder are ignored.
#[must_use]
pub fn subs(pattern: &str, args: &[&dyn Display]) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut args = args.iter();
    let mut rest = pattern;
    while let Some(pos) = rest.find("%s") {
        out.push_str(&rest[..pos]);
        match args.next() {
            Some(arg) => out.push_str(&arg.to_string()),
            None => out.push_str("%s"),
        }
        rest = &rest[pos + 2..];
    }
    out.push_str(rest);
    out
}

/// Truncate a captured stack to [`MAX_CAPTURED_STACK_CHARS`].
#[must_use]
pub fn bound_stack(stack: &str) -> String {
    match stack.char_indices().nth(MAX_CAPTURED_STACK_CHARS) {
        Some((cut, _)) => format!("{}...", &stack[..cut]),
        None => stack.to_string(),
    }
}

fn capture_stack(location: &Location<'_>) -> String {
    let backtrace = Backtrace::capture();
    if backtrace.status() == BacktraceStatus::Captured {
        bound_stack(&backtrace.to_string())
    } else {
        format!("at {location}")
    }
}

/// Structured description of a failure, attached to log records.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Error message, including the source chain.
    pub message: String,
    /// Source location where the context was captured.
    pub location: Option<String>,
    /// Captured stack, if one was available.
    pub stack: Option<String>,
    /// Rendered call chain, if the caller supplied one.
    pub call_chain: Option<String>,
}

impl ErrorContext {
    /// Capture an arbitrary error at the caller's location.
    #[must_use]
    #[track_caller]
    pub fn capture<E: std::error::Error + ?Sized>(error: &E) -> Self {
        let mut message = error.to_string();
        let mut source = error.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        Self {
            message,
            location: Some(Location::caller().to_string()),
            stack: None,
            call_chain: None,
        }
    }

    /// Build from a diagnostic error, keeping its captured stack.
    #[must_use]
    #[track_caller]
    pub fn from_diagnostic(error: &DiagnosticError) -> Self {
        Self {
            message: format!("{}: {}", error.kind(), error.message()),
            location: Some(Location::caller().to_string()),
            stack: Some(bound_stack(error.captured_stack())),
            call_chain: None,
        }
    }

    /// Attach a rendered call chain.
    #[must_use]
    pub fn with_call_chain(mut self, call_chain: String) -> Self {
        self.call_chain = Some(call_chain);
        self
    }

    /// Multi-line human readable summary.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut out = format!("Message: {}", self.message);
        if let Some(location) = &self.location {
            out.push_str("\nLocation: ");
            out.push_str(location);
        }
        if let Some(stack) = &self.stack {
            out.push_str("\n\nStack:\n");
            out.push_str(stack);
        }
        if let Some(chain) = &self.call_chain {
            out.push_str("\n\nCall chain:\n");
            out.push_str(chain);
        }
        out
    }
}
