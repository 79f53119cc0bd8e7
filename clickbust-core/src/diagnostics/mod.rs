//! # Diagnostics
//!
//! A dotted-name logger hierarchy, a call-chain serializer and the diagnostic
//! error types. Usable on its own; the buster logs its decisions through it.
//!
//! No handlers are attached and no level is set by default. Whoever owns the
//! [`LogManager`] must set at least a root level before the first message is
//! logged.

pub mod error;
pub mod handler;
pub mod level;
pub mod logger;
pub mod record;
pub mod stack;

pub use error::{
    assert_that, fail, subs, DiagnosticError, DiagnosticsError, ErrorContext, StackAccessError,
};
pub use handler::{LogHandler, MemoryHandler, TracingHandler};
pub use level::Level;
pub use logger::{HandlerId, LogManager, LoggerId};
pub use record::LogRecord;
pub use stack::{ArgValue, CallChain, Caller, FrameId, FunctionId, StackSerializer};
