//! # Clickbust Core
//!
//! Ghost click suppression for touch, pointer and mouse input.
//! Compiles natively and to WASM; the host is reached only through traits.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │               clickbust-core                │
//! ├─────────────────────────────────────────────┤
//! │  Normalizer      │  Installer               │
//! │  - Profiles      │  - One buster per page   │
//! │  - PointerDown   │  - Listener wiring       │
//! │  - listen()      │  - Eviction scheduling   │
//! ├─────────────────────────────────────────────┤
//! │  Registry        │  Classifier              │
//! │  - Pending taps  │  - Cooldown window       │
//! │  - Tolerance box │  - Suppression callback  │
//! ├─────────────────────────────────────────────┤
//! │  Diagnostics                                │
//! │  - Logger tree   - Stack serializer         │
//! └─────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod buster;
pub mod clock;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod event;
pub mod install;
pub mod normalize;
pub mod registry;

pub use buster::{ClickOutcome, ClickVerdict, GhostClickBuster, SuppressionCallback};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{BusterConfig, CooldownPolicy, Tolerance};
pub use diagnostics::{
    DiagnosticError, DiagnosticsError, Level, LogHandler, LogManager, LogRecord, LoggerId,
    MemoryHandler, TracingHandler,
};
pub use error::{BusterError, BusterResult, ConfigError};
pub use event::{Point, PointerDown, RawPointerDown, TouchPoint};
pub use install::{HostServices, InstallContext, Installation, PageContext, SharedBuster};
pub use normalize::{
    listen, pointer_down_handler, Handler, HostEvent, HostTarget, ListenerStrategy, PlatformProbe,
    PlatformProfile,
};
pub use registry::{EvictionTicket, PendingTouch, TouchRegistry};

/// Clickbust core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
