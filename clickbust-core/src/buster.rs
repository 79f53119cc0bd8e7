//! # Click Classification
//!
//! Decides whether a click completes a recent gesture or is a ghost:
//!
//! ```text
//! click ─► window closed? ──yes──► Inactive      (untouched)
//!             │ no
//!             ▼
//!          x < 1 && y < 1? ─yes──► NonPositional (untouched, registry untouched)
//!             │ no
//!             ▼
//!          registry match? ─yes──► Anchored      (untouched, point consumed)
//!             │ no
//!             ▼
//!          Busted (cancel, stop propagation, fire armed callback once)
//! ```
//!
//! Matching is by position and time only. A genuine click whose gesture start
//! already expired, or was consumed by a nearby concurrent gesture, is
//! suppressed.

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::config::{BusterConfig, CooldownPolicy};
use crate::diagnostics::{assert_that, LogManager, LoggerId};
use crate::error::BusterResult;
use crate::event::{Point, PointerDown};
use crate::normalize::HostEvent;
use crate::registry::{EvictionTicket, PendingTouch, TouchRegistry};

/// Logger used for click decisions.
pub const BUSTER_LOGGER: &str = "clickbust.buster";
/// Logger used for registry bookkeeping.
pub const REGISTRY_LOGGER: &str = "clickbust.registry";

/// Callback fired when a click is suppressed.
pub type SuppressionCallback = Box<dyn FnOnce()>;

/// Decision for one click.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum ClickVerdict {
    /// The classification window has closed.
    Inactive,
    /// No pointing position (e.g. keyboard activation).
    NonPositional,
    /// The click matched a pending gesture start, which was consumed.
    Anchored {
        /// The consumed gesture start.
        touch: PendingTouch,
    },
    /// The click has no recent gesture start and must be suppressed.
    Busted,
}

impl ClickVerdict {
    /// Whether the click must be cancelled.
    #[must_use]
    pub const fn is_busted(&self) -> bool {
        matches!(self, Self::Busted)
    }
}

/// A verdict plus the callback to fire if the click was busted.
///
/// The callback is taken out of the buster before this is returned, so it
/// can run after the buster is released.
pub struct ClickOutcome {
    verdict: ClickVerdict,
    callback: Option<SuppressionCallback>,
}

impl std::fmt::Debug for ClickOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClickOutcome")
            .field("verdict", &self.verdict)
            .field("has_callback", &self.callback.is_some())
            .finish()
    }
}

impl ClickOutcome {
    /// The decision.
    #[must_use]
    pub const fn verdict(&self) -> ClickVerdict {
        self.verdict
    }

    /// Carry out the decision on the event: for a busted click, cancel it,
    /// stop propagation and fire the callback.
    pub fn apply<E: HostEvent + ?Sized>(self, event: &E) -> ClickVerdict {
        if self.verdict.is_busted() {
            event.prevent_default();
            event.stop_propagation();
        }
        if let Some(callback) = self.callback {
            callback();
        }
        self.verdict
    }
}

/// The click classifier and the state it owns.
pub struct GhostClickBuster {
    config: BusterConfig,
    registry: TouchRegistry,
    cooldown_start_ms: u64,
    callback: Option<SuppressionCallback>,
    clock: Rc<dyn Clock>,
    logs: Rc<LogManager>,
    logger: LoggerId,
    registry_logger: LoggerId,
}

impl std::fmt::Debug for GhostClickBuster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GhostClickBuster")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("cooldown_start_ms", &self.cooldown_start_ms)
            .field("armed", &self.callback.is_some())
            .finish_non_exhaustive()
    }
}

impl GhostClickBuster {
    /// Create a buster; the classification window opens now.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(
        config: BusterConfig,
        clock: Rc<dyn Clock>,
        logs: Rc<LogManager>,
    ) -> BusterResult<Self> {
        config.validate()?;
        let logger = logs.get_logger(BUSTER_LOGGER);
        let registry_logger = logs.get_logger(REGISTRY_LOGGER);
        Ok(Self {
            registry: TouchRegistry::new(config.eviction_window_ms),
            cooldown_start_ms: clock.now_ms(),
            callback: None,
            config,
            clock,
            logs,
            logger,
            registry_logger,
        })
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &BusterConfig {
        &self.config
    }

    /// The pending gesture starts.
    #[must_use]
    pub const fn registry(&self) -> &TouchRegistry {
        &self.registry
    }

    /// The logger tree used for decision traces.
    #[must_use]
    pub fn logs(&self) -> &Rc<LogManager> {
        &self.logs
    }

    /// When the current classification window opened (ms).
    #[must_use]
    pub const fn cooldown_start_ms(&self) -> u64 {
        self.cooldown_start_ms
    }

    /// Whether clicks are still being classified.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.clock.now_ms().saturating_sub(self.cooldown_start_ms) <= self.config.cooldown_window_ms
    }

    /// Arm the suppression callback. Returns whether a previous callback was
    /// replaced; the replaced callback is dropped without being called.
    pub fn arm(&mut self, callback: impl FnOnce() + 'static) -> bool {
        self.callback.replace(Box::new(callback)).is_some()
    }

    /// Whether a suppression callback is armed.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.callback.is_some()
    }

    /// Drop the armed callback, if any.
    pub fn disarm(&mut self) {
        self.callback = None;
    }

    /// Remove pending points near the origin.
    ///
    /// # Errors
    ///
    /// Returns an error if the logger tree has no level configured.
    pub fn purge_origin(&mut self) -> BusterResult<usize> {
        let removed = self.registry.purge_origin(self.config.tolerance);
        if removed > 0 {
            self.logs.finer(
                self.registry_logger,
                format!("purged {removed} pending touches near the origin"),
            )?;
        }
        Ok(removed)
    }

    /// Register the first touch of a gesture start.
    ///
    /// Returns the eviction the host must schedule, or `None` if the event
    /// carried no touches.
    ///
    /// # Errors
    ///
    /// Returns an error for non-finite coordinates or if the logger tree has
    /// no level configured.
    pub fn handle_gesture_start(
        &mut self,
        down: &PointerDown,
    ) -> BusterResult<Option<EvictionTicket>> {
        let Some(touch) = down.first_touch() else {
            return Ok(None);
        };
        let ticket = self.register_pending(touch.point())?;
        if self.config.cooldown_policy == CooldownPolicy::PerGesture {
            self.cooldown_start_ms = self.clock.now_ms();
        }
        Ok(Some(ticket))
    }

    /// Add a pending gesture start at `point` without touching the cooldown
    /// window. Used for gesture starts observed before installation.
    ///
    /// # Errors
    ///
    /// Returns an error for non-finite coordinates or if the logger tree has
    /// no level configured.
    pub fn register_pending(&mut self, point: Point) -> BusterResult<EvictionTicket> {
        assert_that(
            point.is_finite(),
            Some("gesture start coordinates must be finite, got %s"),
            &[&point],
        )?;
        let ticket = self.registry.register(point, self.clock.now_ms());
        self.logs.finer(
            self.registry_logger,
            format!("registered pending touch at {point}, evicting at {}", ticket.due_at_ms),
        )?;
        Ok(ticket)
    }

    /// Run a scheduled eviction. Clears the suppression callback.
    ///
    /// Returns whether the point was still pending.
    ///
    /// # Errors
    ///
    /// Returns an error if the logger tree has no level configured.
    pub fn fire_eviction(&mut self, ticket: EvictionTicket) -> BusterResult<bool> {
        let removed = self.registry.evict(&ticket);
        self.callback = None;
        if removed {
            self.logs.finest(
                self.registry_logger,
                format!("evicted pending touch at {}", ticket.point),
            )?;
        }
        Ok(removed)
    }

    /// Classify a click at `point`.
    ///
    /// For a busted click the armed callback is moved into the outcome.
    ///
    /// # Errors
    ///
    /// Returns an error if the logger tree has no level configured.
    pub fn classify_click(&mut self, point: Point) -> BusterResult<ClickOutcome> {
        let verdict = self.decide(point)?;
        let callback = if verdict.is_busted() {
            self.callback.take()
        } else {
            None
        };
        Ok(ClickOutcome { verdict, callback })
    }

    /// Classify a click event and apply the decision to it immediately.
    ///
    /// The callback runs while `self` is still borrowed; hosts whose callbacks
    /// can reach back into the buster should use [`Self::classify_click`] and
    /// [`ClickOutcome::apply`] instead.
    ///
    /// # Errors
    ///
    /// Returns an error if the logger tree has no level configured.
    pub fn handle_click<E: HostEvent + ?Sized>(&mut self, event: &E) -> BusterResult<ClickVerdict> {
        Ok(self.classify_click(event.client_point())?.apply(event))
    }

    fn decide(&mut self, point: Point) -> BusterResult<ClickVerdict> {
        if !self.is_active() {
            return Ok(ClickVerdict::Inactive);
        }

        if point.x < 1.0 && point.y < 1.0 {
            self.logs
                .fine(self.logger, format!("not busting click at {point}: no position"))?;
            return Ok(ClickVerdict::NonPositional);
        }

        if let Some(touch) = self.registry.find_and_consume(point, self.config.tolerance) {
            self.logs.finest(
                self.registry_logger,
                format!("click at {point} consumed pending touch at {}", touch.point),
            )?;
            return Ok(ClickVerdict::Anchored { touch });
        }

        self.logs
            .fine(self.logger, format!("busting click at {point}"))?;
        Ok(ClickVerdict::Busted)
    }
}
