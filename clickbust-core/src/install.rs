//! # Installation
//!
//! Owns the single buster of a page and wires it to the host:
//!
//! ```text
//! PageContext::install
//!   ├─ PlatformProfile::classify(probe)
//!   ├─ GhostClickBuster::new(config)
//!   ├─ register early touches, purge_origin, schedule their evictions
//!   ├─ listen(<gesture start>) ──► handle_gesture_start ──► schedule_eviction
//!   └─ listen("click")         ──► classify_click ──► ClickOutcome::apply
//! ```
//!
//! A second `install` on the same context is a no-op, so each page gets
//! exactly one gesture-start listener and one click listener.
//!
//! Hosts that record gesture starts before the buster is installed pass them
//! as `early_touches`. The startup origin purge runs over those, since the
//! listeners have not seen anything yet.

use std::cell::RefCell;
use std::rc::Rc;

use crate::buster::{ClickVerdict, GhostClickBuster};
use crate::clock::Clock;
use crate::config::BusterConfig;
use crate::diagnostics::LogManager;
use crate::error::{BusterError, BusterResult};
use crate::event::{Point, PointerDown};
use crate::normalize::{
    listen, pointer_down_handler, Handler, HostEvent, HostTarget, ListenerStrategy, PlatformProbe,
    PlatformProfile, CLICK_EVENT,
};
use crate::registry::EvictionTicket;

/// Host facilities the installed listeners need.
pub trait HostServices {
    /// Run `task` once after `delay_ms`. There is no cancellation.
    fn schedule_eviction(&self, delay_ms: u64, task: Box<dyn FnOnce()>);

    /// Surface an error raised inside a listener.
    fn report_error(&self, error: &BusterError);
}

/// A buster shared between listeners.
pub type SharedBuster = Rc<RefCell<GhostClickBuster>>;

/// Everything `install` needs besides the target.
pub struct InstallContext {
    /// Buster configuration.
    pub config: BusterConfig,
    /// Time source.
    pub clock: Rc<dyn Clock>,
    /// Logger tree; must have a level configured before clicks arrive.
    pub logs: Rc<LogManager>,
    /// Timer and error reporting.
    pub services: Rc<dyn HostServices>,
    /// Gesture starts the host saw before installation, oldest first.
    pub early_touches: Vec<Point>,
}

/// A live installation.
#[derive(Debug)]
pub struct Installation {
    buster: SharedBuster,
    profile: PlatformProfile,
    gesture_strategy: ListenerStrategy,
    click_strategy: ListenerStrategy,
}

impl Installation {
    /// The installed buster.
    #[must_use]
    pub fn buster(&self) -> &SharedBuster {
        &self.buster
    }

    /// Input model detected at installation.
    #[must_use]
    pub const fn profile(&self) -> PlatformProfile {
        self.profile
    }

    /// How the gesture-start listener was registered.
    #[must_use]
    pub const fn gesture_strategy(&self) -> ListenerStrategy {
        self.gesture_strategy
    }

    /// How the click listener was registered.
    #[must_use]
    pub const fn click_strategy(&self) -> ListenerStrategy {
        self.click_strategy
    }

    /// Arm the suppression callback. Returns whether one was replaced.
    pub fn arm(&self, callback: impl FnOnce() + 'static) -> bool {
        self.buster.borrow_mut().arm(callback)
    }

    /// Number of pending gesture starts.
    #[must_use]
    pub fn pending_touches(&self) -> usize {
        self.buster.borrow().registry().len()
    }
}

/// Per-page installation state.
#[derive(Debug, Default)]
pub struct PageContext {
    installation: Option<Installation>,
}

impl PageContext {
    /// Create an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the buster has been installed.
    #[must_use]
    pub fn is_installed(&self) -> bool {
        self.installation.is_some()
    }

    /// The live installation, if any.
    #[must_use]
    pub fn installation(&self) -> Option<&Installation> {
        self.installation.as_ref()
    }

    /// Install the buster on `target`.
    ///
    /// Returns `false` without touching the target if already installed.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, an early touch is
    /// not finite, or the logger tree cannot log the startup purge.
    pub fn install<T>(
        &mut self,
        target: &T,
        probe: &PlatformProbe,
        ctx: InstallContext,
    ) -> BusterResult<bool>
    where
        T: HostTarget,
        T::Event: HostEvent,
    {
        if self.is_installed() {
            tracing::debug!("buster already installed, skipping");
            return Ok(false);
        }

        let profile = PlatformProfile::classify(probe);
        let purge = ctx.config.purge_origin_on_install;
        let mut buster = GhostClickBuster::new(ctx.config, ctx.clock, ctx.logs)?;
        let tickets = ctx
            .early_touches
            .iter()
            .map(|&point| buster.register_pending(point))
            .collect::<BusterResult<Vec<_>>>()?;
        if purge {
            buster.purge_origin()?;
        }
        let buster = Rc::new(RefCell::new(buster));
        for ticket in tickets {
            schedule_eviction(&buster, &ctx.services, ticket);
        }

        let gesture_event = profile.gesture_start_event();
        let gesture_strategy = listen(
            target,
            gesture_event,
            gesture_handler::<T::Event>(profile, &buster, &ctx.services),
        );
        let click_strategy = listen(
            target,
            CLICK_EVENT,
            click_handler::<T::Event>(&buster, &ctx.services),
        );

        tracing::info!(
            %profile,
            gesture_event,
            ?gesture_strategy,
            ?click_strategy,
            "ghost click buster installed"
        );

        self.installation = Some(Installation {
            buster,
            profile,
            gesture_strategy,
            click_strategy,
        });
        Ok(true)
    }
}

fn gesture_handler<E: HostEvent + 'static>(
    profile: PlatformProfile,
    buster: &SharedBuster,
    services: &Rc<dyn HostServices>,
) -> Handler<E> {
    let buster = Rc::clone(buster);
    let services = Rc::clone(services);
    pointer_down_handler(profile, move |down: &PointerDown| {
        let registered = buster.borrow_mut().handle_gesture_start(down);
        match registered {
            Ok(Some(ticket)) => schedule_eviction(&buster, &services, ticket),
            Ok(None) => {}
            Err(err) => services.report_error(&err),
        }
    })
}

fn schedule_eviction(
    buster: &SharedBuster,
    services: &Rc<dyn HostServices>,
    ticket: EvictionTicket,
) {
    let buster = Rc::clone(buster);
    let reporter = Rc::clone(services);
    services.schedule_eviction(
        ticket.delay_ms,
        Box::new(move || {
            let evicted = buster.borrow_mut().fire_eviction(ticket);
            if let Err(err) = evicted {
                reporter.report_error(&err);
            }
        }),
    );
}

fn click_handler<E: HostEvent + 'static>(
    buster: &SharedBuster,
    services: &Rc<dyn HostServices>,
) -> Handler<E> {
    let buster = Rc::clone(buster);
    let services = Rc::clone(services);
    Rc::new(move |event: &E| {
        // Release the buster before the callback runs; it may re-arm.
        let outcome = buster.borrow_mut().classify_click(event.client_point());
        match outcome {
            Ok(outcome) => {
                if let ClickVerdict::Busted = outcome.apply(event) {
                    tracing::debug!("click suppressed");
                }
            }
            Err(err) => services.report_error(&err),
        }
    })
}
