//! # Input Normalization
//!
//! Hides the differences between host input models:
//!
//! ```text
//! probe ──► PlatformProfile ──► gesture-start event name
//!                           └─► RawPointerDown ──► PointerDown (uniform)
//! ```
//!
//! and provides [`listen`], a registration primitive that works on hosts with
//! standard listeners, legacy attach-style listeners, or only a single
//! `on<event>` handler slot.

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::event::{Point, PointerDown, RawPointerDown};

/// Name of the click event.
pub const CLICK_EVENT: &str = "click";

/// User-agent fragments of environments that support touch without
/// advertising it through the usual feature flag.
const TOUCH_USER_AGENTS: &[&str] = &[
    "Android",
    "iPhone",
    "iPad",
    "iPod",
    "BlackBerry",
    "IEMobile",
    "Silk",
    "Kindle",
];

/// Capabilities read from the host at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformProbe {
    /// The host exposes multi-touch events.
    pub touch_events: bool,
    /// The host exposes legacy prefixed pointer events.
    pub legacy_pointer_events: bool,
    /// The host identification string.
    pub user_agent: String,
}

/// The input model of the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformProfile {
    /// Touch events with touch lists.
    MultiTouch,
    /// Legacy prefixed pointer events.
    LegacyPointer,
    /// Mouse events only.
    MouseOnly,
}

impl PlatformProfile {
    /// Classify a host. Legacy pointer support wins over touch; the user
    /// agent is consulted only when neither flag is set.
    #[must_use]
    pub fn classify(probe: &PlatformProbe) -> Self {
        if probe.legacy_pointer_events {
            Self::LegacyPointer
        } else if probe.touch_events || is_touch_user_agent(&probe.user_agent) {
            Self::MultiTouch
        } else {
            Self::MouseOnly
        }
    }

    /// Event that starts a gesture under this model.
    #[must_use]
    pub const fn gesture_start_event(self) -> &'static str {
        match self {
            Self::MultiTouch => "touchstart",
            Self::LegacyPointer => "MSPointerDown",
            Self::MouseOnly => "mousedown",
        }
    }

    /// Short lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MultiTouch => "multi_touch",
            Self::LegacyPointer => "legacy_pointer",
            Self::MouseOnly => "mouse_only",
        }
    }
}

impl std::fmt::Display for PlatformProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn is_touch_user_agent(user_agent: &str) -> bool {
    TOUCH_USER_AGENTS
        .iter()
        .any(|fragment| user_agent.contains(fragment))
}

/// An event delivered by the host.
pub trait HostEvent {
    /// Viewport coordinates of the event.
    fn client_point(&self) -> Point;

    /// The event read as a pointer-down under `profile`.
    fn pointer_down(&self, profile: PlatformProfile) -> RawPointerDown;

    /// Cancel the default action.
    fn prevent_default(&self);

    /// Stop further propagation.
    fn stop_propagation(&self);
}

/// An event handler as stored by the host.
pub type Handler<E> = Rc<dyn Fn(&E)>;

/// Something listeners can be registered on.
pub trait HostTarget {
    /// Event type delivered to handlers.
    type Event: 'static;

    /// Whether standard listener registration is available.
    fn supports_listeners(&self) -> bool;

    /// Register a capture-phase listener.
    fn add_capture_listener(&self, event: &str, handler: Handler<Self::Event>);

    /// Whether legacy attach-style registration is available.
    fn supports_attach(&self) -> bool;

    /// Register through the legacy attach-style interface.
    fn attach(&self, event: &str, handler: Handler<Self::Event>);

    /// The handler currently in the `on<event>` slot.
    fn slot(&self, event: &str) -> Option<Handler<Self::Event>>;

    /// Replace the handler in the `on<event>` slot.
    fn set_slot(&self, event: &str, handler: Handler<Self::Event>);
}

/// Which registration form [`listen`] used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListenerStrategy {
    /// Standard capture-phase listener.
    Capture,
    /// Legacy attach-style listener.
    Attach,
    /// Wrapper in the handler slot that also calls the previous handler.
    ChainedSlot,
}

/// Register `handler` for `event` using the best form the target offers.
#[must_use = "the strategy tells whether a previous slot handler was chained"]
pub fn listen<T: HostTarget>(
    target: &T,
    event: &str,
    handler: Handler<T::Event>,
) -> ListenerStrategy {
    let strategy = if target.supports_listeners() {
        target.add_capture_listener(event, handler);
        ListenerStrategy::Capture
    } else if target.supports_attach() {
        target.attach(event, handler);
        ListenerStrategy::Attach
    } else {
        let chained: Handler<T::Event> = match target.slot(event) {
            Some(previous) => Rc::new(move |e: &T::Event| {
                previous(e);
                handler(e);
            }),
            None => handler,
        };
        target.set_slot(event, chained);
        ListenerStrategy::ChainedSlot
    };
    tracing::debug!(event, ?strategy, "listener registered");
    strategy
}

/// Wrap a pointer-down handler so it always sees the uniform touch-list
/// shape, whatever the host delivered.
#[must_use]
pub fn pointer_down_handler<E, F>(profile: PlatformProfile, handler: F) -> Handler<E>
where
    E: HostEvent + 'static,
    F: Fn(&PointerDown) + 'static,
{
    Rc::new(move |event: &E| handler(&PointerDown::normalize(event.pointer_down(profile))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::collections::HashMap;

    fn probe(touch: bool, legacy: bool, ua: &str) -> PlatformProbe {
        PlatformProbe {
            touch_events: touch,
            legacy_pointer_events: legacy,
            user_agent: ua.to_string(),
        }
    }

    #[test]
    fn legacy_pointer_has_priority() {
        assert_eq!(
            PlatformProfile::classify(&probe(true, true, "")),
            PlatformProfile::LegacyPointer
        );
    }

    #[test]
    fn touch_flag_means_multi_touch() {
        assert_eq!(
            PlatformProfile::classify(&probe(true, false, "Desktop")),
            PlatformProfile::MultiTouch
        );
    }

    #[test]
    fn user_agent_fallback_detects_touch() {
        let ua = "Mozilla/5.0 (Linux; U; Android 2.3.4) AppleWebKit/533.1";
        assert_eq!(
            PlatformProfile::classify(&probe(false, false, ua)),
            PlatformProfile::MultiTouch
        );
    }

    #[test]
    fn default_is_mouse_only() {
        let ua = "Mozilla/5.0 (X11; Linux x86_64) Firefox/120.0";
        let profile = PlatformProfile::classify(&probe(false, false, ua));
        assert_eq!(profile, PlatformProfile::MouseOnly);
        assert_eq!(profile.gesture_start_event(), "mousedown");
    }

    #[test]
    fn gesture_start_event_names() {
        assert_eq!(PlatformProfile::MultiTouch.gesture_start_event(), "touchstart");
        assert_eq!(PlatformProfile::LegacyPointer.gesture_start_event(), "MSPointerDown");
    }

    struct Ping;

    #[derive(Default)]
    struct SlotOnly {
        listeners: bool,
        attach: bool,
        captured: RefCell<Vec<String>>,
        attached: RefCell<Vec<String>>,
        slots: RefCell<HashMap<String, Handler<Ping>>>,
    }

    impl HostTarget for SlotOnly {
        type Event = Ping;

        fn supports_listeners(&self) -> bool {
            self.listeners
        }

        fn add_capture_listener(&self, event: &str, _handler: Handler<Ping>) {
            self.captured.borrow_mut().push(event.to_string());
        }

        fn supports_attach(&self) -> bool {
            self.attach
        }

        fn attach(&self, event: &str, _handler: Handler<Ping>) {
            self.attached.borrow_mut().push(event.to_string());
        }

        fn slot(&self, event: &str) -> Option<Handler<Ping>> {
            self.slots.borrow().get(event).cloned()
        }

        fn set_slot(&self, event: &str, handler: Handler<Ping>) {
            self.slots.borrow_mut().insert(event.to_string(), handler);
        }
    }

    #[test]
    fn prefers_capture_listeners() {
        let target = SlotOnly {
            listeners: true,
            attach: true,
            ..SlotOnly::default()
        };
        assert_eq!(listen(&target, "click", Rc::new(|_: &Ping| {})), ListenerStrategy::Capture);
        assert_eq!(*target.captured.borrow(), vec!["click"]);
        assert!(target.attached.borrow().is_empty());
    }

    #[test]
    fn falls_back_to_attach() {
        let target = SlotOnly {
            attach: true,
            ..SlotOnly::default()
        };
        assert_eq!(listen(&target, "click", Rc::new(|_: &Ping| {})), ListenerStrategy::Attach);
        assert_eq!(*target.attached.borrow(), vec!["click"]);
    }

    #[test]
    fn slot_wrapper_keeps_previous_handler() {
        let target = SlotOnly::default();
        let calls = Rc::new(RefCell::new(Vec::new()));

        let first = Rc::clone(&calls);
        target.set_slot("click", Rc::new(move |_: &Ping| first.borrow_mut().push("page")));

        let second = Rc::clone(&calls);
        let strategy = listen(
            &target,
            "click",
            Rc::new(move |_: &Ping| second.borrow_mut().push("buster")),
        );
        assert_eq!(strategy, ListenerStrategy::ChainedSlot);

        let installed = target.slot("click").expect("slot handler");
        installed(&Ping);
        assert_eq!(*calls.borrow(), vec!["page", "buster"]);
    }

    #[test]
    fn empty_slot_gets_handler_directly() {
        let target = SlotOnly::default();
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        let strategy = listen(
            &target,
            "mousedown",
            Rc::new(move |_: &Ping| counter.set(counter.get() + 1)),
        );
        assert_eq!(strategy, ListenerStrategy::ChainedSlot);
        target.slot("mousedown").expect("slot handler")(&Ping);
        assert_eq!(hits.get(), 1);
    }

    struct MouseDown;

    impl HostEvent for MouseDown {
        fn client_point(&self) -> Point {
            Point::new(5.0, 6.0)
        }

        fn pointer_down(&self, _profile: PlatformProfile) -> RawPointerDown {
            RawPointerDown::Mouse { x: 5.0, y: 6.0 }
        }

        fn prevent_default(&self) {}

        fn stop_propagation(&self) {}
    }

    #[test]
    fn pointer_down_handler_normalizes_mouse_events() {
        let seen = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&seen);
        let handler = pointer_down_handler(PlatformProfile::MouseOnly, move |down: &PointerDown| {
            *sink.borrow_mut() = Some(down.clone());
        });
        handler(&MouseDown);
        let down = seen.borrow().clone().expect("handler ran");
        assert_eq!(down.changed_touches.len(), 1);
        assert_eq!(down.first_touch().map(|t| t.point()), Some(Point::new(5.0, 6.0)));
    }
}
