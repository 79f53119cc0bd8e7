//! DOM adapters for the core host traits.

use std::cell::RefCell;
use std::rc::Rc;

use clickbust_core::{
    Handler, HostEvent, HostTarget, PlatformProfile, Point, RawPointerDown, TouchPoint,
};
use gloo::events::{EventListener, EventListenerOptions, EventListenerPhase};
use js_sys::{Function, Reflect};
use wasm_bindgen::prelude::*;
use web_sys::{Event, EventTarget, MouseEvent, TouchEvent, TouchList};

/// A DOM event seen by the buster.
#[derive(Debug, Clone)]
pub struct DomEvent {
    event: Event,
}

impl DomEvent {
    /// Wrap a DOM event.
    #[must_use]
    pub fn new(event: Event) -> Self {
        Self { event }
    }

    /// The wrapped event.
    #[must_use]
    pub fn raw(&self) -> &Event {
        &self.event
    }
}

#[allow(clippy::cast_precision_loss)] // Client coordinates are small integers
fn coord(value: i32) -> f32 {
    value as f32
}

fn touch_points(list: &TouchList) -> Vec<TouchPoint> {
    (0..list.length())
        .filter_map(|index| list.get(index))
        .map(|touch| {
            TouchPoint::new(
                u32::try_from(touch.identifier()).unwrap_or_default(),
                coord(touch.client_x()),
                coord(touch.client_y()),
            )
        })
        .collect()
}

impl HostEvent for DomEvent {
    fn client_point(&self) -> Point {
        self.event
            .dyn_ref::<MouseEvent>()
            .map_or(Point::ORIGIN, |mouse| {
                Point::new(coord(mouse.client_x()), coord(mouse.client_y()))
            })
    }

    fn pointer_down(&self, profile: PlatformProfile) -> RawPointerDown {
        let point = self.client_point();
        match profile {
            PlatformProfile::MultiTouch => match self.event.dyn_ref::<TouchEvent>() {
                Some(touch) => RawPointerDown::Touch {
                    touches: touch_points(&touch.touches()),
                    target_touches: touch_points(&touch.target_touches()),
                    changed_touches: touch_points(&touch.changed_touches()),
                },
                None => RawPointerDown::Mouse {
                    x: point.x,
                    y: point.y,
                },
            },
            PlatformProfile::LegacyPointer => {
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let pointer_id = Reflect::get(&self.event, &JsValue::from_str("pointerId"))
                    .ok()
                    .and_then(|id| id.as_f64())
                    .map_or(0, |id| id as u32);
                RawPointerDown::LegacyPointer {
                    pointer_id,
                    x: point.x,
                    y: point.y,
                }
            }
            PlatformProfile::MouseOnly => RawPointerDown::Mouse {
                x: point.x,
                y: point.y,
            },
        }
    }

    fn prevent_default(&self) {
        self.event.prevent_default();
    }

    fn stop_propagation(&self) {
        self.event.stop_propagation();
    }
}

/// An event target (normally the document) the buster listens on.
///
/// Listeners and closures are owned here and live as long as the target.
pub struct DomTarget {
    target: EventTarget,
    listeners: RefCell<Vec<EventListener>>,
    closures: RefCell<Vec<Closure<dyn FnMut(Event)>>>,
}

impl std::fmt::Debug for DomTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DomTarget")
            .field("listeners", &self.listeners.borrow().len())
            .field("closures", &self.closures.borrow().len())
            .finish_non_exhaustive()
    }
}

impl DomTarget {
    /// Listen on `target`.
    #[must_use]
    pub fn new(target: EventTarget) -> Self {
        Self {
            target,
            listeners: RefCell::new(Vec::new()),
            closures: RefCell::new(Vec::new()),
        }
    }

    fn has_function(&self, name: &str) -> bool {
        Reflect::get(&self.target, &JsValue::from_str(name))
            .map(|value| value.is_function())
            .unwrap_or(false)
    }

    fn keep(&self, handler: Handler<DomEvent>) -> JsValue {
        let closure = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            handler(&DomEvent::new(event));
        });
        let value: JsValue = closure.as_ref().clone();
        self.closures.borrow_mut().push(closure);
        value
    }
}

fn slot_name(event: &str) -> JsValue {
    JsValue::from_str(&format!("on{event}"))
}

impl HostTarget for DomTarget {
    type Event = DomEvent;

    fn supports_listeners(&self) -> bool {
        self.has_function("addEventListener")
    }

    fn add_capture_listener(&self, event: &str, handler: Handler<DomEvent>) {
        let listener = EventListener::new_with_options(
            &self.target,
            event.to_string(),
            EventListenerOptions {
                phase: EventListenerPhase::Capture,
                passive: false,
            },
            move |event: &Event| handler(&DomEvent::new(event.clone())),
        );
        self.listeners.borrow_mut().push(listener);
    }

    fn supports_attach(&self) -> bool {
        self.has_function("attachEvent")
    }

    fn attach(&self, event: &str, handler: Handler<DomEvent>) {
        let Ok(attach) = Reflect::get(&self.target, &JsValue::from_str("attachEvent")) else {
            return;
        };
        let Ok(attach) = attach.dyn_into::<Function>() else {
            return;
        };
        let callback = self.keep(handler);
        if let Err(err) = attach.call2(&self.target, &slot_name(event), &callback) {
            tracing::warn!(event, ?err, "attachEvent failed");
        }
    }

    fn slot(&self, event: &str) -> Option<Handler<DomEvent>> {
        let previous = Reflect::get(&self.target, &slot_name(event))
            .ok()?
            .dyn_into::<Function>()
            .ok()?;
        let this = self.target.clone();
        Some(Rc::new(move |event: &DomEvent| {
            if let Err(err) = previous.call1(&this, event.raw()) {
                wasm_bindgen::throw_val(err);
            }
        }))
    }

    fn set_slot(&self, event: &str, handler: Handler<DomEvent>) {
        let callback = self.keep(handler);
        if let Err(err) = Reflect::set(&self.target, &slot_name(event), &callback) {
            tracing::warn!(event, ?err, "failed to assign event handler slot");
        }
    }
}
