//! Browser clock, timers and capability probing.

use clickbust_core::{BusterError, Clock, HostServices, PlatformProbe};
use gloo::timers::callback::Timeout;
use js_sys::Reflect;
use wasm_bindgen::JsValue;
use web_sys::Window;

/// `Date.now()` as a [`Clock`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DateClock;

impl Clock for DateClock {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // Epoch millis are positive integers
    fn now_ms(&self) -> u64 {
        js_sys::Date::now() as u64
    }
}

/// Timers via `setTimeout`; errors are thrown into the page.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserServices;

impl HostServices for BrowserServices {
    fn schedule_eviction(&self, delay_ms: u64, task: Box<dyn FnOnce()>) {
        let millis = u32::try_from(delay_ms).unwrap_or(u32::MAX);
        Timeout::new(millis, task).forget();
    }

    fn report_error(&self, error: &BusterError) {
        tracing::error!(%error, "ghost click buster failed");
        wasm_bindgen::throw_str(&error.to_string());
    }
}

/// Read the input capabilities of the page.
#[must_use]
pub fn probe_platform(window: &Window) -> PlatformProbe {
    let navigator = window.navigator();
    PlatformProbe {
        touch_events: Reflect::has(window, &JsValue::from_str("ontouchstart")).unwrap_or(false),
        legacy_pointer_events: Reflect::get(&navigator, &JsValue::from_str("msPointerEnabled"))
            .map(|enabled| enabled.is_truthy())
            .unwrap_or(false),
        user_agent: navigator.user_agent().unwrap_or_default(),
    }
}
