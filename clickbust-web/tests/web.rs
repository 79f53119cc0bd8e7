//! Browser tests for the WASM binding.
//!
//! Run with `wasm-pack test --headless --chrome clickbust-web -- --no-default-features`.
//! With the default `autostart` feature the buster is already installed with
//! the default cooldown window, so tests that need the long window below are
//! compiled out.

#![cfg(target_arch = "wasm32")]

use clickbust_web::{install_with_config, is_installed, platform_profile};
#[cfg(not(feature = "autostart"))]
use clickbust_web::{arm_suppression_callback, pending_touch_count};
#[cfg(not(feature = "autostart"))]
use js_sys::{Function, Reflect};
#[cfg(not(feature = "autostart"))]
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;
use web_sys::{MouseEvent, MouseEventInit};

wasm_bindgen_test_configure!(run_in_browser);

// ============================================================================
// Helpers
// ============================================================================

fn document() -> web_sys::Document {
    web_sys::window().unwrap().document().unwrap()
}

fn mouse_event(kind: &str, x: i32, y: i32) -> MouseEvent {
    let init = MouseEventInit::new();
    init.set_bubbles(true);
    init.set_cancelable(true);
    init.set_client_x(x);
    init.set_client_y(y);
    MouseEvent::new_with_mouse_event_init_dict(kind, &init).unwrap()
}

/// Install once with a ten minute cooldown window so the classification
/// window is still open however long the test run takes.
fn ensure_installed() {
    install_with_config(r#"{"root_level":"FINE","cooldown_window_ms":600000}"#).unwrap();
    assert!(is_installed());
}

// ============================================================================
// Installation
// ============================================================================

#[wasm_bindgen_test]
fn installs_once() {
    ensure_installed();
    assert!(!install_with_config("{}").unwrap());
    assert!(platform_profile().is_some());
}

#[wasm_bindgen_test]
fn rejects_invalid_config_before_install_check() {
    assert!(install_with_config(r#"{"cooldown_window_ms":0}"#).is_err());
}

// ============================================================================
// Click classification
// ============================================================================

#[wasm_bindgen_test]
fn origin_click_is_never_cancelled() {
    ensure_installed();
    let click = mouse_event("click", 0, 0);
    let not_cancelled = document().dispatch_event(&click).unwrap();
    assert!(not_cancelled);
    assert!(!click.default_prevented());
}

#[cfg(not(feature = "autostart"))]
#[wasm_bindgen_test]
fn mouse_down_is_registered_on_mouse_only_pages() {
    ensure_installed();
    if platform_profile().as_deref() != Some("mouse_only") {
        return;
    }
    let before = pending_touch_count();
    document()
        .dispatch_event(&mouse_event("mousedown", 150, 160))
        .unwrap();
    assert_eq!(pending_touch_count(), before + 1);

    // A matching click consumes the point and is left alone.
    let click = mouse_event("click", 151, 161);
    document().dispatch_event(&click).unwrap();
    assert!(!click.default_prevented());
    assert_eq!(pending_touch_count(), before);
}

#[cfg(not(feature = "autostart"))]
#[wasm_bindgen_test]
fn arming_replaces_previous_callback() {
    ensure_installed();
    let first = Function::new_no_args("globalThis.__clickbustFirst = true;");
    let second = Function::new_no_args("globalThis.__clickbustSecond = true;");
    arm_suppression_callback(first).unwrap();
    assert!(arm_suppression_callback(second).unwrap());

    // Nothing is pending near (700, 700), so the click is busted.
    let click = mouse_event("click", 700, 700);
    document().dispatch_event(&click).unwrap();
    assert!(click.default_prevented());

    let global = js_sys::global();
    let second_fired = Reflect::get(&global, &JsValue::from_str("__clickbustSecond")).unwrap();
    assert_eq!(second_fired.as_bool(), Some(true));
    let first_fired = Reflect::get(&global, &JsValue::from_str("__clickbustFirst")).unwrap();
    assert!(first_fired.is_undefined());
}
