//! # Clickbust WASM Binding
//!
//! Installs the ghost click buster on the hosting page as soon as the module
//! loads, and exposes a small namespace for arming the suppression callback.
//!
//! ## Usage
//!
//! Build for WASM:
//! ```bash
//! wasm-pack build --target web clickbust-web
//! ```
//!
//! Then import in JavaScript:
//! ```javascript
//! import init, { armSuppressionCallback } from './pkg/clickbust_web.js';
//!
//! await init();
//! armSuppressionCallback(() => console.log('ghost click suppressed'));
//! ```
//!
//! Without the default `autostart` feature nothing is installed until
//! `installWithConfig` is called.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod dom;
pub mod error;
pub mod host;

use std::cell::RefCell;
use std::rc::Rc;

use clickbust_core::{BusterConfig, InstallContext, LogManager, PageContext, TracingHandler};
use js_sys::Function;
use wasm_bindgen::prelude::*;

pub use dom::{DomEvent, DomTarget};
pub use error::WebError;
pub use host::{probe_platform, BrowserServices, DateClock};

#[derive(Default)]
struct PageState {
    context: PageContext,
    target: Option<DomTarget>,
}

thread_local! {
    static PAGE: RefCell<PageState> = RefCell::new(PageState::default());
}

/// Initialize the WASM module.
///
/// # Errors
///
/// With `autostart`, returns an error if the page has no document.
#[wasm_bindgen(start)]
pub fn init_wasm() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    tracing::info!(version = clickbust_core::VERSION, "clickbust WASM initialized");
    #[cfg(feature = "autostart")]
    install(BusterConfig::default())?;
    Ok(())
}

fn install(config: BusterConfig) -> Result<bool, WebError> {
    PAGE.with(|page| {
        let mut page = page.borrow_mut();
        if page.context.is_installed() {
            return Ok(false);
        }

        let window = web_sys::window().ok_or(WebError::NoWindow)?;
        let document = window.document().ok_or(WebError::NoDocument)?;
        let probe = probe_platform(&window);

        let logs = Rc::new(LogManager::with_clock(Box::new(DateClock)));
        logs.set_level(logs.root(), Some(config.root_level()?))?;
        logs.add_handler(logs.root(), Rc::new(TracingHandler))?;

        let target = DomTarget::new(document.into());
        let installed = page.context.install(
            &target,
            &probe,
            InstallContext {
                config,
                clock: Rc::new(DateClock),
                logs,
                services: Rc::new(BrowserServices),
                early_touches: Vec::new(),
            },
        )?;
        page.target = Some(target);
        Ok(installed)
    })
}

/// Install with a JSON configuration. Returns `false` if already installed,
/// in which case the configuration is ignored.
///
/// # Errors
///
/// Returns an error for invalid configuration or a page without a document.
#[wasm_bindgen(js_name = installWithConfig)]
pub fn install_with_config(json: &str) -> Result<bool, JsValue> {
    let config = BusterConfig::from_json(json).map_err(WebError::from)?;
    Ok(install(config)?)
}

/// Arm the suppression callback, replacing any previous one.
///
/// The callback runs at most once, on the next suppressed click, unless a
/// pending-touch eviction clears it first. Returns whether a callback was
/// replaced.
///
/// # Errors
///
/// Returns an error if the buster is not installed.
#[wasm_bindgen(js_name = armSuppressionCallback)]
pub fn arm_suppression_callback(callback: Function) -> Result<bool, JsValue> {
    PAGE.with(|page| {
        let page = page.borrow();
        let installation = page.context.installation().ok_or(WebError::NotInstalled)?;
        Ok(installation.arm(move || {
            if let Err(err) = callback.call0(&JsValue::NULL) {
                wasm_bindgen::throw_val(err);
            }
        }))
    })
}

/// Whether the buster is installed on this page.
#[wasm_bindgen(js_name = isInstalled)]
#[must_use]
pub fn is_installed() -> bool {
    PAGE.with(|page| page.borrow().context.is_installed())
}

/// Detected input model (`multi_touch`, `legacy_pointer`, `mouse_only`).
#[wasm_bindgen(js_name = platformProfile)]
#[must_use]
pub fn platform_profile() -> Option<String> {
    PAGE.with(|page| {
        page.borrow()
            .context
            .installation()
            .map(|installation| installation.profile().as_str().to_string())
    })
}

/// Number of gesture starts still waiting for a click.
#[wasm_bindgen(js_name = pendingTouchCount)]
#[must_use]
pub fn pending_touch_count() -> usize {
    PAGE.with(|page| {
        page.borrow()
            .context
            .installation()
            .map_or(0, clickbust_core::Installation::pending_touches)
    })
}
