//! `setTimeout`-paced progress ticks.

use async_trait::async_trait;
use js_sys::{Function, Promise};
use mediadrop_core::upload::Ticker;
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;
use web_sys::console;

/// Delay between progress ticks in browsers.
pub const DEFAULT_TICK_MS: i32 = 100;

/// Waits `delay_ms` on the browser event loop between progress ticks.
#[derive(Debug, Clone, Copy)]
pub struct TimeoutTicker {
    delay_ms: i32,
}

impl TimeoutTicker {
    pub fn new(delay_ms: i32) -> Self {
        Self {
            delay_ms: delay_ms.max(0),
        }
    }
}

impl Default for TimeoutTicker {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_MS)
    }
}

#[async_trait(?Send)]
impl Ticker for TimeoutTicker {
    async fn tick(&self) {
        let delay = self.delay_ms;
        let promise = Promise::new(&mut |resolve: Function, _reject: Function| {
            let scheduled = web_sys::window().map(|window| {
                window.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, delay)
            });
            // No window (worker) or a failed schedule: resolve right away.
            if !matches!(scheduled, Some(Ok(_))) {
                if let Err(e) = resolve.call0(&JsValue::NULL) {
                    console::warn_2(&"progress tick could not resolve:".into(), &e);
                }
            }
        });
        if let Err(e) = JsFuture::from(promise).await {
            console::warn_2(&"progress tick rejected:".into(), &e);
        }
    }
}
