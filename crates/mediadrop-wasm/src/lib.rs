//! Mediadrop WASM - WebAssembly bindings for mediadrop
//!
//! This crate runs the mediadrop-core ingestion pipeline in the browser.
//!
//! # Module Structure
//!
//! - `dropzone` - The `JsDropzone` class exported to JavaScript
//! - `preview` - Object-URL image previews
//! - `sink` - Upload sink calling a JavaScript function
//! - `ticker` - `setTimeout`-paced progress ticks
//! - `notify` - Notification and progress callbacks
//!
//! # Usage
//!
//! ```typescript
//! import init, { JsDropzone } from '@mediadrop/wasm';
//!
//! await init();
//! const dropzone = new JsDropzone(undefined, (files) => api.upload(files));
//! await dropzone.dropFiles(input.files);
//! console.log(dropzone.entries());
//! ```

use std::fmt::Display;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

mod dropzone;
mod notify;
mod preview;
mod sink;
mod ticker;

pub use dropzone::JsDropzone;
pub use notify::{JsNotifier, JsObserver};
pub use preview::ObjectUrlPreviews;
pub use sink::JsUploadSink;
pub use ticker::{TimeoutTicker, DEFAULT_TICK_MS};

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    mediadrop_core::VERSION.to_string()
}

pub(crate) fn to_js_error(e: impl Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Best-effort message of a thrown JS value.
pub(crate) fn js_error_message(value: &JsValue) -> String {
    if let Some(error) = value.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }
    value
        .as_string()
        .unwrap_or_else(|| "Unknown JavaScript error".to_string())
}
