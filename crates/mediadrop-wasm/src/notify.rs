//! Notification and observer callbacks into JavaScript.

use js_sys::Function;
use mediadrop_core::{Notification, NotificationKind, Notifier, UploadObserver};
use wasm_bindgen::JsValue;

/// Forwards notifications to `notify(kind, message)`.
///
/// Errors are also written to the browser console.
#[derive(Debug, Clone, Default)]
pub struct JsNotifier {
    callback: Option<Function>,
}

impl JsNotifier {
    pub fn new(callback: Option<Function>) -> Self {
        Self { callback }
    }
}

impl Notifier for JsNotifier {
    fn notify(&self, notification: Notification) {
        if notification.kind == NotificationKind::Error {
            web_sys::console::error_1(&JsValue::from_str(&notification.message));
        }
        if let Some(callback) = &self.callback {
            let kind = JsValue::from_str(notification.kind.as_str());
            let message = JsValue::from_str(&notification.message);
            if let Err(e) = callback.call2(&JsValue::NULL, &kind, &message) {
                web_sys::console::error_2(&"notify callback threw:".into(), &e);
            }
        }
    }
}

/// Forwards `on_progress(percent)` and `on_error(message)`.
#[derive(Debug, Clone, Default)]
pub struct JsObserver {
    on_progress: Option<Function>,
    on_error: Option<Function>,
}

impl JsObserver {
    pub fn new(on_progress: Option<Function>, on_error: Option<Function>) -> Self {
        Self {
            on_progress,
            on_error,
        }
    }
}

impl UploadObserver for JsObserver {
    fn on_progress(&self, percent: u8) {
        if let Some(callback) = &self.on_progress {
            if let Err(e) = callback.call1(&JsValue::NULL, &JsValue::from(percent)) {
                web_sys::console::error_2(&"onProgress callback threw:".into(), &e);
            }
        }
    }

    fn on_error(&self, message: &str) {
        if let Some(callback) = &self.on_error {
            if let Err(e) = callback.call1(&JsValue::NULL, &JsValue::from_str(message)) {
                web_sys::console::error_2(&"onError callback threw:".into(), &e);
            }
        }
    }
}
