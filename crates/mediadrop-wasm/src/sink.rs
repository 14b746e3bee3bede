//! Upload sink backed by a JavaScript function.

use async_trait::async_trait;
use js_sys::{Array, Function, Promise, Uint8Array};
use mediadrop_core::{FilePayload, SinkError, UploadSink};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{File, FilePropertyBag};

use crate::js_error_message;

/// Calls `upload(files: File[])` and waits for the returned promise.
///
/// A plain (non-promise) return value counts as success; a thrown error or
/// rejected promise fails the batch with the error's message.
#[derive(Debug, Clone)]
pub struct JsUploadSink {
    callback: Function,
}

impl JsUploadSink {
    pub fn new(callback: Function) -> Self {
        Self { callback }
    }
}

#[async_trait(?Send)]
impl UploadSink for JsUploadSink {
    async fn upload(&self, files: Vec<FilePayload>) -> Result<(), SinkError> {
        let list = Array::new();
        for file in &files {
            list.push(&to_js_file(file).map_err(|e| SinkError::new(js_error_message(&e)))?.into());
        }

        let returned = self
            .callback
            .call1(&JsValue::NULL, &list)
            .map_err(|e| SinkError::new(js_error_message(&e)))?;

        if let Some(promise) = returned.dyn_ref::<Promise>() {
            JsFuture::from(promise.clone()).await.map_err(|e| {
                web_sys::console::error_2(&"upload rejected:".into(), &e);
                SinkError::new(js_error_message(&e))
            })?;
        }
        Ok(())
    }
}

fn to_js_file(file: &FilePayload) -> Result<File, JsValue> {
    let parts = Array::of1(&Uint8Array::from(&file.bytes[..]));
    let options = FilePropertyBag::new();
    options.set_type(&file.mime_type);
    File::new_with_u8_array_sequence_and_options(&parts, &file.name, &options)
}
