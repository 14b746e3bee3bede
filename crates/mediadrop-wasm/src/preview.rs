//! Object-URL previews for browser hosts.

use js_sys::{Array, Uint8Array};
use mediadrop_core::preview::{PreviewBackend, PreviewError};
use mediadrop_core::FilePayload;
use web_sys::{Blob, BlobPropertyBag, Url};

use crate::js_error_message;

/// Creates `blob:` URLs for image previews and revokes them on request.
#[derive(Debug, Default, Clone, Copy)]
pub struct ObjectUrlPreviews;

impl PreviewBackend for ObjectUrlPreviews {
    fn create(&self, file: &FilePayload) -> Result<String, PreviewError> {
        let blob = payload_blob(file).map_err(|e| PreviewError {
            name: file.name.clone(),
            reason: js_error_message(&e),
        })?;
        Url::create_object_url_with_blob(&blob).map_err(|e| PreviewError {
            name: file.name.clone(),
            reason: js_error_message(&e),
        })
    }

    fn revoke(&self, url: &str) {
        if let Err(e) = Url::revoke_object_url(url) {
            web_sys::console::warn_2(&"failed to revoke preview URL".into(), &e);
        }
    }
}

/// Copy a payload's bytes into a JS `Blob` carrying its MIME type.
pub(crate) fn payload_blob(file: &FilePayload) -> Result<Blob, wasm_bindgen::JsValue> {
    let parts = Array::of1(&Uint8Array::from(&file.bytes[..]));
    let options = BlobPropertyBag::new();
    options.set_type(&file.mime_type);
    Blob::new_with_u8_array_sequence_and_options(&parts, &options)
}
