//! The dropzone exposed to JavaScript.
//!
//! ```typescript
//! import init, { JsDropzone } from '@mediadrop/wasm';
//!
//! await init();
//! const dropzone = new JsDropzone(
//!   { accept: 'image/*', maxFiles: 3, enableCrop: true, aspectRatio: 16 / 9 },
//!   (files) => api.upload(files),
//!   (kind, message) => toast(kind, message),
//! );
//!
//! const outcome = await dropzone.dropFiles(event.dataTransfer.files);
//! if (outcome.toCrop.length > 0) {
//!   dropzone.openCrop(outcome.toCrop[0]);
//!   dropzone.setRotation(90);
//!   await dropzone.commitCrop();
//! }
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::{Array, Function, Promise, Uint8Array};
use mediadrop_core::crop::CropRect;
use mediadrop_core::{
    CropSession, CropSnapshot, Dropzone, DropzoneConfig, DropzoneError, FileId, FilePayload,
    IntakeOutcome,
};
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{future_to_promise, JsFuture};
use web_sys::{File, FileList};

use crate::notify::{JsNotifier, JsObserver};
use crate::preview::ObjectUrlPreviews;
use crate::sink::JsUploadSink;
use crate::ticker::TimeoutTicker;
use crate::to_js_error;

/// The crop session currently open in the editor.
struct ActiveCrop {
    id: FileId,
    session: CropSession,
}

/// Plain-data view of an [`IntakeOutcome`] for JavaScript.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DropSummary {
    pub accepted: Vec<FileId>,
    pub to_crop: Vec<FileId>,
    pub to_upload: Vec<FileId>,
    pub rejected: Vec<String>,
}

impl DropSummary {
    pub(crate) fn new(outcome: &IntakeOutcome) -> Self {
        Self {
            accepted: outcome.accepted.clone(),
            to_crop: outcome.to_crop.clone(),
            to_upload: outcome.to_upload.clone(),
            rejected: outcome.rejected.iter().map(|r| r.file.name.clone()).collect(),
        }
    }
}

/// Browser front end of the ingestion pipeline.
#[wasm_bindgen]
pub struct JsDropzone {
    inner: Rc<Dropzone>,
    crop: Rc<RefCell<Option<ActiveCrop>>>,
}

#[wasm_bindgen]
impl JsDropzone {
    /// Create a dropzone.
    ///
    /// `config` uses the camelCase option names (`maxSize`, `enableCrop`, ...);
    /// `undefined` means defaults. `upload` receives a `File[]` and may return
    /// a promise. `notify` receives `(kind, message)`.
    #[wasm_bindgen(constructor)]
    pub fn new(
        config: JsValue,
        upload: Function,
        notify: Option<Function>,
        on_progress: Option<Function>,
        on_error: Option<Function>,
    ) -> Result<JsDropzone, JsValue> {
        let config: DropzoneConfig = if config.is_undefined() || config.is_null() {
            DropzoneConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)?
        };

        let dropzone = Dropzone::new(
            config,
            Rc::new(ObjectUrlPreviews),
            Rc::new(JsUploadSink::new(upload)),
            Rc::new(JsNotifier::new(notify)),
        )
        .map_err(to_js_error)?
        .with_ticker(Rc::new(TimeoutTicker::default()))
        .with_observer(Rc::new(JsObserver::new(on_progress, on_error)));

        Ok(JsDropzone {
            inner: Rc::new(dropzone),
            crop: Rc::new(RefCell::new(None)),
        })
    }

    /// Current entries as plain objects, in display order.
    pub fn entries(&self) -> Result<JsValue, JsValue> {
        Ok(serde_wasm_bindgen::to_value(&self.inner.snapshots())?)
    }

    #[wasm_bindgen(getter, js_name = isUploading)]
    pub fn is_uploading(&self) -> bool {
        self.inner.is_uploading()
    }

    #[wasm_bindgen(js_name = pendingCrops)]
    pub fn pending_crops(&self) -> Result<JsValue, JsValue> {
        Ok(serde_wasm_bindgen::to_value(&self.inner.pending_crops())?)
    }

    /// Take in a `FileList` or an array of `File`s. Resolves to
    /// `{ accepted, toCrop, toUpload, rejected }` once any direct upload
    /// has settled.
    #[wasm_bindgen(js_name = dropFiles)]
    pub fn drop_files(&self, files: JsValue) -> Promise {
        let inner = Rc::clone(&self.inner);
        future_to_promise(async move {
            let payloads = read_files(&collect_files(&files)?).await?;
            let outcome = inner.drop_files(payloads).await.map_err(to_js_error)?;
            Ok(serde_wasm_bindgen::to_value(&DropSummary::new(&outcome))?)
        })
    }

    /// Open the crop editor for a pending entry. Any other open session is
    /// closed and its entry stays pending.
    #[wasm_bindgen(js_name = openCrop)]
    pub fn open_crop(&self, id: f64) -> Result<JsValue, JsValue> {
        let id = file_id(id)?;
        let session = self.inner.open_crop(id).map_err(to_js_error)?;
        let snapshot = session.snapshot();
        *self.crop.borrow_mut() = Some(ActiveCrop { id, session });
        snapshot_value(&snapshot)
    }

    #[wasm_bindgen(js_name = setZoom)]
    pub fn set_zoom(&self, zoom: f64) -> Result<JsValue, JsValue> {
        self.edit_crop(|session| session.set_zoom(zoom))
    }

    #[wasm_bindgen(js_name = setRotation)]
    pub fn set_rotation(&self, degrees: f64) -> Result<JsValue, JsValue> {
        self.edit_crop(|session| session.set_rotation(degrees))
    }

    #[wasm_bindgen(js_name = rotateBy)]
    pub fn rotate_by(&self, delta_degrees: f64) -> Result<JsValue, JsValue> {
        self.edit_crop(|session| session.rotate_by(delta_degrees))
    }

    /// Set the crop rectangle in source pixels. It is fitted to the
    /// configured aspect ratio and clamped to the rotation-safe bounds.
    #[wasm_bindgen(js_name = setCropRect)]
    pub fn set_crop_rect(&self, x: f64, y: f64, width: f64, height: f64) -> Result<JsValue, JsValue> {
        let rect = rect_from_js(x, y, width, height);
        self.edit_crop(|session| session.set_crop_rect(rect))
    }

    /// Commit the open session and upload the cropped file. A failed render
    /// keeps the session open.
    #[wasm_bindgen(js_name = commitCrop)]
    pub fn commit_crop(&self) -> Promise {
        let inner = Rc::clone(&self.inner);
        let crop = Rc::clone(&self.crop);
        future_to_promise(async move {
            let active = crop
                .borrow_mut()
                .take()
                .ok_or_else(|| JsValue::from_str("No crop session is open"))?;

            let timestamp = timestamp_millis(js_sys::Date::now());
            match inner.commit_crop(active.id, &active.session, timestamp).await {
                Ok(report) => Ok(serde_wasm_bindgen::to_value(&report.uploaded)?),
                Err(e @ DropzoneError::Crop(_)) => {
                    *crop.borrow_mut() = Some(active);
                    Err(to_js_error(e))
                }
                Err(e) => Err(to_js_error(e)),
            }
        })
    }

    /// Close the editor without deciding; the entry stays pending.
    #[wasm_bindgen(js_name = closeCrop)]
    pub fn close_crop(&self) -> Result<(), JsValue> {
        match self.crop.borrow_mut().take() {
            Some(active) => self.inner.close_crop(active.id).map_err(to_js_error),
            None => Ok(()),
        }
    }

    #[wasm_bindgen(js_name = cancelCrop)]
    pub fn cancel_crop(&self) -> Result<(), JsValue> {
        match self.crop.borrow_mut().take() {
            Some(active) => self.inner.cancel_crop(active.id).map_err(to_js_error),
            None => Ok(()),
        }
    }

    /// Upload entries by id as one batch (for example a retry after failure).
    pub fn upload(&self, ids: JsValue) -> Promise {
        let inner = Rc::clone(&self.inner);
        future_to_promise(async move {
            let ids: Vec<FileId> = serde_wasm_bindgen::from_value(ids)?;
            let report = inner.upload(&ids).await.map_err(to_js_error)?;
            Ok(serde_wasm_bindgen::to_value(&report.uploaded)?)
        })
    }

    #[wasm_bindgen(js_name = cancelUpload)]
    pub fn cancel_upload(&self) -> bool {
        self.inner.cancel_upload()
    }

    pub fn remove(&self, id: f64) -> Result<(), JsValue> {
        let id = file_id(id)?;
        self.close_crop_for(id);
        self.inner.remove(id).map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = clearAll)]
    pub fn clear_all(&self) -> usize {
        self.crop.borrow_mut().take();
        self.inner.clear_all()
    }
}

impl JsDropzone {
    fn edit_crop(&self, edit: impl FnOnce(&mut CropSession)) -> Result<JsValue, JsValue> {
        let mut crop = self.crop.borrow_mut();
        let active = crop
            .as_mut()
            .ok_or_else(|| JsValue::from_str("No crop session is open"))?;
        edit(&mut active.session);
        self.inner
            .sync_crop(active.id, &active.session)
            .map_err(to_js_error)?;
        snapshot_value(&active.session.snapshot())
    }

    fn close_crop_for(&self, id: FileId) {
        let mut crop = self.crop.borrow_mut();
        if crop.as_ref().is_some_and(|active| active.id == id) {
            crop.take();
        }
    }
}

fn snapshot_value(snapshot: &CropSnapshot) -> Result<JsValue, JsValue> {
    Ok(serde_wasm_bindgen::to_value(snapshot)?)
}

fn collect_files(value: &JsValue) -> Result<Vec<File>, JsValue> {
    if let Some(list) = value.dyn_ref::<FileList>() {
        return Ok((0..list.length()).filter_map(|i| list.get(i)).collect());
    }
    if let Some(array) = value.dyn_ref::<Array>() {
        return array.iter().map(|item| item.dyn_into::<File>()).collect();
    }
    Err(JsValue::from_str("Expected a FileList or an array of File objects"))
}

async fn read_files(files: &[File]) -> Result<Vec<FilePayload>, JsValue> {
    let mut payloads = Vec::with_capacity(files.len());
    for file in files {
        let buffer = JsFuture::from(file.array_buffer()).await?;
        let bytes = Uint8Array::new(&buffer).to_vec();
        payloads.push(FilePayload::new(file.name(), file.type_(), bytes));
    }
    Ok(payloads)
}

/// Entry ids cross the boundary as JS numbers.
pub(crate) fn file_id(value: f64) -> Result<FileId, JsValue> {
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 {
        Ok(FileId(value as u64))
    } else {
        Err(JsValue::from_str(&format!("Invalid file id: {}", value)))
    }
}

pub(crate) fn rect_from_js(x: f64, y: f64, width: f64, height: f64) -> CropRect {
    CropRect::new(
        x.round() as i64,
        y.round() as i64,
        width.round().max(1.0) as u32,
        height.round().max(1.0) as u32,
    )
}

pub(crate) fn timestamp_millis(now: f64) -> u64 {
    if now.is_finite() && now > 0.0 {
        now as u64
    } else {
        0
    }
}
