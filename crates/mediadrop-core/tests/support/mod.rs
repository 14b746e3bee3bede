#![allow(dead_code)]

use std::cell::RefCell;
use std::io::Cursor;

use async_trait::async_trait;
use futures::channel::oneshot;
use mediadrop_core::{FilePayload, SinkError, UploadObserver, UploadSink};

/// Sink that records every batch and answers with a fixed result.
pub struct ScriptedSink {
    result: Result<(), SinkError>,
    pub batches: RefCell<Vec<Vec<FilePayload>>>,
}

impl ScriptedSink {
    pub fn accepting() -> Self {
        Self {
            result: Ok(()),
            batches: RefCell::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            result: Err(SinkError::new(message)),
            batches: RefCell::new(Vec::new()),
        }
    }

    pub fn uploaded_names(&self) -> Vec<String> {
        self.batches
            .borrow()
            .iter()
            .flatten()
            .map(|f| f.name.clone())
            .collect()
    }
}

#[async_trait(?Send)]
impl UploadSink for ScriptedSink {
    async fn upload(&self, files: Vec<FilePayload>) -> Result<(), SinkError> {
        self.batches.borrow_mut().push(files);
        self.result.clone()
    }
}

/// Sink that holds the first batch until the gate is opened or dropped.
pub struct GatedSink {
    gate: RefCell<Option<oneshot::Receiver<()>>>,
}

impl GatedSink {
    pub fn new() -> (Self, oneshot::Sender<()>) {
        let (tx, rx) = oneshot::channel();
        let sink = Self {
            gate: RefCell::new(Some(rx)),
        };
        (sink, tx)
    }
}

#[async_trait(?Send)]
impl UploadSink for GatedSink {
    async fn upload(&self, _files: Vec<FilePayload>) -> Result<(), SinkError> {
        let gate = self.gate.borrow_mut().take();
        match gate {
            Some(rx) => rx.await.map_err(|_| SinkError::new("gate closed")),
            None => Ok(()),
        }
    }
}

#[derive(Default)]
pub struct ObserverLog {
    pub progress: RefCell<Vec<u8>>,
    pub errors: RefCell<Vec<String>>,
}

impl UploadObserver for ObserverLog {
    fn on_progress(&self, percent: u8) {
        self.progress.borrow_mut().push(percent);
    }

    fn on_error(&self, message: &str) {
        self.errors.borrow_mut().push(message.to_string());
    }
}

/// A small PNG with a distinct color per quadrant.
pub fn quadrant_png(name: &str, width: u32, height: u32) -> FilePayload {
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        let right = x >= width / 2;
        let bottom = y >= height / 2;
        match (right, bottom) {
            (false, false) => image::Rgb([255, 0, 0]),
            (true, false) => image::Rgb([0, 255, 0]),
            (false, true) => image::Rgb([0, 0, 255]),
            (true, true) => image::Rgb([255, 255, 255]),
        }
    });
    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut out, image::ImageFormat::Png)
        .unwrap();
    FilePayload::new(name, "image/png", out.into_inner())
}

pub fn sized_file(name: &str, mime: &str, size: usize) -> FilePayload {
    FilePayload::new(name, mime, vec![0u8; size])
}
