//! Preview handles for accepted files.
//!
//! Images get a revocable handle (an object URL in browsers) created by a
//! [`PreviewBackend`]. Everything else gets a static [`FileIcon`] which is
//! never owned and never revoked.
//!
//! # Ownership
//!
//! A [`PreviewHandle`] is owned by exactly one file entry. Revocation is
//! idempotent: the first call releases the underlying resource, later calls
//! do nothing. Dropping a handle revokes it if nobody did so explicitly, so a
//! handle cannot outlive its entry on any path.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::file::{mime_essence, FilePayload};

/// Errors from a preview backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Failed to create preview for {name}: {reason}")]
pub struct PreviewError {
    pub name: String,
    pub reason: String,
}

/// Source of revocable preview URLs.
pub trait PreviewBackend {
    /// Create a URL that displays `file`.
    fn create(&self, file: &FilePayload) -> Result<String, PreviewError>;

    /// Release a URL returned by [`create`](Self::create).
    fn revoke(&self, url: &str);
}

/// Owned, revocable preview URL.
pub struct PreviewHandle {
    url: String,
    revoked: Cell<bool>,
    backend: Rc<dyn PreviewBackend>,
}

impl PreviewHandle {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_revoked(&self) -> bool {
        self.revoked.get()
    }

    /// Release the underlying resource. Repeated calls are no-ops.
    pub fn revoke(&self) {
        if !self.revoked.replace(true) {
            debug!(url = %self.url, "revoking preview");
            self.backend.revoke(&self.url);
        }
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        self.revoke();
    }
}

impl fmt::Debug for PreviewHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreviewHandle")
            .field("url", &self.url)
            .field("revoked", &self.revoked.get())
            .finish()
    }
}

/// Static type indicator for files without a rendered preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileIcon {
    Image,
    Pdf,
    Video,
    Audio,
    Archive,
    Text,
    Generic,
}

impl FileIcon {
    pub fn for_mime(mime: &str) -> Self {
        let mime = mime_essence(mime);
        let top = mime.split('/').next().unwrap_or("");
        match (top, mime.as_str()) {
            ("image", _) => FileIcon::Image,
            ("video", _) => FileIcon::Video,
            ("audio", _) => FileIcon::Audio,
            ("text", _) => FileIcon::Text,
            (_, "application/pdf") => FileIcon::Pdf,
            (
                _,
                "application/zip"
                | "application/gzip"
                | "application/x-tar"
                | "application/x-7z-compressed"
                | "application/x-rar-compressed",
            ) => FileIcon::Archive,
            (_, "application/json" | "application/xml") => FileIcon::Text,
            _ => FileIcon::Generic,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FileIcon::Image => "image",
            FileIcon::Pdf => "pdf",
            FileIcon::Video => "video",
            FileIcon::Audio => "audio",
            FileIcon::Archive => "archive",
            FileIcon::Text => "text",
            FileIcon::Generic => "generic",
        }
    }
}

/// What a file entry displays.
#[derive(Debug)]
pub enum Preview {
    Handle(PreviewHandle),
    Icon(FileIcon),
}

impl Preview {
    pub fn url(&self) -> Option<&str> {
        match self {
            Preview::Handle(handle) => Some(handle.url()),
            Preview::Icon(_) => None,
        }
    }

    pub fn icon(&self) -> Option<FileIcon> {
        match self {
            Preview::Handle(_) => None,
            Preview::Icon(icon) => Some(*icon),
        }
    }

    /// Revoke the handle, if any. Icons are static and left alone.
    pub fn revoke(&self) {
        if let Preview::Handle(handle) = self {
            handle.revoke();
        }
    }
}

/// Creates previews through a shared backend.
#[derive(Clone)]
pub struct PreviewGenerator {
    backend: Rc<dyn PreviewBackend>,
}

impl PreviewGenerator {
    pub fn new(backend: Rc<dyn PreviewBackend>) -> Self {
        Self { backend }
    }

    /// Revocable handle for images, static icon for everything else.
    ///
    /// A backend failure degrades to the image icon rather than failing the
    /// intake of an otherwise valid file.
    pub fn generate(&self, file: &FilePayload) -> Preview {
        if !file.is_image() {
            return Preview::Icon(FileIcon::for_mime(&file.mime_type));
        }

        match self.backend.create(file) {
            Ok(url) => Preview::Handle(PreviewHandle {
                url,
                revoked: Cell::new(false),
                backend: Rc::clone(&self.backend),
            }),
            Err(e) => {
                warn!(error = %e, "preview unavailable");
                Preview::Icon(FileIcon::Image)
            }
        }
    }

    /// Revoke an optional handle. `None` and already revoked handles are no-ops.
    pub fn revoke(handle: Option<&PreviewHandle>) {
        if let Some(handle) = handle {
            handle.revoke();
        }
    }
}

impl fmt::Debug for PreviewGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreviewGenerator").finish_non_exhaustive()
    }
}

/// Preview backend for native hosts: hands out `memory://` URLs and keeps
/// track of which ones are still live.
#[derive(Debug, Default)]
pub struct InMemoryPreviews {
    next: Cell<u64>,
    live: RefCell<Vec<String>>,
    revoked: RefCell<Vec<String>>,
}

impl InMemoryPreviews {
    pub fn new() -> Self {
        Self::default()
    }

    /// URLs created and not yet revoked.
    pub fn live(&self) -> Vec<String> {
        self.live.borrow().clone()
    }

    /// Every revoke call received, in order.
    pub fn revocations(&self) -> Vec<String> {
        self.revoked.borrow().clone()
    }
}

impl PreviewBackend for InMemoryPreviews {
    fn create(&self, file: &FilePayload) -> Result<String, PreviewError> {
        let n = self.next.get() + 1;
        self.next.set(n);
        let url = format!("memory://preview/{}/{}", n, file.name);
        self.live.borrow_mut().push(url.clone());
        Ok(url)
    }

    fn revoke(&self, url: &str) {
        self.live.borrow_mut().retain(|live| live != url);
        self.revoked.borrow_mut().push(url.to_string());
    }
}
