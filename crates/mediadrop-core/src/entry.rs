//! File entries and their upload status.

use serde::Serialize;

use crate::crop::CropSnapshot;
use crate::file::{FileId, FilePayload};
use crate::preview::{FileIcon, Preview};

/// Upload lifecycle of a file entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Queued,
    Uploading,
    Success,
    Error,
}

impl EntryStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, EntryStatus::Success | EntryStatus::Error)
    }
}

/// One submitted file and its lifecycle state.
///
/// Entries are created and mutated only through
/// [`FileEntryStore`](crate::store::FileEntryStore); this type exposes
/// read access.
#[derive(Debug)]
pub struct FileEntry {
    pub(crate) id: FileId,
    pub(crate) payload: FilePayload,
    pub(crate) preview: Preview,
    pub(crate) crop: Option<CropSnapshot>,
    pub(crate) status: EntryStatus,
    pub(crate) progress: u8,
    pub(crate) error: Option<String>,
}

impl FileEntry {
    pub(crate) fn new(id: FileId, payload: FilePayload, preview: Preview) -> Self {
        Self {
            id,
            payload,
            preview,
            crop: None,
            status: EntryStatus::Queued,
            progress: 0,
            error: None,
        }
    }

    pub fn id(&self) -> FileId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.payload.name
    }

    pub fn size(&self) -> u64 {
        self.payload.size()
    }

    pub fn mime_type(&self) -> &str {
        &self.payload.mime_type
    }

    pub fn is_image(&self) -> bool {
        self.payload.is_image()
    }

    pub fn payload(&self) -> &FilePayload {
        &self.payload
    }

    pub fn preview(&self) -> &Preview {
        &self.preview
    }

    /// Crop state, present only while the entry is being cropped.
    pub fn crop(&self) -> Option<&CropSnapshot> {
        self.crop.as_ref()
    }

    pub fn status(&self) -> EntryStatus {
        self.status
    }

    /// Upload progress in percent (0-100).
    pub fn progress(&self) -> u8 {
        self.progress
    }

    /// Failure message, present only when status is `Error`.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn snapshot(&self) -> EntrySnapshot {
        EntrySnapshot {
            id: self.id,
            name: self.payload.name.clone(),
            size: self.payload.size(),
            mime_type: self.payload.mime_type.clone(),
            preview_url: self.preview.url().map(str::to_string),
            icon: self.preview.icon(),
            status: self.status,
            progress: self.progress,
            error: self.error.clone(),
            cropping: self.crop.is_some(),
        }
    }
}

/// Plain-data copy of an entry for rendering by a host UI.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntrySnapshot {
    pub id: FileId,
    pub name: String,
    pub size: u64,
    pub mime_type: String,
    pub preview_url: Option<String>,
    pub icon: Option<FileIcon>,
    pub status: EntryStatus,
    pub progress: u8,
    pub error: Option<String>,
    pub cropping: bool,
}
