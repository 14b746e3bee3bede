//! The authoritative, ordered collection of file entries.
//!
//! The store is the only mutable state shared between intake, the crop
//! editor and the upload orchestrator. It is passed around explicitly as a
//! [`SharedStore`]; borrows are never held across an `.await`.
//!
//! Every path that destroys an entry ([`remove`](FileEntryStore::remove),
//! [`clear_all`](FileEntryStore::clear_all), replacing its content, or
//! dropping the store) revokes the entry's preview.

use std::cell::RefCell;
use std::rc::Rc;

use thiserror::Error;
use tracing::debug;

use crate::crop::CropSnapshot;
use crate::entry::{EntrySnapshot, EntryStatus, FileEntry};
use crate::file::{FileId, FilePayload};
use crate::preview::Preview;

pub type SharedStore = Rc<RefCell<FileEntryStore>>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Store is full ({max} files)")]
    Full { max: usize },

    #[error("No file entry {0}")]
    NotFound(FileId),

    #[error("File entry {id} cannot go from {from:?} to {to:?}")]
    InvalidTransition {
        id: FileId,
        from: EntryStatus,
        to: EntryStatus,
    },
}

#[derive(Debug)]
pub struct FileEntryStore {
    entries: Vec<FileEntry>,
    max_files: usize,
    next_id: u64,
}

impl FileEntryStore {
    pub fn new(max_files: usize) -> Self {
        Self {
            entries: Vec::new(),
            max_files,
            next_id: 1,
        }
    }

    pub fn shared(max_files: usize) -> SharedStore {
        Rc::new(RefCell::new(Self::new(max_files)))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_files(&self) -> usize {
        self.max_files
    }

    pub fn get(&self, id: FileId) -> Option<&FileEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn contains(&self, id: FileId) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FileEntry> {
        self.entries.iter()
    }

    pub fn ids(&self) -> Vec<FileId> {
        self.entries.iter().map(|e| e.id).collect()
    }

    pub fn snapshots(&self) -> Vec<EntrySnapshot> {
        self.entries.iter().map(FileEntry::snapshot).collect()
    }

    /// Add a new queued entry. Fails without inserting when the store holds
    /// `max_files` entries already; the preview is revoked in that case.
    pub fn add(&mut self, payload: FilePayload, preview: Preview) -> Result<FileId, StoreError> {
        if self.entries.len() >= self.max_files {
            preview.revoke();
            return Err(StoreError::Full {
                max: self.max_files,
            });
        }

        let id = FileId(self.next_id);
        self.next_id += 1;
        debug!(%id, name = %payload.name, "added file entry");
        self.entries.push(FileEntry::new(id, payload, preview));
        Ok(id)
    }

    /// Remove an entry, revoking its preview, and hand back its payload.
    pub fn remove(&mut self, id: FileId) -> Result<FilePayload, StoreError> {
        let index = self.index_of(id)?;
        let entry = self.entries.remove(index);
        entry.preview.revoke();
        debug!(%id, "removed file entry");
        Ok(entry.payload)
    }

    /// Remove every entry, revoking all previews. Returns how many were removed.
    pub fn clear_all(&mut self) -> usize {
        let count = self.entries.len();
        for entry in self.entries.drain(..) {
            entry.preview.revoke();
        }
        if count > 0 {
            debug!(count, "cleared file entries");
        }
        count
    }

    /// Swap a queued entry's content (after a crop). The old preview is
    /// revoked and the original bytes are dropped.
    pub fn replace_content(
        &mut self,
        id: FileId,
        payload: FilePayload,
        preview: Preview,
    ) -> Result<(), StoreError> {
        let entry = self.entry_mut(id)?;
        if entry.status != EntryStatus::Queued {
            preview.revoke();
            return Err(StoreError::InvalidTransition {
                id,
                from: entry.status,
                to: EntryStatus::Queued,
            });
        }

        entry.preview.revoke();
        debug!(%id, old = %entry.payload.name, new = %payload.name, "replaced file content");
        entry.payload = payload;
        entry.preview = preview;
        entry.crop = None;
        Ok(())
    }

    /// Record the crop state of an entry being edited.
    pub fn set_crop(&mut self, id: FileId, snapshot: CropSnapshot) -> Result<(), StoreError> {
        self.entry_mut(id)?.crop = Some(snapshot);
        Ok(())
    }

    /// Forget the crop state (session committed or cancelled).
    pub fn clear_crop(&mut self, id: FileId) -> Result<(), StoreError> {
        self.entry_mut(id)?.crop = None;
        Ok(())
    }

    /// Move a queued (or failed, for a manual retry) entry to `Uploading`
    /// at 0% and return a copy of its payload.
    pub fn start_upload(&mut self, id: FileId) -> Result<FilePayload, StoreError> {
        let entry = self.entry_mut(id)?;
        if !matches!(entry.status, EntryStatus::Queued | EntryStatus::Error) {
            return Err(StoreError::InvalidTransition {
                id,
                from: entry.status,
                to: EntryStatus::Uploading,
            });
        }

        entry.status = EntryStatus::Uploading;
        entry.progress = 0;
        entry.error = None;
        entry.crop = None;
        Ok(entry.payload.clone())
    }

    /// Raise an uploading entry's progress. Values above 100 are clamped and
    /// progress never moves backwards. Returns the stored value.
    pub fn set_progress(&mut self, id: FileId, percent: u8) -> Result<u8, StoreError> {
        let entry = self.uploading_mut(id, EntryStatus::Uploading)?;
        entry.progress = entry.progress.max(percent.min(100));
        Ok(entry.progress)
    }

    pub fn mark_success(&mut self, id: FileId) -> Result<(), StoreError> {
        let entry = self.uploading_mut(id, EntryStatus::Success)?;
        entry.status = EntryStatus::Success;
        entry.progress = 100;
        Ok(())
    }

    pub fn mark_error(&mut self, id: FileId, message: impl Into<String>) -> Result<(), StoreError> {
        let entry = self.uploading_mut(id, EntryStatus::Error)?;
        entry.status = EntryStatus::Error;
        entry.error = Some(message.into());
        Ok(())
    }

    fn index_of(&self, id: FileId) -> Result<usize, StoreError> {
        self.entries
            .iter()
            .position(|e| e.id == id)
            .ok_or(StoreError::NotFound(id))
    }

    fn entry_mut(&mut self, id: FileId) -> Result<&mut FileEntry, StoreError> {
        let index = self.index_of(id)?;
        Ok(&mut self.entries[index])
    }

    fn uploading_mut(&mut self, id: FileId, to: EntryStatus) -> Result<&mut FileEntry, StoreError> {
        let entry = self.entry_mut(id)?;
        if entry.status != EntryStatus::Uploading {
            return Err(StoreError::InvalidTransition {
                id,
                from: entry.status,
                to,
            });
        }
        Ok(entry)
    }
}

impl Drop for FileEntryStore {
    fn drop(&mut self) {
        self.clear_all();
    }
}
