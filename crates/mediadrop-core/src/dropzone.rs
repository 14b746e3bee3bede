//! The dropzone controller: intake, crop queue and uploads behind one API.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{ConfigError, DropzoneConfig};
use crate::crop::{CropError, CropSession};
use crate::entry::EntrySnapshot;
use crate::file::{FileId, FilePayload};
use crate::intake::{FileIntake, IntakeError, IntakeOutcome};
use crate::notify::{Notification, Notifier, UploadObserver};
use crate::preview::{PreviewBackend, PreviewGenerator};
use crate::store::{FileEntryStore, SharedStore, StoreError};
use crate::upload::{BatchReport, Ticker, UploadError, UploadOrchestrator, UploadSink};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DropzoneError {
    #[error(transparent)]
    Intake(#[from] IntakeError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Crop(#[from] CropError),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error("File entry {0} is not waiting for a crop")]
    NotPendingCrop(FileId),
}

/// Owns the entry store and wires intake, cropping and uploads together.
///
/// Images routed to the crop editor wait in a FIFO queue until the host
/// opens, commits or cancels their session. Dropping the dropzone revokes
/// every preview still held.
pub struct Dropzone {
    intake: FileIntake,
    store: SharedStore,
    orchestrator: UploadOrchestrator,
    notifier: Rc<dyn Notifier>,
    pending_crops: RefCell<VecDeque<FileId>>,
}

impl Dropzone {
    pub fn new(
        config: DropzoneConfig,
        previews: Rc<dyn PreviewBackend>,
        sink: Rc<dyn UploadSink>,
        notifier: Rc<dyn Notifier>,
    ) -> Result<Self, ConfigError> {
        let store = FileEntryStore::shared(config.max_files);
        let intake = FileIntake::new(
            config,
            Rc::clone(&store),
            PreviewGenerator::new(previews),
            Rc::clone(&notifier),
        )?;
        let orchestrator = UploadOrchestrator::new(Rc::clone(&store), sink, Rc::clone(&notifier));

        Ok(Self {
            intake,
            store,
            orchestrator,
            notifier,
            pending_crops: RefCell::new(VecDeque::new()),
        })
    }

    pub fn with_ticker(mut self, ticker: Rc<dyn Ticker>) -> Self {
        self.orchestrator.set_ticker(ticker);
        self
    }

    pub fn with_observer(mut self, observer: Rc<dyn UploadObserver>) -> Self {
        self.orchestrator.set_observer(observer);
        self
    }

    pub fn config(&self) -> &DropzoneConfig {
        self.intake.config()
    }

    pub fn store(&self) -> SharedStore {
        Rc::clone(&self.store)
    }

    pub fn snapshots(&self) -> Vec<EntrySnapshot> {
        self.store.borrow().snapshots()
    }

    pub fn is_uploading(&self) -> bool {
        self.orchestrator.is_uploading()
    }

    /// Entries waiting for the crop editor, oldest first.
    pub fn pending_crops(&self) -> Vec<FileId> {
        self.pending_crops.borrow().iter().copied().collect()
    }

    pub fn next_crop(&self) -> Option<FileId> {
        self.pending_crops.borrow().front().copied()
    }

    /// Take in a drop. Accepted files bound for the crop editor are queued;
    /// the rest are uploaded right away and this resolves when that batch
    /// settles. Its outcome is visible in the store and notifications.
    pub async fn drop_files(&self, files: Vec<FilePayload>) -> Result<IntakeOutcome, DropzoneError> {
        if self.orchestrator.is_uploading() {
            self.refuse_busy();
            return Err(UploadError::Busy.into());
        }

        let outcome = self.intake.receive(files)?;
        self.pending_crops
            .borrow_mut()
            .extend(outcome.to_crop.iter().copied());

        if !outcome.to_upload.is_empty() {
            if let Err(e) = self.upload(&outcome.to_upload).await {
                debug!(error = %e, "direct upload did not succeed");
            }
        }
        Ok(outcome)
    }

    /// Decode a queued entry and start a crop session for it. On failure
    /// the entry stays queued and pending, and the user is notified.
    ///
    /// Only one session is edited at a time: opening one closes whichever
    /// other entry was being cropped, which stays queued for later.
    pub fn open_crop(&self, id: FileId) -> Result<CropSession, DropzoneError> {
        self.ensure_pending(id)?;
        let payload = self.payload_of(id)?;

        let session = match CropSession::open(&payload, self.config().aspect_ratio) {
            Ok(session) => session,
            Err(e) => {
                warn!(%id, error = %e, "crop session could not be opened");
                self.notifier.notify(Notification::error(e.to_string()));
                return Err(e.into());
            }
        };
        let others: Vec<FileId> = self
            .pending_crops
            .borrow()
            .iter()
            .copied()
            .filter(|&pending| pending != id)
            .collect();
        let mut store = self.store.borrow_mut();
        for other in others {
            if store.get(other).is_some_and(|entry| entry.crop().is_some()) {
                debug!(id = %other, "closing previous crop session");
                store.clear_crop(other)?;
            }
        }
        store.set_crop(id, session.snapshot())?;
        Ok(session)
    }

    /// Close the editor for an entry without deciding on it. The entry
    /// stays queued and pending so it can be opened again.
    pub fn close_crop(&self, id: FileId) -> Result<(), DropzoneError> {
        self.ensure_pending(id)?;
        self.store.borrow_mut().clear_crop(id)?;
        Ok(())
    }

    /// Record the session's current state on its entry.
    pub fn sync_crop(&self, id: FileId, session: &CropSession) -> Result<(), DropzoneError> {
        self.ensure_pending(id)?;
        self.store.borrow_mut().set_crop(id, session.snapshot())?;
        Ok(())
    }

    /// Replace the entry's content with the cropped output and upload it.
    ///
    /// A failed render, or an upload already in flight, leaves the entry
    /// queued and pending. Once the content is replaced, the upload outcome
    /// is returned as is.
    pub async fn commit_crop(
        &self,
        id: FileId,
        session: &CropSession,
        timestamp_ms: u64,
    ) -> Result<BatchReport, DropzoneError> {
        self.ensure_pending(id)?;
        if self.orchestrator.is_uploading() {
            self.refuse_busy();
            return Err(UploadError::Busy.into());
        }

        let cropped = match session.commit(timestamp_ms) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(%id, error = %e, "crop commit failed");
                self.notifier.notify(Notification::error(e.to_string()));
                return Err(e.into());
            }
        };

        let preview = self.intake.previews().generate(&cropped);
        self.store.borrow_mut().replace_content(id, cropped, preview)?;
        self.forget_pending(id);

        self.upload(&[id]).await
    }

    /// Discard the crop session. The entry stays queued and untouched.
    pub fn cancel_crop(&self, id: FileId) -> Result<(), DropzoneError> {
        self.ensure_pending(id)?;
        self.forget_pending(id);
        self.store.borrow_mut().clear_crop(id)?;
        debug!(%id, "crop cancelled");
        Ok(())
    }

    /// Upload entries as one batch.
    pub async fn upload(&self, ids: &[FileId]) -> Result<BatchReport, DropzoneError> {
        match self.orchestrator.submit(ids).await {
            Ok(report) => Ok(report),
            Err(UploadError::Busy) => {
                self.refuse_busy();
                Err(UploadError::Busy.into())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn cancel_upload(&self) -> bool {
        self.orchestrator.cancel()
    }

    pub fn remove(&self, id: FileId) -> Result<(), DropzoneError> {
        self.store.borrow_mut().remove(id)?;
        self.forget_pending(id);
        Ok(())
    }

    pub fn clear_all(&self) -> usize {
        self.pending_crops.borrow_mut().clear();
        self.store.borrow_mut().clear_all()
    }

    fn ensure_pending(&self, id: FileId) -> Result<(), DropzoneError> {
        if self.pending_crops.borrow().contains(&id) {
            Ok(())
        } else {
            Err(DropzoneError::NotPendingCrop(id))
        }
    }

    fn forget_pending(&self, id: FileId) {
        self.pending_crops.borrow_mut().retain(|&pending| pending != id);
    }

    fn payload_of(&self, id: FileId) -> Result<FilePayload, StoreError> {
        self.store
            .borrow()
            .get(id)
            .map(|entry| entry.payload().clone())
            .ok_or(StoreError::NotFound(id))
    }

    fn refuse_busy(&self) {
        warn!("refusing new work while an upload is in flight");
        self.notifier
            .notify(Notification::error(UploadError::Busy.to_string()));
    }
}

impl Drop for Dropzone {
    fn drop(&mut self) {
        if let Ok(mut store) = self.store.try_borrow_mut() {
            store.clear_all();
        }
    }
}

impl fmt::Debug for Dropzone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dropzone")
            .field("intake", &self.intake)
            .field("pending_crops", &self.pending_crops)
            .finish_non_exhaustive()
    }
}
