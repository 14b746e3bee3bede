//! Batch upload driver.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use futures::future::{AbortHandle, Abortable};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::sink::{SinkError, UploadSink};
use super::ticker::{Ticker, YieldTicker};
use crate::file::{FileId, FilePayload};
use crate::notify::{file_count, NoopObserver, Notification, Notifier, UploadObserver};
use crate::store::{SharedStore, StoreError};

/// Progress increment between ticks, in percent.
pub const PROGRESS_STEP: u8 = 10;

const CANCELLED_MESSAGE: &str = "Upload cancelled";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    #[error("An upload is already in progress")]
    Busy,

    #[error("Nothing to upload")]
    EmptyBatch,

    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error("Upload cancelled")]
    Cancelled,
}

/// Entries that reached `Success` in one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub uploaded: Vec<FileId>,
}

/// Drives batches of entries through the upload sink, one batch at a time.
///
/// All entries of a batch share one progress cadence (0, 10, ..., 100) and
/// one outcome: they all end `Success` or all end `Error`, and the user gets
/// one notification either way. Terminal states are set only after the sink
/// settles (or the batch is cancelled).
pub struct UploadOrchestrator {
    store: SharedStore,
    sink: Rc<dyn UploadSink>,
    notifier: Rc<dyn Notifier>,
    ticker: Rc<dyn Ticker>,
    observer: Rc<dyn UploadObserver>,
    in_flight: Cell<bool>,
    abort: RefCell<Option<AbortHandle>>,
}

/// Clears the in-flight state however `submit` exits.
struct InFlightGuard<'a> {
    flag: &'a Cell<bool>,
    abort: &'a RefCell<Option<AbortHandle>>,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.abort.borrow_mut().take();
        self.flag.set(false);
    }
}

impl UploadOrchestrator {
    pub fn new(store: SharedStore, sink: Rc<dyn UploadSink>, notifier: Rc<dyn Notifier>) -> Self {
        Self {
            store,
            sink,
            notifier,
            ticker: Rc::new(YieldTicker),
            observer: Rc::new(NoopObserver),
            in_flight: Cell::new(false),
            abort: RefCell::new(None),
        }
    }

    pub fn with_ticker(mut self, ticker: Rc<dyn Ticker>) -> Self {
        self.set_ticker(ticker);
        self
    }

    pub fn with_observer(mut self, observer: Rc<dyn UploadObserver>) -> Self {
        self.set_observer(observer);
        self
    }

    pub fn set_ticker(&mut self, ticker: Rc<dyn Ticker>) {
        self.ticker = ticker;
    }

    pub fn set_observer(&mut self, observer: Rc<dyn UploadObserver>) {
        self.observer = observer;
    }

    pub fn is_uploading(&self) -> bool {
        self.in_flight.get()
    }

    /// Abort the batch in flight. Returns false when nothing is uploading.
    pub fn cancel(&self) -> bool {
        match self.abort.borrow().as_ref() {
            Some(handle) => {
                info!("cancelling upload");
                handle.abort();
                true
            }
            None => false,
        }
    }

    /// Upload `batch` and wait for the outcome.
    ///
    /// Ids that are missing or not uploadable (already uploading or
    /// succeeded) are skipped. Fails with [`UploadError::Busy`] while another
    /// batch is in flight, leaving `batch` untouched.
    pub async fn submit(&self, batch: &[FileId]) -> Result<BatchReport, UploadError> {
        if self.in_flight.get() {
            warn!(files = batch.len(), "upload refused, another batch is in flight");
            return Err(UploadError::Busy);
        }

        let (ids, files) = self.begin(batch);
        if ids.is_empty() {
            return Err(UploadError::EmptyBatch);
        }

        self.in_flight.set(true);
        let _guard = InFlightGuard {
            flag: &self.in_flight,
            abort: &self.abort,
        };
        let (handle, registration) = AbortHandle::new_pair();
        *self.abort.borrow_mut() = Some(handle);

        info!(files = ids.len(), "upload started");
        match Abortable::new(self.transfer(&ids, files), registration).await {
            Ok(Ok(())) => {
                self.finish_success(&ids);
                Ok(BatchReport { uploaded: ids })
            }
            Ok(Err(e)) => {
                self.finish_error(&ids, e.message());
                Err(UploadError::Sink(e))
            }
            Err(_aborted) => {
                self.finish_error(&ids, CANCELLED_MESSAGE);
                Err(UploadError::Cancelled)
            }
        }
    }

    fn begin(&self, batch: &[FileId]) -> (Vec<FileId>, Vec<FilePayload>) {
        let mut store = self.store.borrow_mut();
        let mut ids = Vec::with_capacity(batch.len());
        let mut files = Vec::with_capacity(batch.len());

        for &id in batch {
            if ids.contains(&id) {
                continue;
            }
            match store.start_upload(id) {
                Ok(payload) => {
                    ids.push(id);
                    files.push(payload);
                }
                Err(e) => warn!(%id, error = %e, "skipping entry"),
            }
        }
        (ids, files)
    }

    async fn transfer(&self, ids: &[FileId], files: Vec<FilePayload>) -> Result<(), SinkError> {
        let mut percent = 0u8;
        loop {
            self.report_progress(ids, percent);
            if percent >= 100 {
                break;
            }
            self.ticker.tick().await;
            percent = percent.saturating_add(PROGRESS_STEP).min(100);
        }

        self.sink.upload(files).await
    }

    fn report_progress(&self, ids: &[FileId], percent: u8) {
        {
            let mut store = self.store.borrow_mut();
            for &id in ids {
                if let Err(e) = store.set_progress(id, percent) {
                    log_stale(id, &e);
                }
            }
        }
        self.observer.on_progress(percent);
    }

    fn finish_success(&self, ids: &[FileId]) {
        {
            let mut store = self.store.borrow_mut();
            for &id in ids {
                if let Err(e) = store.mark_success(id) {
                    log_stale(id, &e);
                }
            }
        }
        info!(files = ids.len(), "upload finished");
        self.notifier
            .notify(Notification::success(format!("Uploaded {}", file_count(ids.len()))));
    }

    fn finish_error(&self, ids: &[FileId], message: &str) {
        {
            let mut store = self.store.borrow_mut();
            for &id in ids {
                if let Err(e) = store.mark_error(id, message) {
                    log_stale(id, &e);
                }
            }
        }
        warn!(files = ids.len(), error = message, "upload failed");
        self.notifier.notify(Notification::error(message));
        self.observer.on_error(message);
    }
}

/// Entries removed mid-upload stay removed; their updates are dropped.
fn log_stale(id: FileId, error: &StoreError) {
    debug!(%id, %error, "ignoring update for entry");
}
