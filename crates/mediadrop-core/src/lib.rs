//! Mediadrop Core - client-side media ingestion pipeline
//!
//! This crate validates dropped or picked files, tracks them as entries with
//! previews, lets the user crop/zoom/rotate images before submission, and
//! drives uploads through a host-supplied sink.
//!
//! The pipeline is single-threaded: shared state is an explicitly passed
//! [`SharedStore`] and every async operation is `!Send`.

pub mod config;
pub mod crop;
pub mod dropzone;
pub mod entry;
pub mod file;
pub mod intake;
pub mod notify;
pub mod preview;
pub mod store;
pub mod upload;
pub mod validate;

pub use config::{ConfigError, CropScope, DropzoneConfig};
pub use crop::{CropError, CropRect, CropSession, CropSnapshot};
pub use dropzone::{Dropzone, DropzoneError};
pub use entry::{EntrySnapshot, EntryStatus, FileEntry};
pub use file::{FileId, FilePayload};
pub use intake::{FileIntake, IntakeError, IntakeOutcome};
pub use notify::{Notification, NotificationKind, Notifier, UploadObserver};
pub use preview::{FileIcon, Preview, PreviewBackend, PreviewGenerator};
pub use store::{FileEntryStore, SharedStore, StoreError};
pub use upload::{BatchReport, SinkError, UploadError, UploadOrchestrator, UploadSink};
pub use validate::{validate, Rejection, ValidationError, ValidationOutcome, ValidationRules};

/// Crate version, exposed to hosts for diagnostics.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
