//! Upload orchestration.
//!
//! The [`UploadOrchestrator`] moves a batch of entries through
//! `Queued → Uploading → Success | Error`, reporting progress in fixed 10%
//! steps while the injected [`UploadSink`] does the actual transfer.

mod orchestrator;
mod sink;
mod ticker;

pub use orchestrator::{BatchReport, UploadError, UploadOrchestrator, PROGRESS_STEP};
pub use sink::{SinkError, UploadSink};
pub use ticker::{Ticker, YieldTicker};
