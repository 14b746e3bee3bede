//! The injected upload function.

use async_trait::async_trait;
use thiserror::Error;

use crate::file::FilePayload;

/// Failure reported by an upload sink; the message is shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SinkError {
    message: String,
}

impl SinkError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<String> for SinkError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for SinkError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Delivers a batch of files somewhere. Opaque to the pipeline: an `Err`
/// fails the whole batch.
#[async_trait(?Send)]
pub trait UploadSink {
    async fn upload(&self, files: Vec<FilePayload>) -> Result<(), SinkError>;
}
