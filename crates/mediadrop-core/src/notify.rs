//! User-facing notifications and upload observers.
//!
//! Every distinct failure produces exactly one [`Notification`]; a
//! successful batch produces one aggregate notification. How notifications
//! are shown (toasts, console, ...) is up to the host's [`Notifier`].

use std::cell::RefCell;

use serde::Serialize;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
    Info,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::Success => "success",
            NotificationKind::Error => "error",
            NotificationKind::Info => "info",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Info,
            message: message.into(),
        }
    }
}

/// Displays notifications to the user.
pub trait Notifier {
    fn notify(&self, notification: Notification);
}

/// Optional hooks into upload progress and failures.
pub trait UploadObserver {
    /// Batch progress in percent, called on every tick.
    fn on_progress(&self, _percent: u8) {}

    /// Called once per failed batch with the failure message.
    fn on_error(&self, _message: &str) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl UploadObserver for NoopObserver {}

/// Notifier that only writes to the `tracing` log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: Notification) {
        match notification.kind {
            NotificationKind::Error => error!(message = %notification.message, "notification"),
            _ => info!(kind = notification.kind.as_str(), message = %notification.message, "notification"),
        }
    }
}

/// Notifier that keeps every notification, for hosts that render a list.
#[derive(Debug, Default)]
pub struct NotificationLog {
    entries: RefCell<Vec<Notification>>,
}

impl NotificationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<Notification> {
        self.entries.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Remove and return everything recorded so far.
    pub fn take(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.entries.borrow_mut())
    }
}

impl Notifier for NotificationLog {
    fn notify(&self, notification: Notification) {
        self.entries.borrow_mut().push(notification);
    }
}

/// `"1 file"`, `"3 files"`.
pub fn file_count(count: usize) -> String {
    if count == 1 {
        "1 file".to_string()
    } else {
        format!("{} files", count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_records_in_order() {
        let log = NotificationLog::new();
        log.notify(Notification::error("a"));
        log.notify(Notification::success("b"));

        let entries = log.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].kind, NotificationKind::Error);
        assert_eq!(entries[1].message, "b");

        assert_eq!(log.take().len(), 2);
        assert!(log.is_empty());
    }

    #[test]
    fn test_log_notifier_is_a_notifier() {
        let notifier: &dyn Notifier = &LogNotifier;
        notifier.notify(Notification::info("drop ignored"));
        notifier.notify(Notification::error("network down"));
    }

    #[test]
    fn test_file_count() {
        assert_eq!(file_count(1), "1 file");
        assert_eq!(file_count(0), "0 files");
        assert_eq!(file_count(3), "3 files");
    }
}
