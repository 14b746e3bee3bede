//! File payloads and identifiers shared across the pipeline.

use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Stable identifier of a [`FileEntry`](crate::entry::FileEntry) within its store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(pub u64);

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A user-submitted file: name, declared MIME type and raw content.
///
/// Content is held in a [`Bytes`] buffer so handing the payload to an upload
/// sink does not copy the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePayload {
    pub name: String,
    pub mime_type: String,
    pub bytes: Bytes,
}

impl FilePayload {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Size of the content in bytes.
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// True for `image/*` MIME types.
    pub fn is_image(&self) -> bool {
        is_image_mime(&self.mime_type)
    }

    /// Lowercased file extension including the leading dot, e.g. `.pdf`.
    pub fn extension(&self) -> Option<String> {
        let (stem, ext) = self.name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(format!(".{}", ext.to_ascii_lowercase()))
    }
}

/// Strip MIME parameters (`; charset=...`) and lowercase the essence.
pub fn mime_essence(mime: &str) -> String {
    mime.split(';').next().unwrap_or("").trim().to_ascii_lowercase()
}

pub fn is_image_mime(mime: &str) -> bool {
    mime_essence(mime).starts_with("image/")
}

/// Format a byte count for user-facing messages (`"5 MB"`, `"1.5 KB"`).
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];

    if bytes < 1024 {
        return format!("{} B", bytes);
    }

    let mut value = bytes as f64;
    let mut unit = "B";
    for next in UNITS {
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
        unit = next;
    }

    let rounded = (value * 10.0).round() / 10.0;
    if rounded.fract().abs() < f64::EPSILON {
        format!("{} {}", rounded as u64, unit)
    } else {
        format!("{:.1} {}", rounded, unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_size_and_kind() {
        let file = FilePayload::new("photo.JPG", "image/jpeg", vec![0u8; 42]);
        assert_eq!(file.size(), 42);
        assert!(file.is_image());
        assert_eq!(file.extension().as_deref(), Some(".jpg"));
    }

    #[test]
    fn test_extension_edge_cases() {
        assert_eq!(FilePayload::new("README", "text/plain", vec![]).extension(), None);
        assert_eq!(FilePayload::new(".bashrc", "text/plain", vec![]).extension(), None);
        assert_eq!(FilePayload::new("a.tar.GZ", "application/gzip", vec![]).extension().as_deref(), Some(".gz"));
    }

    #[test]
    fn test_mime_essence_strips_parameters() {
        assert_eq!(mime_essence("Text/Plain; charset=utf-8"), "text/plain");
        assert!(is_image_mime("IMAGE/PNG"));
        assert!(!is_image_mime("application/pdf"));
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5 MB");
        assert_eq!(format_bytes(10 * 1024 * 1024), "10 MB");
    }

    #[test]
    fn test_file_id_display() {
        assert_eq!(FileId(7).to_string(), "#7");
    }
}
