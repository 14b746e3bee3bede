//! Parsing and matching of `accept` patterns.

use crate::config::ConfigError;
use crate::file::{mime_essence, FilePayload};

/// One entry of a comma-separated `accept` list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcceptPattern {
    /// `*` or `*/*`.
    Any,
    /// `image/*`; holds the top-level type (`image`).
    MimeWildcard(String),
    /// An exact MIME type such as `application/pdf`.
    Mime(String),
    /// A file-name extension such as `.pdf`, lowercased.
    Extension(String),
}

impl AcceptPattern {
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let pattern = raw.trim().to_ascii_lowercase();

        if pattern == "*" || pattern == "*/*" {
            return Ok(AcceptPattern::Any);
        }

        if let Some(ext) = pattern.strip_prefix('.') {
            if ext.is_empty() || ext.contains('/') {
                return Err(ConfigError::InvalidAcceptPattern(raw.trim().to_string()));
            }
            return Ok(AcceptPattern::Extension(pattern));
        }

        match pattern.split_once('/') {
            Some((top, "*")) if !top.is_empty() && top != "*" => {
                Ok(AcceptPattern::MimeWildcard(top.to_string()))
            }
            Some((top, sub)) if !top.is_empty() && !sub.is_empty() && !sub.contains('/') => {
                Ok(AcceptPattern::Mime(pattern))
            }
            _ => Err(ConfigError::InvalidAcceptPattern(raw.trim().to_string())),
        }
    }

    pub fn matches(&self, file: &FilePayload) -> bool {
        match self {
            AcceptPattern::Any => true,
            AcceptPattern::MimeWildcard(top) => mime_essence(&file.mime_type)
                .split_once('/')
                .is_some_and(|(file_top, _)| file_top == top),
            AcceptPattern::Mime(mime) => mime_essence(&file.mime_type) == *mime,
            AcceptPattern::Extension(ext) => file.extension().as_deref() == Some(ext.as_str()),
        }
    }
}

/// Parse a comma-separated `accept` list. Blank entries are skipped, so an
/// empty string yields an empty list (which accepts every file).
pub fn parse_accept(list: &str) -> Result<Vec<AcceptPattern>, ConfigError> {
    list.split(',')
        .filter(|part| !part.trim().is_empty())
        .map(AcceptPattern::parse)
        .collect()
}
