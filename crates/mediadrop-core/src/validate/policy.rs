//! The validation policy itself.

use serde::Serialize;
use thiserror::Error;

use super::AcceptPattern;
use crate::file::{format_bytes, FilePayload};

/// Why a candidate file was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
pub enum ValidationError {
    #[error("file exceeds the maximum size")]
    SizeExceeded,

    #[error("file type is not accepted")]
    InvalidType,

    #[error("too many files")]
    CountExceeded,
}

/// Constraints applied to every candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationRules {
    pub max_size_bytes: u64,
    pub max_files: usize,
    /// Empty means every type is accepted.
    pub accepted: Vec<AcceptPattern>,
    pub allow_multiple: bool,
}

impl ValidationRules {
    pub fn accepts_type(&self, file: &FilePayload) -> bool {
        self.accepted.is_empty() || self.accepted.iter().any(|p| p.matches(file))
    }
}

/// A refused candidate together with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub file: FilePayload,
    pub reason: ValidationError,
}

impl Rejection {
    /// User-facing message naming the file and the specific reason.
    pub fn message(&self, rules: &ValidationRules) -> String {
        let name = &self.file.name;
        match self.reason {
            ValidationError::SizeExceeded => format!(
                "{} is too large ({}); the maximum size is {}",
                name,
                format_bytes(self.file.size()),
                format_bytes(rules.max_size_bytes)
            ),
            ValidationError::InvalidType => {
                if self.file.mime_type.is_empty() {
                    format!("{} is not an accepted file type", name)
                } else {
                    format!("{} is not an accepted file type ({})", name, self.file.mime_type)
                }
            }
            ValidationError::CountExceeded if !rules.allow_multiple => {
                format!("{} was not added: only one file can be added at a time", name)
            }
            ValidationError::CountExceeded => format!(
                "{} was not added: at most {} {} allowed",
                name,
                rules.max_files,
                if rules.max_files == 1 { "file is" } else { "files are" }
            ),
        }
    }
}

/// Result of validating one batch of candidates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationOutcome {
    pub accepted: Vec<FilePayload>,
    pub rejected: Vec<Rejection>,
}

/// Apply `rules` to `candidates` in submission order.
///
/// Per-file checks (size, then type) run first. A file passing them is
/// accepted only while `current_count + accepted` stays within `max_files`
/// (and, without `allow_multiple`, only the first such file is taken);
/// the rest are rejected with [`ValidationError::CountExceeded`].
pub fn validate(
    rules: &ValidationRules,
    candidates: Vec<FilePayload>,
    current_count: usize,
) -> ValidationOutcome {
    let mut outcome = ValidationOutcome::default();

    for file in candidates {
        let reason = if file.size() > rules.max_size_bytes {
            Some(ValidationError::SizeExceeded)
        } else if !rules.accepts_type(&file) {
            Some(ValidationError::InvalidType)
        } else if current_count + outcome.accepted.len() >= rules.max_files
            || (!rules.allow_multiple && !outcome.accepted.is_empty())
        {
            Some(ValidationError::CountExceeded)
        } else {
            None
        };

        match reason {
            Some(reason) => outcome.rejected.push(Rejection { file, reason }),
            None => outcome.accepted.push(file),
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::parse_accept;

    fn rules(max_size: u64, max_files: usize, accept: &str) -> ValidationRules {
        ValidationRules {
            max_size_bytes: max_size,
            max_files,
            accepted: parse_accept(accept).unwrap(),
            allow_multiple: true,
        }
    }

    fn file(name: &str, mime: &str, size: usize) -> FilePayload {
        FilePayload::new(name, mime, vec![0u8; size])
    }

    #[test]
    fn test_accepts_valid_files_in_order() {
        let rules = rules(100, 5, "image/*");
        let outcome = validate(
            &rules,
            vec![file("a.png", "image/png", 10), file("b.jpg", "image/jpeg", 20)],
            0,
        );
        assert_eq!(outcome.rejected.len(), 0);
        let names: Vec<_> = outcome.accepted.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["a.png", "b.jpg"]);
    }

    #[test]
    fn test_size_exceeded() {
        let rules = rules(100, 5, "image/*");
        let outcome = validate(&rules, vec![file("big.png", "image/png", 101)], 0);
        assert!(outcome.accepted.is_empty());
        assert_eq!(outcome.rejected[0].reason, ValidationError::SizeExceeded);
    }

    #[test]
    fn test_size_at_limit_is_accepted() {
        let rules = rules(100, 5, "image/*");
        let outcome = validate(&rules, vec![file("ok.png", "image/png", 100)], 0);
        assert_eq!(outcome.accepted.len(), 1);
    }

    #[test]
    fn test_invalid_type() {
        let rules = rules(100, 5, "image/*,.pdf");
        let outcome = validate(
            &rules,
            vec![file("notes.txt", "text/plain", 1), file("doc.pdf", "", 1)],
            0,
        );
        assert_eq!(outcome.rejected.len(), 1);
        assert_eq!(outcome.rejected[0].reason, ValidationError::InvalidType);
        assert_eq!(outcome.accepted[0].name, "doc.pdf");
    }

    #[test]
    fn test_size_checked_before_type() {
        let rules = rules(10, 5, "image/*");
        let outcome = validate(&rules, vec![file("huge.txt", "text/plain", 11)], 0);
        assert_eq!(outcome.rejected[0].reason, ValidationError::SizeExceeded);
    }

    #[test]
    fn test_count_overflow_rejects_later_candidates() {
        let rules = rules(100, 3, "");
        let outcome = validate(
            &rules,
            vec![
                file("a", "x/y", 1),
                file("b", "x/y", 1),
                file("c", "x/y", 1),
            ],
            1,
        );
        let names: Vec<_> = outcome.accepted.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(outcome.rejected.len(), 1);
        assert_eq!(outcome.rejected[0].file.name, "c");
        assert_eq!(outcome.rejected[0].reason, ValidationError::CountExceeded);
    }

    #[test]
    fn test_invalid_files_do_not_consume_count() {
        let rules = rules(100, 1, "image/*");
        let outcome = validate(
            &rules,
            vec![file("a.txt", "text/plain", 1), file("b.png", "image/png", 1)],
            0,
        );
        assert_eq!(outcome.accepted.len(), 1);
        assert_eq!(outcome.accepted[0].name, "b.png");
    }

    #[test]
    fn test_single_file_mode() {
        let mut rules = rules(100, 5, "image/*");
        rules.allow_multiple = false;
        let outcome = validate(
            &rules,
            vec![file("a.png", "image/png", 1), file("b.png", "image/png", 1)],
            0,
        );
        assert_eq!(outcome.accepted.len(), 1);
        assert_eq!(outcome.rejected[0].reason, ValidationError::CountExceeded);
        assert!(outcome.rejected[0].message(&rules).contains("only one file"));
    }

    #[test]
    fn test_store_already_full() {
        let rules = rules(100, 2, "image/*");
        let outcome = validate(&rules, vec![file("c.png", "image/png", 1)], 2);
        assert!(outcome.accepted.is_empty());
        assert_eq!(outcome.rejected[0].reason, ValidationError::CountExceeded);
    }

    #[test]
    fn test_rejection_messages_name_reason() {
        let rules = rules(5 * 1024 * 1024, 2, "image/*");

        let big = Rejection {
            file: file("big.png", "image/png", 0),
            reason: ValidationError::SizeExceeded,
        };
        assert!(big.message(&rules).contains("big.png is too large"));
        assert!(big.message(&rules).contains("5 MB"));

        let wrong = Rejection {
            file: file("a.txt", "text/plain", 0),
            reason: ValidationError::InvalidType,
        };
        assert_eq!(
            wrong.message(&rules),
            "a.txt is not an accepted file type (text/plain)"
        );

        let extra = Rejection {
            file: file("c.png", "image/png", 0),
            reason: ValidationError::CountExceeded,
        };
        assert_eq!(
            extra.message(&rules),
            "c.png was not added: at most 2 files are allowed"
        );
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::validate::parse_accept;
    use proptest::prelude::*;

    fn candidate_strategy() -> impl Strategy<Value = (usize, bool)> {
        // (size, is_image)
        (0usize..=200, any::<bool>())
    }

    fn build(candidates: &[(usize, bool)]) -> Vec<FilePayload> {
        candidates
            .iter()
            .enumerate()
            .map(|(i, (size, image))| {
                let mime = if *image { "image/png" } else { "text/plain" };
                FilePayload::new(format!("file-{}", i), mime, vec![0u8; *size])
            })
            .collect()
    }

    proptest! {
        /// Property: the accepted set never pushes the store past max_files.
        #[test]
        fn prop_never_exceeds_max_files(
            candidates in prop::collection::vec(candidate_strategy(), 0..12),
            max_files in 1usize..=6,
            current in 0usize..=6,
            multiple in any::<bool>(),
        ) {
            let rules = ValidationRules {
                max_size_bytes: 100,
                max_files,
                accepted: parse_accept("image/*").unwrap(),
                allow_multiple: multiple,
            };
            let count = candidates.len();
            let outcome = validate(&rules, build(&candidates), current);

            prop_assert!(current + outcome.accepted.len() <= max_files.max(current));
            prop_assert_eq!(outcome.accepted.len() + outcome.rejected.len(), count);
            if !multiple {
                prop_assert!(outcome.accepted.len() <= 1);
            }
        }

        /// Property: oversized files are always rejected with SizeExceeded.
        #[test]
        fn prop_oversized_always_rejected(
            candidates in prop::collection::vec(candidate_strategy(), 0..12),
            max_size in 0u64..=200,
        ) {
            let rules = ValidationRules {
                max_size_bytes: max_size,
                max_files: 100,
                accepted: Vec::new(),
                allow_multiple: true,
            };
            let outcome = validate(&rules, build(&candidates), 0);

            for file in &outcome.accepted {
                prop_assert!(file.size() <= max_size);
            }
            for rejection in &outcome.rejected {
                if rejection.file.size() > max_size {
                    prop_assert_eq!(rejection.reason, ValidationError::SizeExceeded);
                }
            }
            let oversized = candidates.iter().filter(|(s, _)| *s as u64 > max_size).count();
            let size_rejections = outcome
                .rejected
                .iter()
                .filter(|r| r.reason == ValidationError::SizeExceeded)
                .count();
            prop_assert_eq!(oversized, size_rejections);
        }
    }
}
