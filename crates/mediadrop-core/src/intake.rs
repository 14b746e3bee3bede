//! Turns dropped or picked files into queued entries.

use std::fmt;
use std::rc::Rc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{ConfigError, CropScope, DropzoneConfig};
use crate::file::{FileId, FilePayload};
use crate::notify::{Notification, Notifier};
use crate::preview::PreviewGenerator;
use crate::store::SharedStore;
use crate::validate::{validate, Rejection, ValidationRules};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IntakeError {
    #[error("File drops are disabled")]
    Disabled,
}

/// Where the accepted files of one drop went.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntakeOutcome {
    /// Every new entry, in drop order.
    pub accepted: Vec<FileId>,
    /// Entries waiting for the crop editor.
    pub to_crop: Vec<FileId>,
    /// Entries ready for upload as they are.
    pub to_upload: Vec<FileId>,
    pub rejected: Vec<Rejection>,
}

/// Applies the validation policy to incoming files and creates their entries.
pub struct FileIntake {
    config: DropzoneConfig,
    rules: ValidationRules,
    store: SharedStore,
    previews: PreviewGenerator,
    notifier: Rc<dyn Notifier>,
}

impl FileIntake {
    pub fn new(
        config: DropzoneConfig,
        store: SharedStore,
        previews: PreviewGenerator,
        notifier: Rc<dyn Notifier>,
    ) -> Result<Self, ConfigError> {
        let rules = config.rules()?;
        Ok(Self {
            config,
            rules,
            store,
            previews,
            notifier,
        })
    }

    pub fn config(&self) -> &DropzoneConfig {
        &self.config
    }

    pub fn rules(&self) -> &ValidationRules {
        &self.rules
    }

    pub fn previews(&self) -> &PreviewGenerator {
        &self.previews
    }

    /// Validate `files` against the current store contents, add the
    /// accepted ones and decide which of them go through the crop editor.
    ///
    /// Each rejected file produces one error notification.
    pub fn receive(&self, files: Vec<FilePayload>) -> Result<IntakeOutcome, IntakeError> {
        if self.config.disabled {
            info!(files = files.len(), "drop ignored, dropzone is disabled");
            self.notifier
                .notify(Notification::info(IntakeError::Disabled.to_string()));
            return Err(IntakeError::Disabled);
        }

        let current = self.store.borrow().len();
        let validated = validate(&self.rules, files, current);

        let mut outcome = IntakeOutcome::default();
        for file in validated.accepted {
            let is_image = file.is_image();
            let preview = self.previews.generate(&file);
            let added = self.store.borrow_mut().add(file, preview);
            match added {
                Ok(id) => {
                    if is_image && self.wants_crop(&outcome) {
                        outcome.to_crop.push(id);
                    } else {
                        outcome.to_upload.push(id);
                    }
                    outcome.accepted.push(id);
                }
                Err(e) => warn!(error = %e, "accepted file could not be stored"),
            }
        }

        for rejection in &validated.rejected {
            warn!(name = %rejection.file.name, reason = %rejection.reason, "file rejected");
            self.notifier
                .notify(Notification::error(rejection.message(&self.rules)));
        }
        outcome.rejected = validated.rejected;

        debug!(
            accepted = outcome.accepted.len(),
            crop = outcome.to_crop.len(),
            rejected = outcome.rejected.len(),
            "drop received"
        );
        Ok(outcome)
    }

    fn wants_crop(&self, so_far: &IntakeOutcome) -> bool {
        if !self.config.enable_crop {
            return false;
        }
        match self.config.crop_scope {
            CropScope::FirstImage => so_far.to_crop.is_empty(),
            CropScope::EveryImage => true,
        }
    }
}

impl fmt::Debug for FileIntake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileIntake")
            .field("config", &self.config)
            .field("rules", &self.rules)
            .finish_non_exhaustive()
    }
}
