//! Preview environment identity.

use std::fmt;

use crate::config::PreviewIdHasher;
use crate::git::GitRepository;

/// Folder holding the preview templates inside the config repository.
pub const PREVIEW_TEMPLATES_DIR: &str = ".preview-templates";

/// A preview environment of one application, derived from a preview id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewEnvironment {
    /// Application the environment belongs to.
    pub application_name: String,
    /// First 8 hex characters of the preview id's SHA-256 digest.
    pub hashed_preview_id: String,
    /// `<application>-<hash>-preview`, relative to the repository root.
    pub folder_name: String,
}

/// Whether the environment folder is already present in a checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvironmentState {
    /// The folder exists and is reused.
    Exists,
    /// The folder has to be created from the template.
    New,
}

impl PreviewEnvironment {
    /// Derives the environment for `preview_id`.
    #[must_use]
    pub fn new(hasher: &PreviewIdHasher, application_name: &str, preview_id: &str) -> Self {
        let hashed_preview_id = hasher.hash(preview_id);
        let folder_name = format!("{application_name}-{hashed_preview_id}-preview");

        Self {
            application_name: application_name.to_string(),
            hashed_preview_id,
            folder_name,
        }
    }

    /// Template folder this environment is created from.
    #[must_use]
    pub fn template_folder(&self) -> String {
        format!("{PREVIEW_TEMPLATES_DIR}/{}", self.application_name)
    }

    /// Path of a file inside the environment folder, relative to the repository root.
    #[must_use]
    pub fn file(&self, name: &str) -> String {
        format!("{}/{name}", self.folder_name)
    }

    /// Checks the checkout's filesystem. Never cached.
    #[must_use]
    pub fn state(&self, repo: &dyn GitRepository) -> EnvironmentState {
        if repo.resolve_path(&self.folder_name).is_dir() {
            EnvironmentState::Exists
        } else {
            EnvironmentState::New
        }
    }
}

impl fmt::Display for PreviewEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.folder_name)
    }
}
