//! Configuration parser for `.gitops.config.yaml`.
//!
//! A missing file, a YAML error, or an absent required key all surface as
//! [`GitOpsError::Configuration`]. Nothing is defaulted.

use crate::error::{GitOpsError, Result};
use std::path::Path;
use tracing::{debug, info};

use super::spec::{GITOPS_CONFIG_FILE, GitOpsConfig, GitOpsConfigFile};
use super::validator::ConfigValidator;

/// Parser for application GitOps configuration.
#[derive(Debug, Default)]
pub struct GitOpsConfigParser {
    validator: ConfigValidator,
}

impl GitOpsConfigParser {
    /// Creates a new configuration parser.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            validator: ConfigValidator::new(),
        }
    }

    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the file is absent, cannot be read,
    /// or does not contain the required keys.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<GitOpsConfig> {
        let path = path.as_ref();
        info!("Loading GitOps configuration from: {}", path.display());

        if !path.is_file() {
            return Err(GitOpsError::configuration(format!(
                "Couldn't find {GITOPS_CONFIG_FILE}"
            )));
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            GitOpsError::configuration(format!("Failed to read {}: {e}", path.display()))
        })?;

        self.parse_yaml(&content)
    }

    /// Parses configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the YAML is invalid or incomplete.
    pub fn parse_yaml(&self, content: &str) -> Result<GitOpsConfig> {
        debug!("Parsing {GITOPS_CONFIG_FILE}");

        let file: GitOpsConfigFile = serde_yaml::from_str(content).map_err(|e| {
            GitOpsError::configuration(format!("Invalid {GITOPS_CONFIG_FILE}: {e}"))
        })?;

        let config = GitOpsConfig::from(file);
        self.validator.validate(&config)?;

        debug!("Parsed configuration for application: {}", config.application_name);
        Ok(config)
    }
}
