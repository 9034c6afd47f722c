//! Required-key checks for GitOps configuration.
//!
//! Serde already rejects absent keys; this catches keys that are present
//! but empty. Deeper schema validation is out of scope.

use crate::error::{GitOpsError, Result};
use tracing::debug;

use super::spec::GitOpsConfig;

/// Validator for [`GitOpsConfig`].
#[derive(Debug, Default)]
pub struct ConfigValidator;

/// A single validation error.
#[derive(Debug)]
struct ValidationError {
    field: String,
    message: String,
}

impl ConfigValidator {
    /// Creates a new validator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Validates a configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error describing the first problem found.
    pub fn validate(&self, config: &GitOpsConfig) -> Result<()> {
        let mut errors = Vec::new();

        Self::require_non_empty(
            "deploymentConfig.applicationName",
            &config.application_name,
            &mut errors,
        );
        Self::require_non_empty("deploymentConfig.org", &config.team_config_org, &mut errors);
        Self::require_non_empty(
            "deploymentConfig.repository",
            &config.team_config_repo,
            &mut errors,
        );

        for (i, rule) in config.replacements.iter().enumerate() {
            Self::require_non_empty(
                &format!("previewConfig.replace[{i}].path"),
                &rule.path,
                &mut errors,
            );
        }

        match errors.first() {
            None => {
                debug!("Configuration validation passed");
                Ok(())
            }
            Some(first) => Err(GitOpsError::configuration(format!(
                "{}: {}",
                first.field, first.message
            ))),
        }
    }

    fn require_non_empty(field: &str, value: &str, errors: &mut Vec<ValidationError>) {
        if value.trim().is_empty() {
            errors.push(ValidationError {
                field: field.to_string(),
                message: String::from("must not be empty"),
            });
        }
    }
}
