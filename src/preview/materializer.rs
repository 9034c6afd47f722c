//! Creation of preview environment folders from templates.

use std::path::Path;

use serde_yaml::Value;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::{GitOpsError, Result};
use crate::git::GitRepository;
use crate::yaml::ValuePatcher;

use super::environment::PreviewEnvironment;

const CHART_FILE: &str = "Chart.yaml";

/// Copies the application template into a new preview folder and commits it.
#[derive(Debug, Default, Clone, Copy)]
pub struct PreviewMaterializer {
    patcher: ValuePatcher,
}

impl PreviewMaterializer {
    /// Creates a new materializer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            patcher: ValuePatcher::new(),
        }
    }

    /// Fails with [`GitOpsError::TemplateMissing`] unless the template folder exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the template folder is absent.
    pub fn ensure_template(&self, repo: &dyn GitRepository, env: &PreviewEnvironment) -> Result<()> {
        let folder = env.template_folder();
        if !repo.resolve_path(&folder).is_dir() {
            return Err(GitOpsError::TemplateMissing { folder });
        }
        info!("Using the preview template folder: {folder}");
        Ok(())
    }

    /// Creates the environment folder and commits it.
    ///
    /// The template is copied as is; `Chart.yaml`, when present, gets its
    /// `name` set to the folder name.
    ///
    /// # Errors
    ///
    /// Returns an error if the template is missing, the copy fails, the chart
    /// has no `name` key, or the commit fails.
    pub fn materialize(
        &self,
        repo: &mut dyn GitRepository,
        env: &PreviewEnvironment,
        git_hash: &str,
    ) -> Result<()> {
        self.ensure_template(repo, env)?;

        let source = repo.resolve_path(&env.template_folder());
        let target = repo.resolve_path(&env.folder_name);
        copy_dir(&source, &target)?;
        debug!("Copied {} to {}", source.display(), target.display());

        let chart = env.file(CHART_FILE);
        let chart_path = repo.resolve_path(&chart);
        if chart_path.is_file() {
            info!("Setting chart name in {chart}");
            self.patcher
                .set_if_different(&chart_path, "name", &Value::from(env.folder_name.as_str()))
                .map_err(|e| match e {
                    GitOpsError::KeyPathNotFound { .. } => {
                        GitOpsError::configuration(format!("Key 'name' not found in '{chart}'"))
                    }
                    other => other,
                })?;
        }

        let message = format!(
            "Create new preview environment for '{}' and git hash '{git_hash}'.",
            env.application_name
        );
        repo.commit(&message)?;
        info!("Created preview environment {env}");
        Ok(())
    }
}

fn copy_dir(source: &Path, target: &Path) -> std::io::Result<()> {
    for entry in WalkDir::new(source) {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(std::io::Error::other)?;
        let destination = target.join(relative);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&destination)?;
        } else {
            std::fs::copy(entry.path(), &destination)?;
        }
    }
    Ok(())
}
