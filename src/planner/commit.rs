//! Commit planning for value deployments.
//!
//! The planner only decides messages; the workflow performs the commits.
//! Per-key commits are decided as each key is written so that every commit
//! contains exactly that key's change. The other modes decide once all keys
//! have been processed.

use crate::error::Result;
use crate::yaml::render_value;

use super::changes::{ChangeSet, ValueChange};

/// How changed values are grouped into commits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitMode {
    /// One commit per changed key.
    PerKey,
    /// One commit for all changed keys.
    SingleCommit,
    /// One commit with a caller-supplied message.
    ExplicitMessage(String),
}

impl CommitMode {
    /// Derives the mode from caller options. An explicit message always wins.
    #[must_use]
    pub fn from_options(single_commit: bool, commit_message: Option<String>) -> Self {
        match commit_message {
            Some(message) => Self::ExplicitMessage(message),
            None if single_commit => Self::SingleCommit,
            None => Self::PerKey,
        }
    }
}

/// Decides commit messages for changes made to one file.
#[derive(Debug, Clone)]
pub struct CommitPlanner {
    mode: CommitMode,
    file: String,
}

impl CommitPlanner {
    /// Creates a planner for changes to `file`.
    #[must_use]
    pub fn new(mode: CommitMode, file: impl Into<String>) -> Self {
        Self {
            mode,
            file: file.into(),
        }
    }

    /// Returns the commit mode.
    #[must_use]
    pub const fn mode(&self) -> &CommitMode {
        &self.mode
    }

    /// Message to commit right after `change` was written, if any.
    #[must_use]
    pub fn after_change(&self, change: &ValueChange) -> Option<String> {
        match self.mode {
            CommitMode::PerKey => Some(self.key_message(change)),
            CommitMode::SingleCommit | CommitMode::ExplicitMessage(_) => None,
        }
    }

    /// Message to commit once every key has been processed, if any.
    ///
    /// # Errors
    ///
    /// Returns a YAML error if the change block cannot be rendered.
    pub fn after_all(&self, changes: &ChangeSet) -> Result<Option<String>> {
        if changes.is_empty() {
            return Ok(None);
        }

        match &self.mode {
            CommitMode::PerKey => Ok(None),
            CommitMode::ExplicitMessage(message) => Ok(Some(message.clone())),
            CommitMode::SingleCommit => {
                if let Some(change) = changes.single() {
                    return Ok(Some(self.key_message(change)));
                }
                Ok(Some(format!(
                    "updated {} values in {}\n\n{}",
                    changes.len(),
                    self.file,
                    changes.to_yaml()?
                )))
            }
        }
    }

    fn key_message(&self, change: &ValueChange) -> String {
        format!(
            "changed '{}' to '{}' in {}",
            change.key_path,
            render_value(&change.new_value),
            self.file
        )
    }
}
