//! Direct deployment of values into a file of the config repository.

use std::fmt;

use serde::Serialize;
use serde_yaml::{Mapping, Value};
use tracing::info;

use crate::error::{GitOpsError, Result};
use crate::git::{MAIN_BRANCH, RepositoryFactory};
use crate::planner::{
    ChangeSet, CommitMode, CommitPlanner, PullRequestLifecycle, PullRequestReport, PullRequestSpec,
    ValueChange,
};
use crate::provider::PullRequestProvider;
use crate::yaml::{ValuePatcher, render_value};

/// Prefix of the branches created for pull requests.
pub const DEPLOY_BRANCH_PREFIX: &str = "gitopscli-deploy-";

/// Steps of the deploy workflow, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployStep {
    /// Check out the main branch.
    Checkout,
    /// Create the pull request branch.
    NewBranch,
    /// Write the requested values.
    ApplyValues,
    /// Commit the changes.
    Commit,
    /// Push the branch.
    Push,
    /// Open, and optionally merge, the pull request.
    PullRequest,
}

impl fmt::Display for DeployStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Checkout => "checkout",
            Self::NewBranch => "new branch",
            Self::ApplyValues => "apply values",
            Self::Commit => "commit",
            Self::Push => "push",
            Self::PullRequest => "pull request",
        };
        write!(f, "{name}")
    }
}

/// Values to deploy and how to land them.
#[derive(Debug, Clone)]
pub struct DeployRequest {
    /// File to update, relative to the repository root.
    pub file: String,
    /// Dotted key paths and their values, applied in order.
    pub values: Mapping,
    /// Push to a fresh branch and open a pull request.
    pub create_pr: bool,
    /// Merge the pull request and delete its branch.
    pub auto_merge: bool,
    /// Commit grouping.
    pub commit_mode: CommitMode,
}

/// Result of a deploy workflow run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeployOutcome {
    /// Every value was already in place. Nothing was committed or pushed.
    AlreadyUpToDate,
    /// Changes were committed and pushed.
    Deployed {
        /// Branch the commits were pushed to.
        branch: String,
        /// Values that changed, in order.
        changes: ChangeSet,
        /// Pull request, when one was requested.
        pull_request: Option<PullRequestReport>,
    },
}

/// Updates values in one file of a config repository.
pub struct DeployWorkflow<'a> {
    factory: &'a dyn RepositoryFactory,
    provider: &'a dyn PullRequestProvider,
    organisation: String,
    repository: String,
    patcher: ValuePatcher,
}

impl<'a> DeployWorkflow<'a> {
    /// Creates a workflow for the config repository `organisation/repository`.
    #[must_use]
    pub fn new(
        factory: &'a dyn RepositoryFactory,
        provider: &'a dyn PullRequestProvider,
        organisation: impl Into<String>,
        repository: impl Into<String>,
    ) -> Self {
        Self {
            factory,
            provider,
            organisation: organisation.into(),
            repository: repository.into(),
            patcher: ValuePatcher::new(),
        }
    }

    /// Runs the workflow.
    ///
    /// # Errors
    ///
    /// Stops at the first failing step. A failure after the push is reported
    /// as [`GitOpsError::PullRequestFailed`].
    pub async fn run(&self, request: &DeployRequest) -> Result<DeployOutcome> {
        let (branch, changes) = {
            step(DeployStep::Checkout);
            let mut repo = self.factory.open(&self.organisation, &self.repository)?;
            repo.checkout(MAIN_BRANCH)?;
            info!("{MAIN_BRANCH} checkout successful");

            let branch = if request.create_pr {
                step(DeployStep::NewBranch);
                let branch = new_branch_name();
                repo.new_branch(&branch)?;
                info!("Created branch {branch}");
                branch
            } else {
                MAIN_BRANCH.to_string()
            };

            step(DeployStep::ApplyValues);
            let planner = CommitPlanner::new(request.commit_mode.clone(), &request.file);
            let path = repo.resolve_path(&request.file);
            if !path.is_file() {
                return Err(GitOpsError::configuration(format!(
                    "No such file: {}",
                    request.file
                )));
            }

            let mut changes = ChangeSet::new();
            for (key, value) in &request.values {
                let key = key_path(key)?;
                let changed = self
                    .patcher
                    .set_if_different(&path, &key, value)
                    .map_err(|e| match e {
                        GitOpsError::KeyPathNotFound { key_path, .. } => {
                            GitOpsError::KeyPathNotFound {
                                key_path,
                                file: request.file.clone(),
                            }
                        }
                        other => other,
                    })?;
                if !changed {
                    info!("Yaml property {key} already up-to-date");
                    continue;
                }
                info!("Updated yaml property {key} to {}", render_value(value));

                let change = ValueChange::new(key, value.clone());
                if let Some(message) = planner.after_change(&change) {
                    repo.commit(&message)?;
                }
                changes.record(change);
            }

            if changes.is_empty() {
                info!("All values already up-to-date");
                return Ok(DeployOutcome::AlreadyUpToDate);
            }

            if let Some(message) = planner.after_all(&changes)? {
                step(DeployStep::Commit);
                repo.commit(&message)?;
            }

            step(DeployStep::Push);
            repo.push(&branch)?;
            info!("Pushed branch {branch}");

            (branch, changes)
        };

        let pull_request = if request.create_pr {
            step(DeployStep::PullRequest);
            let spec = PullRequestSpec::for_changes(
                branch.as_str(),
                MAIN_BRANCH,
                &request.file,
                &changes,
                request.auto_merge,
            )?;
            Some(PullRequestLifecycle::new(self.provider).run(&spec).await?)
        } else {
            None
        };

        Ok(DeployOutcome::Deployed {
            branch,
            changes,
            pull_request,
        })
    }
}

fn new_branch_name() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("{DEPLOY_BRANCH_PREFIX}{}", &id[..8])
}

fn key_path(key: &Value) -> Result<String> {
    match key {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(GitOpsError::configuration(format!(
            "Invalid key path: {}",
            render_value(other)
        ))),
    }
}

fn step(step: DeployStep) {
    info!("Deploy step: {step}");
}
