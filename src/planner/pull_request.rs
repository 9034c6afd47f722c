//! Pull request lifecycle.
//!
//! Runs after the source branch has been pushed: create the pull request,
//! then, if requested, merge it and delete the source branch, in that order.
//! A failure here is reported as [`GitOpsError::PullRequestFailed`]; the
//! pushed commits stay where they are.

use serde::Serialize;
use tracing::info;

use crate::error::{GitOpsError, ProviderError, Result};
use crate::provider::{PullRequestHandle, PullRequestProvider};

use super::changes::ChangeSet;

/// What to open and how to finish it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestSpec {
    /// Branch carrying the changes.
    pub source_branch: String,
    /// Branch to merge into.
    pub target_branch: String,
    /// Pull request title.
    pub title: String,
    /// Pull request description.
    pub description: String,
    /// Merge and delete the source branch right after creation.
    pub auto_merge: bool,
}

impl PullRequestSpec {
    /// Builds the spec for value changes made to `file`.
    ///
    /// # Errors
    ///
    /// Returns a YAML error if the changes cannot be rendered.
    pub fn for_changes(
        source_branch: impl Into<String>,
        target_branch: impl Into<String>,
        file: &str,
        changes: &ChangeSet,
        auto_merge: bool,
    ) -> Result<Self> {
        let plural = if changes.len() > 1 { "s" } else { "" };
        let description = format!(
            "Updated {} value{plural} in `{file}`:\n```yaml\n{}```\n",
            changes.len(),
            changes.to_yaml()?
        );

        Ok(Self {
            source_branch: source_branch.into(),
            target_branch: target_branch.into(),
            title: format!("Updated values in {file}"),
            description,
            auto_merge,
        })
    }
}

/// Result of a completed pull request lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PullRequestReport {
    /// The created pull request.
    pub pull_request: PullRequestHandle,
    /// Web URL, as reported by the provider.
    pub url: String,
    /// Whether the pull request was merged.
    pub merged: bool,
    /// Whether the source branch was deleted.
    pub branch_deleted: bool,
}

/// Drives a pull request from creation to optional merge and cleanup.
pub struct PullRequestLifecycle<'a> {
    provider: &'a dyn PullRequestProvider,
}

impl<'a> PullRequestLifecycle<'a> {
    /// Creates a lifecycle manager over `provider`.
    #[must_use]
    pub const fn new(provider: &'a dyn PullRequestProvider) -> Self {
        Self { provider }
    }

    /// Opens the pull request and, if requested, merges it and deletes the branch.
    ///
    /// # Errors
    ///
    /// Returns [`GitOpsError::PullRequestFailed`] naming the pushed branch.
    pub async fn run(&self, spec: &PullRequestSpec) -> Result<PullRequestReport> {
        self.drive(spec)
            .await
            .map_err(|source| GitOpsError::PullRequestFailed {
                branch: spec.source_branch.clone(),
                source,
            })
    }

    async fn drive(&self, spec: &PullRequestSpec) -> std::result::Result<PullRequestReport, ProviderError> {
        let pull_request = self
            .provider
            .create_pull_request(
                &spec.source_branch,
                &spec.target_branch,
                &spec.title,
                &spec.description,
            )
            .await?;
        let url = self.provider.pull_request_url(&pull_request);
        info!("Pull request created: {url}");

        let mut report = PullRequestReport {
            pull_request,
            url,
            merged: false,
            branch_deleted: false,
        };

        if !spec.auto_merge {
            return Ok(report);
        }

        self.provider.merge_pull_request(&report.pull_request).await?;
        report.merged = true;
        info!("Pull request merged");

        self.provider.delete_branch(&spec.source_branch).await?;
        report.branch_deleted = true;
        info!("Branch '{}' deleted", spec.source_branch);

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::ValueChange;
    use crate::testing::{FakeProvider, ProviderCall};
    use serde_yaml::Value;

    fn spec(auto_merge: bool) -> PullRequestSpec {
        let mut changes = ChangeSet::new();
        changes.record(ValueChange::new("replicaCount", Value::from(3)));
        PullRequestSpec::for_changes("gitopscli-deploy-1234abcd", "master", "values.yaml", &changes, auto_merge)
            .unwrap()
    }

    #[test]
    fn test_spec_rendering() {
        let spec = spec(false);
        assert_eq!(spec.title, "Updated values in values.yaml");
        assert_eq!(
            spec.description,
            "Updated 1 value in `values.yaml`:\n```yaml\nreplicaCount: 3\n```\n"
        );
    }

    #[tokio::test]
    async fn test_auto_merge_order() {
        let provider = FakeProvider::new();
        let report = PullRequestLifecycle::new(&provider).run(&spec(true)).await.unwrap();

        assert!(report.merged);
        assert!(report.branch_deleted);
        assert_eq!(
            provider.calls(),
            vec![
                ProviderCall::Create {
                    source: String::from("gitopscli-deploy-1234abcd"),
                    target: String::from("master"),
                    title: String::from("Updated values in values.yaml"),
                },
                ProviderCall::Merge { number: 1 },
                ProviderCall::DeleteBranch(String::from("gitopscli-deploy-1234abcd")),
            ]
        );
    }

    #[tokio::test]
    async fn test_without_auto_merge_branch_remains() {
        let provider = FakeProvider::new();
        let report = PullRequestLifecycle::new(&provider).run(&spec(false)).await.unwrap();

        assert!(!report.merged);
        assert!(!report.branch_deleted);
        assert_eq!(provider.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_merge_failure_is_reported_with_branch() {
        let provider = FakeProvider::new().fail_merge(ProviderError::api(405, "not mergeable"));
        let err = PullRequestLifecycle::new(&provider).run(&spec(true)).await.unwrap_err();

        match err {
            GitOpsError::PullRequestFailed { branch, .. } => {
                assert_eq!(branch, "gitopscli-deploy-1234abcd");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(
            !provider
                .calls()
                .iter()
                .any(|c| matches!(c, ProviderCall::DeleteBranch(_)))
        );
    }
}
