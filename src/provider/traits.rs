//! Pull request provider trait.
//!
//! The trait is async because provider operations are network calls. They
//! are only invoked after a branch has been pushed, so a failure here never
//! compromises the mutation already on the remote.

use async_trait::async_trait;

use crate::error::ProviderError;

/// A pull request as created on the provider.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct PullRequestHandle {
    /// Provider-assigned number.
    pub number: u64,
    /// Web URL for viewing the pull request.
    pub url: String,
}

/// Remote operations on a hosted repository.
///
/// Implementations must be `Send + Sync`.
#[async_trait]
pub trait PullRequestProvider: Send + Sync {
    /// Provider name (e.g. "github").
    fn name(&self) -> &'static str;

    /// Opens a pull request from `source` into `target`.
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails.
    async fn create_pull_request(
        &self,
        source: &str,
        target: &str,
        title: &str,
        description: &str,
    ) -> Result<PullRequestHandle, ProviderError>;

    /// Merges an open pull request.
    ///
    /// # Errors
    ///
    /// Returns an error if the pull request cannot be merged.
    async fn merge_pull_request(&self, pull_request: &PullRequestHandle)
    -> Result<(), ProviderError>;

    /// Deletes a branch on the remote.
    ///
    /// # Errors
    ///
    /// Returns an error if the branch cannot be deleted.
    async fn delete_branch(&self, branch: &str) -> Result<(), ProviderError>;

    /// Web URL of a pull request.
    fn pull_request_url(&self, pull_request: &PullRequestHandle) -> String {
        pull_request.url.clone()
    }
}
