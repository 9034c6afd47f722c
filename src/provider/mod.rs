//! Git provider integration.
//!
//! The [`PullRequestProvider`] trait abstracts the hosting service's REST
//! API. GitHub (and GitHub Enterprise) is the implemented provider.

mod github;
mod traits;

pub use github::GitHubProvider;
pub use traits::{PullRequestHandle, PullRequestProvider};

use crate::error::ProviderError;

/// Supported git providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ProviderKind {
    /// GitHub or GitHub Enterprise.
    #[default]
    Github,
}

impl ProviderKind {
    /// Default web URL of the provider.
    #[must_use]
    pub const fn default_url(self) -> &'static str {
        match self {
            Self::Github => "https://github.com",
        }
    }
}

/// Builds the provider client for `organisation/repository`.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be created.
pub fn create_provider(
    kind: ProviderKind,
    provider_url: &str,
    token: Option<String>,
    organisation: &str,
    repository: &str,
) -> Result<Box<dyn PullRequestProvider>, ProviderError> {
    match kind {
        ProviderKind::Github => Ok(Box::new(
            GitHubProvider::new(token, organisation, repository)?
                .with_api_base(GitHubProvider::api_base_for(provider_url)),
        )),
    }
}

/// Clone URL of `organisation/repository` on the provider.
#[must_use]
pub fn clone_url(provider_url: &str, organisation: &str, repository: &str) -> String {
    format!(
        "{}/{organisation}/{repository}.git",
        provider_url.trim_end_matches('/')
    )
}
