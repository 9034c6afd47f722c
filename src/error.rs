//! Error types for GitOps repository mutation.
//!
//! Every failure in a workflow is folded into [`GitOpsError`], which carries a
//! human-readable message. Nothing here is retried: an error aborts the
//! invocation and the checkout workspaces are released by `Drop`.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for GitOps workflows.
#[derive(Debug, Error)]
pub enum GitOpsError {
    /// Missing or malformed configuration, or a replacement path that does
    /// not exist in the target manifest.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The preview template folder does not exist in the config repository.
    #[error("The preview template folder does not exist: {folder}")]
    TemplateMissing {
        /// Template folder, relative to the repository root.
        folder: String,
    },

    /// A dotted key path does not resolve inside a YAML document.
    #[error("Key '{key_path}' not found in {file}")]
    KeyPathNotFound {
        /// The key path that was looked up.
        key_path: String,
        /// File the lookup was made against.
        file: String,
    },

    /// Git operation errors (clone, checkout, commit, push).
    #[error("Git error: {0}")]
    Git(#[from] GitError),

    /// Git provider API errors.
    #[error("Git provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The branch was pushed, but the pull request stage failed afterwards.
    #[error("Pull request for pushed branch '{branch}' failed: {source}")]
    PullRequestFailed {
        /// Branch that was already pushed.
        branch: String,
        /// Underlying provider error.
        #[source]
        source: ProviderError,
    },

    /// YAML serialization errors.
    #[error("YAML error in {file}: {message}")]
    Yaml {
        /// File being read or written.
        file: String,
        /// Description of the YAML error.
        message: String,
    },

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from the local git layer.
#[derive(Debug, Error)]
pub enum GitError {
    /// Cloning the remote failed.
    #[error("Error cloning '{url}': {message}")]
    Clone {
        /// Clone URL.
        url: String,
        /// Description of the failure.
        message: String,
    },

    /// Checking out a branch or revision failed.
    #[error("Error checking out '{reference}': {message}")]
    Checkout {
        /// Branch name or revision.
        reference: String,
        /// Description of the failure.
        message: String,
    },

    /// Creating a local branch failed.
    #[error("Error creating new branch '{branch}': {message}")]
    Branch {
        /// Branch name.
        branch: String,
        /// Description of the failure.
        message: String,
    },

    /// Staging or committing failed.
    #[error("Error creating commit: {message}")]
    Commit {
        /// Description of the failure.
        message: String,
    },

    /// Pushing a branch failed or was rejected by the remote.
    #[error("Error pushing branch '{branch}' to origin: {message}")]
    Push {
        /// Branch name.
        branch: String,
        /// Description of the failure.
        message: String,
    },

    /// Allocating the checkout workspace failed.
    #[error("Error creating workspace at {path}: {message}")]
    Workspace {
        /// Workspace path.
        path: PathBuf,
        /// Description of the failure.
        message: String,
    },
}

/// Errors from the git provider REST API.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// Authentication failed.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message from the API.
        message: String,
    },

    /// Network or connection error.
    #[error("network error: {0}")]
    Network(String),

    /// The response body could not be decoded.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Result type alias for GitOps operations.
pub type Result<T> = std::result::Result<T, GitOpsError>;

impl GitOpsError {
    /// Creates a configuration error with the given message.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Creates a YAML error for a file.
    #[must_use]
    pub fn yaml(file: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Yaml {
            file: file.into(),
            message: message.to_string(),
        }
    }

    /// Returns true if the error leaves already-pushed commits in place.
    #[must_use]
    pub const fn is_after_push(&self) -> bool {
        matches!(self, Self::PullRequestFailed { .. })
    }
}

impl GitError {
    /// Creates a commit error.
    #[must_use]
    pub fn commit(message: impl std::fmt::Display) -> Self {
        Self::Commit {
            message: message.to_string(),
        }
    }

    /// Creates a checkout error.
    #[must_use]
    pub fn checkout(reference: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Checkout {
            reference: reference.into(),
            message: message.to_string(),
        }
    }

    /// Creates a push error.
    #[must_use]
    pub fn push(branch: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Push {
            branch: branch.into(),
            message: message.to_string(),
        }
    }
}

impl ProviderError {
    /// Creates an API error.
    #[must_use]
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Creates a network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }
}
