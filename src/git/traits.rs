//! Local git capability surface consumed by the workflows.

use std::path::{Path, PathBuf};

use crate::error::GitError;

/// A checked-out repository in an exclusive workspace.
///
/// The workspace is released when the value is dropped, on every exit path.
pub trait GitRepository: Send {
    /// Checks out a branch or a revision.
    ///
    /// # Errors
    ///
    /// Returns an error if the reference does not exist.
    fn checkout(&mut self, reference: &str) -> Result<(), GitError>;

    /// Creates a branch at HEAD and switches to it.
    ///
    /// # Errors
    ///
    /// Returns an error if the branch cannot be created.
    fn new_branch(&mut self, branch: &str) -> Result<(), GitError>;

    /// Stages every change in the working tree and commits it.
    ///
    /// Returns `false` without committing when nothing differs from HEAD.
    ///
    /// # Errors
    ///
    /// Returns an error if staging or committing fails.
    fn commit(&mut self, message: &str) -> Result<bool, GitError>;

    /// Pushes a local branch to `origin`.
    ///
    /// # Errors
    ///
    /// Returns an error if the push fails or the remote rejects it.
    fn push(&mut self, branch: &str) -> Result<(), GitError>;

    /// Root of the working tree.
    fn root(&self) -> &Path;

    /// Absolute path of a repository-relative path.
    fn resolve_path(&self, relative: &str) -> PathBuf {
        self.root().join(relative)
    }
}

/// Allocates a workspace and clones a repository into it.
pub trait RepositoryFactory {
    /// Clones `organisation/repository`.
    ///
    /// # Errors
    ///
    /// Returns an error if the workspace cannot be created or the clone fails.
    fn open(&self, organisation: &str, repository: &str)
    -> Result<Box<dyn GitRepository>, GitError>;
}
