//! `git2` implementation of the git layer.
//!
//! Every repository is cloned into its own temporary directory, owned by the
//! [`Git2Repository`] value. Dropping the value deletes the checkout.

use std::path::Path;

use git2::build::{CheckoutBuilder, RepoBuilder};
use git2::{
    BranchType, Commit, Cred, FetchOptions, IndexAddOption, PushOptions, RemoteCallbacks,
    Repository, Signature,
};
use tempfile::TempDir;
use tracing::{debug, info};

use super::traits::{GitRepository, RepositoryFactory};
use crate::error::GitError;
use crate::provider::clone_url;

/// Username/password used for clone and push.
#[derive(Clone, Default)]
pub struct GitCredentials {
    /// Username, if any.
    pub username: Option<String>,
    /// Password or token, if any.
    pub password: Option<String>,
}

// Custom Debug to avoid exposing the password
impl std::fmt::Debug for GitCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitCredentials")
            .field("username", &self.username)
            .field("has_password", &self.password.is_some())
            .finish()
    }
}

/// Author recorded on commits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitAuthor {
    /// Author name.
    pub name: String,
    /// Author email.
    pub email: String,
}

/// A cloned repository living in a temporary workspace.
pub struct Git2Repository {
    // Declared before `workspace` so the handle closes before the directory is removed.
    repo: Repository,
    credentials: GitCredentials,
    author: CommitAuthor,
    url: String,
    workspace: TempDir,
}

impl std::fmt::Debug for Git2Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git2Repository")
            .field("url", &self.url)
            .field("workspace", &self.workspace.path())
            .field("author", &self.author)
            .finish_non_exhaustive()
    }
}

fn remote_callbacks(credentials: &GitCredentials) -> RemoteCallbacks<'_> {
    let mut callbacks = RemoteCallbacks::new();
    if let (Some(username), Some(password)) = (&credentials.username, &credentials.password) {
        callbacks.credentials(move |_url, _username_from_url, _allowed| {
            Cred::userpass_plaintext(username, password)
        });
    }
    callbacks
}

impl Git2Repository {
    /// Clones `url` into `workspace`.
    ///
    /// # Errors
    ///
    /// Returns an error if the clone fails.
    pub fn clone_into(
        url: &str,
        workspace: TempDir,
        credentials: GitCredentials,
        author: CommitAuthor,
    ) -> Result<Self, GitError> {
        let path = workspace.path().join("repo");
        debug!("Cloning {url} into {}", path.display());

        let repo = {
            let mut fetch_options = FetchOptions::new();
            fetch_options.remote_callbacks(remote_callbacks(&credentials));
            RepoBuilder::new()
                .fetch_options(fetch_options)
                .clone(url, &path)
                .map_err(|e| GitError::Clone {
                    url: url.to_string(),
                    message: e.message().to_string(),
                })?
        };

        Ok(Self {
            repo,
            credentials,
            author,
            url: url.to_string(),
            workspace,
        })
    }

    fn checkout_branch(&self, branch: &str) -> Result<bool, git2::Error> {
        let commit = match self.repo.find_branch(branch, BranchType::Local) {
            Ok(local) => local.get().peel_to_commit()?,
            Err(_) => {
                let Ok(remote) = self.repo.find_branch(&format!("origin/{branch}"), BranchType::Remote)
                else {
                    return Ok(false);
                };
                let commit = remote.get().peel_to_commit()?;
                let mut local = self.repo.branch(branch, &commit, false)?;
                local.set_upstream(Some(&format!("origin/{branch}")))?;
                commit
            }
        };

        self.repo
            .checkout_tree(commit.as_object(), Some(CheckoutBuilder::new().force()))?;
        self.repo.set_head(&format!("refs/heads/{branch}"))?;
        Ok(true)
    }

    fn checkout_revision(&self, revision: &str) -> Result<(), git2::Error> {
        let commit = self.repo.revparse_single(revision)?.peel_to_commit()?;
        self.repo
            .checkout_tree(commit.as_object(), Some(CheckoutBuilder::new().force()))?;
        self.repo.set_head_detached(commit.id())
    }

    fn head_commit(&self) -> Option<Commit<'_>> {
        self.repo.head().ok().and_then(|head| head.peel_to_commit().ok())
    }
}

impl GitRepository for Git2Repository {
    fn checkout(&mut self, reference: &str) -> Result<(), GitError> {
        let checked_out_branch = self
            .checkout_branch(reference)
            .map_err(|e| GitError::checkout(reference, e.message()))?;

        if !checked_out_branch {
            self.checkout_revision(reference)
                .map_err(|e| GitError::checkout(reference, e.message()))?;
        }

        info!("Checked out '{reference}' of {}", self.url);
        Ok(())
    }

    fn new_branch(&mut self, branch: &str) -> Result<(), GitError> {
        let to_error = |e: git2::Error| GitError::Branch {
            branch: branch.to_string(),
            message: e.message().to_string(),
        };

        let head = self.repo.head().and_then(|h| h.peel_to_commit()).map_err(to_error)?;
        self.repo.branch(branch, &head, false).map_err(to_error)?;
        self.repo.set_head(&format!("refs/heads/{branch}")).map_err(to_error)?;

        debug!("Created branch {branch}");
        Ok(())
    }

    fn commit(&mut self, message: &str) -> Result<bool, GitError> {
        let mut index = self.repo.index().map_err(GitError::commit)?;
        index
            .add_all(["*"], IndexAddOption::DEFAULT, None)
            .map_err(GitError::commit)?;
        index.update_all(["*"], None).map_err(GitError::commit)?;
        index.write().map_err(GitError::commit)?;
        let tree_id = index.write_tree().map_err(GitError::commit)?;

        let parent = self.head_commit();
        if parent.as_ref().is_some_and(|p| p.tree_id() == tree_id) {
            debug!("Nothing to commit");
            return Ok(false);
        }

        let tree = self.repo.find_tree(tree_id).map_err(GitError::commit)?;
        let signature =
            Signature::now(&self.author.name, &self.author.email).map_err(GitError::commit)?;
        let parents: Vec<&Commit<'_>> = parent.iter().collect();

        self.repo
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)
            .map_err(GitError::commit)?;

        debug!("Committed: {}", message.lines().next().unwrap_or_default());
        Ok(true)
    }

    fn push(&mut self, branch: &str) -> Result<(), GitError> {
        let mut remote = self
            .repo
            .find_remote("origin")
            .map_err(|e| GitError::push(branch, e.message()))?;

        let mut rejected: Option<String> = None;
        {
            let mut callbacks = remote_callbacks(&self.credentials);
            callbacks.push_update_reference(|refname, status| {
                if let Some(status) = status {
                    rejected = Some(format!("{refname}: {status}"));
                }
                Ok(())
            });
            let mut options = PushOptions::new();
            options.remote_callbacks(callbacks);

            let refspec = format!("refs/heads/{branch}:refs/heads/{branch}");
            remote
                .push(&[refspec], Some(&mut options))
                .map_err(|e| GitError::push(branch, e.message()))?;
        }

        if let Some(message) = rejected {
            return Err(GitError::push(branch, message));
        }

        info!("Pushed branch {branch}");
        Ok(())
    }

    fn root(&self) -> &Path {
        self.repo.workdir().unwrap_or_else(|| self.workspace.path())
    }
}

/// Clones repositories from a provider with fixed credentials and author.
#[derive(Debug, Clone)]
pub struct Git2RepositoryFactory {
    provider_url: String,
    credentials: GitCredentials,
    author: CommitAuthor,
}

impl Git2RepositoryFactory {
    /// Creates a factory for repositories under `provider_url`.
    #[must_use]
    pub fn new(
        provider_url: impl Into<String>,
        credentials: GitCredentials,
        author: CommitAuthor,
    ) -> Self {
        Self {
            provider_url: provider_url.into(),
            credentials,
            author,
        }
    }
}

impl RepositoryFactory for Git2RepositoryFactory {
    fn open(
        &self,
        organisation: &str,
        repository: &str,
    ) -> Result<Box<dyn GitRepository>, GitError> {
        let workspace = tempfile::Builder::new()
            .prefix("gitopsctl-")
            .tempdir()
            .map_err(|e| GitError::Workspace {
                path: std::env::temp_dir(),
                message: e.to_string(),
            })?;

        let url = clone_url(&self.provider_url, organisation, repository);
        let repo =
            Git2Repository::clone_into(&url, workspace, self.credentials.clone(), self.author.clone())?;
        Ok(Box::new(repo))
    }
}
