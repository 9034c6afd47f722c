//! Git layer.
//!
//! Workflows only see the [`GitRepository`] and [`RepositoryFactory`] traits;
//! [`Git2Repository`] is the `git2`-backed implementation used by the binary.

mod repository;
mod traits;

pub use repository::{CommitAuthor, Git2Repository, Git2RepositoryFactory, GitCredentials};
pub use traits::{GitRepository, RepositoryFactory};

/// Branch every workflow starts from and targets.
pub const MAIN_BRANCH: &str = "master";
