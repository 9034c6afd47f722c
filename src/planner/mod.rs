//! Planning module for repository mutations.
//!
//! This module holds the pure decisions around a mutation: which values
//! changed, how they are grouped into commits, and how the resulting
//! pull request is opened and finished.

mod changes;
mod commit;
mod pull_request;

pub use changes::{ChangeSet, ValueChange};
pub use commit::{CommitMode, CommitPlanner};
pub use pull_request::{PullRequestLifecycle, PullRequestReport, PullRequestSpec};
