//! Workflows over git checkouts.
//!
//! Each workflow is a fixed sequence of steps, logged as it advances, that
//! stops at the first failure. Results are returned as tagged outcomes for
//! the caller to render.

mod deploy;
mod preview;

pub use deploy::{DEPLOY_BRANCH_PREFIX, DeployOutcome, DeployRequest, DeployStep, DeployWorkflow};
pub use preview::{PreviewOutcome, PreviewStep, PreviewWorkflow};
