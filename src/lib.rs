// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(warnings)]                    // All warnings are treated as errors
#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![deny(dead_code)]                   // Unused code is forbidden
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![deny(unused_imports)]              // Unused imports are forbidden
#![deny(unused_variables)]            // Unused variables are forbidden
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::missing_const_for_fn)] // Force const when possible
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::module_inception)]    // Module with same name as crate warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::shadow_unrelated)]    // Shadowing unrelated variables warning
#![warn(clippy::too_many_arguments)]  // Limit function arguments
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # gitopsctl
//!
//! Mutates GitOps configuration repositories through git: idempotent value
//! deployments into YAML files, and per-commit preview environments.
//!
//! ## Overview
//!
//! Every mutation follows the same shape:
//!
//! 1. **Checkout**: clone the repository into an exclusive temporary workspace
//! 2. **Patch**: write values only where they differ, tracking what changed
//! 3. **Land**: commit and push when something changed, optionally through a
//!    pull request that can be merged right away
//!
//! Running the same command twice leaves the repository untouched the
//! second time.
//!
//! ## Modules
//!
//! - [`config`]: `.gitops.config.yaml` parsing and preview id hashing
//! - [`yaml`]: Key-path value patching
//! - [`preview`]: Preview environment creation and replacement rules
//! - [`planner`]: Change tracking, commit messages and pull request lifecycle
//! - [`git`]: Local checkouts backed by `git2`
//! - [`provider`]: Pull request APIs of git hosting providers
//! - [`workflow`]: The deploy and preview workflows
//! - [`cli`]: Command-line interface
//!
//! ## Example
//!
//! ```yaml
//! deploymentConfig:
//!   org: team-org
//!   repository: team-config
//!   applicationName: myapp
//! previewConfig:
//!   route:
//!     host:
//!       template: "{SHA256_8CHAR_BRANCH_HASH}.example.com"
//!   replace:
//!     - path: image.tag
//!       variable: GIT_COMMIT
//!     - path: route.host
//!       variable: ROUTE_HOST
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod cli;
pub mod config;
pub mod error;
pub mod git;
pub mod planner;
pub mod preview;
pub mod provider;
pub mod workflow;
pub mod yaml;

#[cfg(test)]
mod testing;

// ============================================================================
// Re-exports
// ============================================================================

pub use cli::{Cli, Commands, OutputFormatter};
pub use config::{ConfigValidator, GitOpsConfig, GitOpsConfigParser, PreviewIdHasher};
pub use error::{GitError, GitOpsError, ProviderError, Result};
pub use git::{Git2Repository, Git2RepositoryFactory, GitRepository, RepositoryFactory};
pub use planner::{ChangeSet, CommitMode, CommitPlanner, PullRequestLifecycle, ValueChange};
pub use preview::{PreviewEnvironment, PreviewMaterializer, ReplacementResolver};
pub use provider::{GitHubProvider, PullRequestProvider};
pub use workflow::{DeployOutcome, DeployWorkflow, PreviewOutcome, PreviewWorkflow};
pub use yaml::{PatchOutcome, ValuePatcher};
