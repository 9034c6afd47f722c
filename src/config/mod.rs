//! Configuration module for GitOps workflows.
//!
//! This module handles:
//! - Parsing `.gitops.config.yaml` from an application repository
//! - Required-key validation
//! - Hashing preview ids into stable folder names

mod hash;
mod parser;
mod spec;
mod validator;

pub use hash::{PREVIEW_HASH_LEN, PreviewIdHasher};
pub use parser::GitOpsConfigParser;
pub use spec::{
    GITOPS_CONFIG_FILE, GitOpsConfig, ROUTE_HOST_PLACEHOLDER, ReplacementRule,
    ReplacementVariable,
};
pub use validator::ConfigValidator;
