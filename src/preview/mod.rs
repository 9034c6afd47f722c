//! Preview environments inside the config repository.
//!
//! An environment is a folder named after the hashed preview id, created once
//! from `.preview-templates/<application>` and then updated in place by the
//! replacement rules of the application's configuration.

mod environment;
mod materializer;
mod replacements;

pub use environment::{EnvironmentState, PREVIEW_TEMPLATES_DIR, PreviewEnvironment};
pub use materializer::PreviewMaterializer;
pub use replacements::{ReplacementResolver, ResolvedReplacements, ResolvedValue};
