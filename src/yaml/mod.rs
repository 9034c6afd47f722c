//! YAML value patching.
//!
//! The patch engine is the idempotency backbone of every workflow: its
//! three-way [`PatchOutcome`] is the only signal for "was anything modified".

mod patch;

pub use patch::{PatchOutcome, ValuePatcher};

use serde_yaml::Value;

/// Renders a value the way it appears in commit messages.
///
/// Scalars render as their plain text (`3`, `true`, `nginx:1.2`); sequences
/// and mappings render as YAML without the trailing newline.
#[must_use]
pub fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::from("null"),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}
