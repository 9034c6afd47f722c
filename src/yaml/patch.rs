//! Idempotent key-path updates on YAML documents.
//!
//! A key path is a dot separated list of segments. A segment addresses a
//! mapping key, or an index when the current node is a sequence. The last
//! segment must already exist: values are replaced, never created.
//!
//! File writes touch only the changed line when the target is a single-line
//! scalar in a block mapping, so comments and quoting elsewhere survive.
//! Anything else is written back as a fully re-serialized document.

use serde_yaml::Value;
use std::path::Path;
use tracing::debug;

use crate::error::{GitOpsError, Result};

/// Result of applying a single value to a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOutcome {
    /// The key path does not resolve inside the document.
    NotFound,
    /// The stored value already equals the desired value. Nothing was written.
    Unchanged,
    /// The stored value was replaced.
    Changed,
}

impl PatchOutcome {
    /// Returns true if the document was modified.
    #[must_use]
    pub const fn is_changed(self) -> bool {
        matches!(self, Self::Changed)
    }
}

/// Applies values to YAML documents and files.
#[derive(Debug, Default, Clone, Copy)]
pub struct ValuePatcher;

impl ValuePatcher {
    /// Creates a new patcher.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Reads the value stored at `key_path`, if any.
    #[must_use]
    pub fn get<'a>(&self, document: &'a Value, key_path: &str) -> Option<&'a Value> {
        let mut node = document;
        for segment in key_path.split('.') {
            node = match node {
                Value::Mapping(map) => map.get(segment)?,
                Value::Sequence(seq) => seq.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(node)
    }

    /// Writes `value` at `key_path` if it differs from the stored value.
    pub fn apply(&self, document: &mut Value, key_path: &str, value: &Value) -> PatchOutcome {
        let Some(current) = lookup_mut(document, key_path) else {
            return PatchOutcome::NotFound;
        };

        if current == value {
            return PatchOutcome::Unchanged;
        }

        *current = value.clone();
        PatchOutcome::Changed
    }

    /// Updates a YAML file in place, writing only when the value changed.
    ///
    /// Returns whether the file was modified.
    ///
    /// # Errors
    ///
    /// Returns [`GitOpsError::KeyPathNotFound`] if the path does not resolve,
    /// a configuration error if the file does not exist, or a YAML error if
    /// the file cannot be parsed.
    pub fn set_if_different(&self, file: &Path, key_path: &str, value: &Value) -> Result<bool> {
        let file_name = file.display().to_string();

        if !file.is_file() {
            return Err(GitOpsError::configuration(format!("No such file: {file_name}")));
        }

        let content = std::fs::read_to_string(file)?;
        let mut document: Value =
            serde_yaml::from_str(&content).map_err(|e| GitOpsError::yaml(&file_name, e))?;

        match self.apply(&mut document, key_path, value) {
            PatchOutcome::NotFound => Err(GitOpsError::KeyPathNotFound {
                key_path: key_path.to_string(),
                file: file_name,
            }),
            PatchOutcome::Unchanged => {
                debug!("{key_path} in {file_name} already up to date");
                Ok(false)
            }
            PatchOutcome::Changed => {
                let in_place = replace_scalar(&content, key_path, value).filter(|edited| {
                    serde_yaml::from_str::<Value>(edited).is_ok_and(|parsed| parsed == document)
                });
                let rendered = match in_place {
                    Some(edited) => edited,
                    None => {
                        debug!("Re-serializing {file_name} to write {key_path}");
                        serde_yaml::to_string(&document)
                            .map_err(|e| GitOpsError::yaml(&file_name, e))?
                    }
                };
                std::fs::write(file, rendered)?;
                debug!("Wrote {key_path} in {file_name}");
                Ok(true)
            }
        }
    }
}

fn lookup_mut<'a>(document: &'a mut Value, key_path: &str) -> Option<&'a mut Value> {
    let mut node = document;
    for segment in key_path.split('.') {
        node = match node {
            Value::Mapping(map) => map.get_mut(segment)?,
            Value::Sequence(seq) => seq.get_mut(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(node)
}

/// Rewrites the scalar at `key_path` on its own line.
///
/// Returns `None` unless every segment is a plain key of a block mapping and
/// both the old and new values fit on that line.
fn replace_scalar(content: &str, key_path: &str, value: &Value) -> Option<String> {
    if content.contains('\r') {
        return None;
    }
    let scalar = inline_scalar(value)?;
    let mut lines: Vec<String> = content.lines().map(str::to_string).collect();
    let segments: Vec<&str> = key_path.split('.').collect();

    let mut start = 0;
    let mut parent_indent: Option<usize> = None;
    let mut target = None;
    for segment in &segments {
        let (index, indent, value_start) = find_key(&lines, start, parent_indent, segment)?;
        start = index + 1;
        parent_indent = Some(indent);
        target = Some((index, value_start));
    }

    let (index, value_start) = target?;
    let line = &lines[index];
    let rest = &line[value_start..];
    let comment = rest.find(" #").map_or("", |pos| &rest[pos..]);
    let old = rest[..rest.len() - comment.len()].trim();
    if old.is_empty() || old.starts_with(['|', '>', '&', '!']) {
        return None;
    }

    let replaced = format!("{} {scalar}{comment}", &line[..value_start]);
    lines[index] = replaced;
    let mut edited = lines.join("\n");
    if content.ends_with('\n') {
        edited.push('\n');
    }
    Some(edited)
}

/// Finds `key:` among the direct children of the block that starts at `start`.
///
/// Returns the line index, its indentation and the byte offset just past the colon.
fn find_key(
    lines: &[String],
    start: usize,
    parent_indent: Option<usize>,
    key: &str,
) -> Option<(usize, usize, usize)> {
    let mut block_indent = None;
    for (index, line) in lines.iter().enumerate().skip(start) {
        let trimmed = line.trim_start_matches(' ');
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with("---") {
            continue;
        }
        let indent = line.len() - trimmed.len();
        if parent_indent.is_some_and(|parent| indent <= parent) {
            return None;
        }
        if indent != *block_indent.get_or_insert(indent) {
            continue;
        }
        let Some(rest) = trimmed.strip_prefix(key).and_then(|r| r.strip_prefix(':')) else {
            continue;
        };
        if rest.is_empty() || rest.starts_with(' ') {
            return Some((index, indent, line.len() - rest.len()));
        }
    }
    None
}

fn inline_scalar(value: &Value) -> Option<String> {
    if matches!(value, Value::Sequence(_) | Value::Mapping(_) | Value::Tagged(_)) {
        return None;
    }
    let rendered = serde_yaml::to_string(value).ok()?;
    let rendered = rendered.trim_end();
    (!rendered.contains('\n')).then(|| rendered.to_string())
}
