//! Output formatting for CLI commands.
//!
//! This module renders workflow outcomes for the user, either as
//! human-readable text or as JSON for scripting.

use colored::Colorize;
use std::fmt::Write;
use tabled::{Table, Tabled};

use crate::planner::{ChangeSet, PullRequestReport};
use crate::workflow::{DeployOutcome, PreviewOutcome};
use crate::yaml::render_value;

use super::commands::OutputFormat;

/// Output formatter for CLI.
#[derive(Debug)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

/// Changed value row for table display.
#[derive(Tabled)]
struct ChangeRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Value")]
    value: String,
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats the outcome of a deploy run.
    #[must_use]
    pub fn format_deploy(&self, outcome: &DeployOutcome) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(outcome).unwrap_or_default(),
            OutputFormat::Text => Self::format_deploy_text(outcome),
        }
    }

    fn format_deploy_text(outcome: &DeployOutcome) -> String {
        match outcome {
            DeployOutcome::AlreadyUpToDate => {
                format!("{} All values already up to date.\n", "✓".green())
            }
            DeployOutcome::Deployed {
                branch,
                changes,
                pull_request,
            } => {
                let mut output = String::new();
                let _ = writeln!(
                    output,
                    "{} Deployed {} value(s) to branch {}\n",
                    "✓".green(),
                    changes.len(),
                    branch.cyan()
                );
                output.push_str(&Self::changes_table(changes));
                output.push('\n');

                if let Some(report) = pull_request {
                    output.push_str(&Self::pull_request_text(report));
                }
                output
            }
        }
    }

    /// Formats the outcome of a preview run.
    #[must_use]
    pub fn format_preview(&self, outcome: &PreviewOutcome) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(outcome).unwrap_or_default(),
            OutputFormat::Text => Self::format_preview_text(outcome),
        }
    }

    fn format_preview_text(outcome: &PreviewOutcome) -> String {
        let (verb, route_host, folder) = match outcome {
            PreviewOutcome::AlreadyUpToDate { git_hash } => {
                return format!(
                    "{} Preview already up to date for git hash {git_hash}.\n",
                    "✓".green()
                );
            }
            PreviewOutcome::ExistingUpdated { route_host, folder } => {
                ("Updated", route_host, folder)
            }
            PreviewOutcome::NewCreated { route_host, folder } => ("Created", route_host, folder),
        };

        let mut output = format!("{} {verb} preview environment {}\n", "✓".green(), folder.cyan());
        if let Some(host) = route_host {
            let _ = writeln!(output, "   Route host: {host}");
        }
        output
    }

    fn changes_table(changes: &ChangeSet) -> String {
        let rows: Vec<ChangeRow> = changes
            .iter()
            .enumerate()
            .map(|(i, change)| ChangeRow {
                index: i + 1,
                key: change.key_path.clone(),
                value: Self::truncate(&render_value(&change.new_value), 60),
            })
            .collect();
        Table::new(rows).to_string()
    }

    fn pull_request_text(report: &PullRequestReport) -> String {
        let mut output = String::new();
        let _ = writeln!(
            output,
            "Pull request #{}: {}",
            report.pull_request.number, report.url
        );
        if report.merged {
            let _ = writeln!(output, "   {}", "merged".green());
        }
        if report.branch_deleted {
            let _ = writeln!(output, "   {}", "branch deleted".dimmed());
        }
        output
    }

    /// Truncates a string to a maximum number of characters.
    fn truncate(s: &str, max_len: usize) -> String {
        if s.chars().count() <= max_len {
            s.to_string()
        } else {
            let head: String = s.chars().take(max_len - 3).collect();
            format!("{head}...")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::ValueChange;
    use crate::provider::PullRequestHandle;
    use serde_yaml::Value;

    fn deployed() -> DeployOutcome {
        let mut changes = ChangeSet::new();
        changes.record(ValueChange::new("image.tag", Value::from("v2")));
        DeployOutcome::Deployed {
            branch: String::from("gitopscli-deploy-1234abcd"),
            changes,
            pull_request: Some(PullRequestReport {
                pull_request: PullRequestHandle {
                    number: 7,
                    url: String::from("https://github.com/o/r/pull/7"),
                },
                url: String::from("https://github.com/o/r/pull/7"),
                merged: true,
                branch_deleted: true,
            }),
        }
    }

    #[test]
    fn test_deploy_json() {
        let output = OutputFormatter::new(OutputFormat::Json).format_deploy(&deployed());
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(json["status"], "deployed");
        assert_eq!(json["branch"], "gitopscli-deploy-1234abcd");
        assert_eq!(json["changes"][0]["key_path"], "image.tag");
        assert_eq!(json["pull_request"]["pull_request"]["number"], 7);
    }

    #[test]
    fn test_deploy_text() {
        let output = OutputFormatter::new(OutputFormat::Text).format_deploy(&deployed());

        assert!(output.contains("image.tag"));
        assert!(output.contains("Pull request #7: https://github.com/o/r/pull/7"));
    }

    #[test]
    fn test_preview_json() {
        let outcome = PreviewOutcome::NewCreated {
            route_host: Some(String::from("f390bbc4.example.com")),
            folder: String::from("myapp-f390bbc4-preview"),
        };
        let output = OutputFormatter::new(OutputFormat::Json).format_preview(&outcome);
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(json["status"], "new_created");
        assert_eq!(json["route_host"], "f390bbc4.example.com");
    }

    #[test]
    fn test_preview_up_to_date_text() {
        let outcome = PreviewOutcome::AlreadyUpToDate {
            git_hash: String::from("abc123"),
        };
        let output = OutputFormatter::new(OutputFormat::Text).format_preview(&outcome);
        assert!(output.contains("abc123"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(OutputFormatter::truncate("short", 10), "short");
        assert_eq!(OutputFormatter::truncate("abcdefghijkl", 8), "abcde...");
    }
}
