//! CLI command definitions.
//!
//! This module defines all CLI commands and their arguments using clap.

use clap::{Args, Parser, Subcommand};
use serde_yaml::Mapping;

use crate::git::{CommitAuthor, GitCredentials};
use crate::provider::ProviderKind;

/// gitopsctl - Mutate GitOps config repositories through git.
#[derive(Parser, Debug)]
#[command(name = "gitopsctl")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    /// Log line format (text, json).
    #[arg(long, global = true, default_value = "text", env = "GITOPS_LOG_FORMAT")]
    pub log_format: LogFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Update values in a YAML file of a config repository.
    Deploy {
        /// Repository and credentials.
        #[command(flatten)]
        git: GitArgs,

        /// File to update, relative to the repository root.
        #[arg(long)]
        file: String,

        /// YAML mapping of dotted key paths to values, e.g. '{image.tag: v2}'.
        #[arg(long, value_parser = parse_values)]
        values: Mapping,

        /// Push to a new branch and open a pull request.
        #[arg(long)]
        create_pr: bool,

        /// Merge the pull request and delete its branch.
        #[arg(long, requires = "create_pr")]
        auto_merge: bool,

        /// Commit all changed values at once.
        #[arg(long)]
        single_commit: bool,

        /// Commit all changed values at once with this message.
        #[arg(long)]
        commit_message: Option<String>,
    },

    /// Create or update the preview environment of an application commit.
    CreatePreview {
        /// Application repository and credentials.
        #[command(flatten)]
        git: GitArgs,

        /// Application commit to preview.
        #[arg(long)]
        git_hash: String,

        /// Identifier of the preview, e.g. a branch or pull request name.
        #[arg(long)]
        preview_id: String,
    },
}

/// Repository, credentials and commit author options.
#[derive(Args, Debug, Clone)]
pub struct GitArgs {
    /// Git username.
    #[arg(long, env = "GIT_USERNAME")]
    pub username: Option<String>,

    /// Git password or API token.
    #[arg(long, env = "GIT_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Commit author name.
    #[arg(long, env = "GIT_AUTHOR_NAME", default_value = "gitopsctl")]
    pub git_user: String,

    /// Commit author email.
    #[arg(long, env = "GIT_AUTHOR_EMAIL", default_value = "gitopsctl@localhost")]
    pub git_email: String,

    /// Organisation or owner of the repository.
    #[arg(long)]
    pub organisation: String,

    /// Repository name.
    #[arg(long)]
    pub repository_name: String,

    /// Git provider.
    #[arg(long, default_value = "github")]
    pub git_provider: ProviderKind,

    /// Provider web URL (defaults to the provider's public URL).
    #[arg(long)]
    pub git_provider_url: Option<String>,
}

impl GitArgs {
    /// Provider web URL, falling back to the provider default.
    #[must_use]
    pub fn provider_url(&self) -> String {
        self.git_provider_url
            .clone()
            .unwrap_or_else(|| self.git_provider.default_url().to_string())
    }

    /// Clone and push credentials.
    #[must_use]
    pub fn credentials(&self) -> GitCredentials {
        GitCredentials {
            username: self.username.clone(),
            password: self.password.clone(),
        }
    }

    /// Commit author.
    #[must_use]
    pub fn author(&self) -> CommitAuthor {
        CommitAuthor {
            name: self.git_user.clone(),
            email: self.git_email.clone(),
        }
    }
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

/// Log line format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Human-readable log lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

fn parse_values(raw: &str) -> Result<Mapping, String> {
    serde_yaml::from_str::<Mapping>(raw).map_err(|e| format!("values must be a YAML mapping: {e}"))
}
