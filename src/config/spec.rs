//! Configuration specification types for `.gitops.config.yaml`.
//!
//! The file layout nests the values under `deploymentConfig` and
//! `previewConfig`; [`GitOpsConfig`] is the flattened, immutable form the
//! workflows consume.

use serde::Deserialize;
use std::fmt;

/// Placeholder in the route host template that is replaced by the hashed preview id.
pub const ROUTE_HOST_PLACEHOLDER: &str = "{SHA256_8CHAR_BRANCH_HASH}";

/// Name of the configuration file inside the application repository.
pub const GITOPS_CONFIG_FILE: &str = ".gitops.config.yaml";

/// Configuration of an application, as read from its repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitOpsConfig {
    /// Application name, used for template lookup and preview folder names.
    pub application_name: String,
    /// Organisation owning the team config repository.
    pub team_config_org: String,
    /// Name of the team config repository.
    pub team_config_repo: String,
    /// Route host template containing [`ROUTE_HOST_PLACEHOLDER`].
    pub route_host_template: Option<String>,
    /// Replacement rules, in declared order.
    pub replacements: Vec<ReplacementRule>,
}

/// Binds a variable to a dotted key path in the preview `values.yaml`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ReplacementRule {
    /// Dotted YAML key path.
    pub path: String,
    /// Variable whose value is written to `path`.
    pub variable: ReplacementVariable,
}

/// Variables a replacement rule can refer to.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(from = "String")]
pub enum ReplacementVariable {
    /// The application git hash the preview is built from.
    GitCommit,
    /// The route host resolved from the template.
    RouteHost,
    /// Any other name. Rules with unknown variables are skipped.
    Unknown(String),
}

impl From<String> for ReplacementVariable {
    fn from(name: String) -> Self {
        match name.as_str() {
            "GIT_COMMIT" => Self::GitCommit,
            "ROUTE_HOST" => Self::RouteHost,
            _ => Self::Unknown(name),
        }
    }
}

impl fmt::Display for ReplacementVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GitCommit => write!(f, "GIT_COMMIT"),
            Self::RouteHost => write!(f, "ROUTE_HOST"),
            Self::Unknown(name) => write!(f, "{name}"),
        }
    }
}

impl fmt::Display for GitOpsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (config repo {}/{}, {} replacement(s))",
            self.application_name,
            self.team_config_org,
            self.team_config_repo,
            self.replacements.len()
        )
    }
}

/// On-disk layout of `.gitops.config.yaml`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GitOpsConfigFile {
    pub(crate) deployment_config: DeploymentSection,
    pub(crate) preview_config: PreviewSection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DeploymentSection {
    pub(crate) org: String,
    pub(crate) repository: String,
    pub(crate) application_name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PreviewSection {
    #[serde(default)]
    pub(crate) route: Option<RouteSection>,
    pub(crate) replace: Vec<ReplacementRule>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RouteSection {
    pub(crate) host: HostSection,
}

#[derive(Debug, Deserialize)]
pub(crate) struct HostSection {
    pub(crate) template: String,
}

impl From<GitOpsConfigFile> for GitOpsConfig {
    fn from(file: GitOpsConfigFile) -> Self {
        Self {
            application_name: file.deployment_config.application_name,
            team_config_org: file.deployment_config.org,
            team_config_repo: file.deployment_config.repository,
            route_host_template: file.preview_config.route.map(|r| r.host.template),
            replacements: file.preview_config.replace,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variable_names() {
        assert_eq!(
            ReplacementVariable::from(String::from("GIT_COMMIT")),
            ReplacementVariable::GitCommit
        );
        assert_eq!(
            ReplacementVariable::from(String::from("ROUTE_HOST")),
            ReplacementVariable::RouteHost
        );
        let unknown = ReplacementVariable::from(String::from("BUILD_NUMBER"));
        assert_eq!(unknown.to_string(), "BUILD_NUMBER");
    }
}
