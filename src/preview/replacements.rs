//! Resolution and application of preview replacement rules.

use serde_yaml::Value;
use tracing::{info, warn};

use crate::config::{GitOpsConfig, ROUTE_HOST_PLACEHOLDER, ReplacementVariable};
use crate::error::{GitOpsError, Result};
use crate::git::GitRepository;
use crate::planner::{ChangeSet, ValueChange};
use crate::yaml::{ValuePatcher, render_value};

use super::environment::PreviewEnvironment;

const VALUES_FILE: &str = "values.yaml";

/// A replacement rule with its concrete value.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedValue {
    /// Dotted key path in the preview `values.yaml`.
    pub path: String,
    /// Value to write.
    pub value: Value,
}

/// Output of [`ReplacementResolver::resolve`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedReplacements {
    /// Values in declared rule order. Unknown rules are absent.
    pub values: Vec<ResolvedValue>,
    /// Route host, if a `ROUTE_HOST` rule was resolved.
    pub route_host: Option<String>,
}

/// Maps replacement rules to values and writes them into an environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReplacementResolver {
    patcher: ValuePatcher,
}

impl ReplacementResolver {
    /// Creates a new resolver.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            patcher: ValuePatcher::new(),
        }
    }

    /// Resolves every rule of `config`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a `ROUTE_HOST` rule is present but
    /// no route host template is configured.
    pub fn resolve(
        &self,
        config: &GitOpsConfig,
        git_hash: &str,
        hashed_preview_id: &str,
    ) -> Result<ResolvedReplacements> {
        let mut resolved = ResolvedReplacements::default();

        for rule in &config.replacements {
            let value = match &rule.variable {
                ReplacementVariable::GitCommit => git_hash.to_string(),
                ReplacementVariable::RouteHost => {
                    let template = config.route_host_template.as_deref().ok_or_else(|| {
                        GitOpsError::configuration(format!(
                            "Replacement '{}' uses ROUTE_HOST but no route host template is configured",
                            rule.path
                        ))
                    })?;
                    let host = template.replace(ROUTE_HOST_PLACEHOLDER, hashed_preview_id);
                    info!("Created route host: {host}");
                    resolved.route_host = Some(host.clone());
                    host
                }
                ReplacementVariable::Unknown(name) => {
                    warn!("Unknown replacement variable '{name}' for {}, skipping", rule.path);
                    continue;
                }
            };

            resolved.values.push(ResolvedValue {
                path: rule.path.clone(),
                value: Value::String(value),
            });
        }

        Ok(resolved)
    }

    /// Writes resolved values into the environment's `values.yaml`.
    ///
    /// Returns the values that actually changed, in order.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a key path is missing from the file.
    pub fn apply(
        &self,
        repo: &dyn GitRepository,
        env: &PreviewEnvironment,
        resolved: &ResolvedReplacements,
    ) -> Result<ChangeSet> {
        let values_file = env.file(VALUES_FILE);
        let path = repo.resolve_path(&values_file);
        let mut changes = ChangeSet::new();

        for entry in &resolved.values {
            let changed = self
                .patcher
                .set_if_different(&path, &entry.path, &entry.value)
                .map_err(|e| match e {
                    GitOpsError::KeyPathNotFound { key_path, .. } => GitOpsError::configuration(
                        format!("Key '{key_path}' not found in '{values_file}'"),
                    ),
                    other => other,
                })?;

            info!(
                "Replacing property {} with value: {}",
                entry.path,
                render_value(&entry.value)
            );
            if changed {
                changes.record(ValueChange::new(entry.path.clone(), entry.value.clone()));
            }
        }

        Ok(changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PreviewIdHasher, ReplacementRule};
    use crate::git::RepositoryFactory;
    use crate::testing::FakeRemotes;

    fn rule(path: &str, variable: &str) -> ReplacementRule {
        ReplacementRule {
            path: path.to_string(),
            variable: ReplacementVariable::from(variable.to_string()),
        }
    }

    fn config(template: Option<&str>, rules: Vec<ReplacementRule>) -> GitOpsConfig {
        GitOpsConfig {
            application_name: String::from("myapp"),
            team_config_org: String::from("team-org"),
            team_config_repo: String::from("team-config"),
            route_host_template: template.map(String::from),
            replacements: rules,
        }
    }

    #[test]
    fn test_resolve_in_declared_order() {
        let config = config(
            Some("{SHA256_8CHAR_BRANCH_HASH}.example.com"),
            vec![
                rule("route.host", "ROUTE_HOST"),
                rule("build.number", "BUILD_NUMBER"),
                rule("image.tag", "GIT_COMMIT"),
            ],
        );

        let resolved = ReplacementResolver::new()
            .resolve(&config, "abc123", "f390bbc4")
            .unwrap();

        assert_eq!(resolved.route_host.as_deref(), Some("f390bbc4.example.com"));
        assert_eq!(
            resolved.values,
            vec![
                ResolvedValue {
                    path: String::from("route.host"),
                    value: Value::from("f390bbc4.example.com"),
                },
                ResolvedValue {
                    path: String::from("image.tag"),
                    value: Value::from("abc123"),
                },
            ]
        );
    }

    #[test]
    fn test_route_host_without_template() {
        let config = config(None, vec![rule("route.host", "ROUTE_HOST")]);
        let err = ReplacementResolver::new()
            .resolve(&config, "abc123", "f390bbc4")
            .unwrap_err();
        assert!(matches!(err, GitOpsError::Configuration(_)));
    }

    #[test]
    fn test_git_commit_only_needs_no_template() {
        let config = config(None, vec![rule("image.tag", "GIT_COMMIT")]);
        let resolved = ReplacementResolver::new()
            .resolve(&config, "abc123", "f390bbc4")
            .unwrap();
        assert_eq!(resolved.route_host, None);
        assert_eq!(resolved.values.len(), 1);
    }

    #[test]
    fn test_apply_records_only_changes() {
        let remotes = FakeRemotes::new().with_file(
            "team-org/team-config",
            "myapp-f390bbc4-preview/values.yaml",
            "image:\n  tag: abc123\nroute:\n  host: old.example.com\n",
        );
        let repo = remotes.open("team-org", "team-config").unwrap();
        let env = PreviewEnvironment::new(&PreviewIdHasher::new(), "myapp", "pr-42");
        let resolver = ReplacementResolver::new();
        let resolved = resolver
            .resolve(
                &config(
                    Some("{SHA256_8CHAR_BRANCH_HASH}.example.com"),
                    vec![rule("image.tag", "GIT_COMMIT"), rule("route.host", "ROUTE_HOST")],
                ),
                "abc123",
                "f390bbc4",
            )
            .unwrap();

        let changes = resolver.apply(repo.as_ref(), &env, &resolved).unwrap();

        assert_eq!(changes.len(), 1);
        let change = changes.single().unwrap();
        assert_eq!(change.key_path, "route.host");
        assert_eq!(change.new_value, Value::from("f390bbc4.example.com"));

        let again = resolver.apply(repo.as_ref(), &env, &resolved).unwrap();
        assert!(again.is_empty());
    }

    #[test]
    fn test_apply_missing_key() {
        let remotes = FakeRemotes::new().with_file(
            "team-org/team-config",
            "myapp-f390bbc4-preview/values.yaml",
            "image:\n  tag: latest\n",
        );
        let repo = remotes.open("team-org", "team-config").unwrap();
        let env = PreviewEnvironment::new(&PreviewIdHasher::new(), "myapp", "pr-42");
        let resolved = ResolvedReplacements {
            values: vec![ResolvedValue {
                path: String::from("ingress.host"),
                value: Value::from("x"),
            }],
            route_host: None,
        };

        let err = ReplacementResolver::new()
            .apply(repo.as_ref(), &env, &resolved)
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Configuration error: Key 'ingress.host' not found in 'myapp-f390bbc4-preview/values.yaml'"
        );
    }
}
