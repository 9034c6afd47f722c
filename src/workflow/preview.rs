//! Preview environment creation and update.

use std::fmt;

use serde::Serialize;
use tracing::info;

use crate::config::{GITOPS_CONFIG_FILE, GitOpsConfigParser, PreviewIdHasher};
use crate::error::Result;
use crate::git::{MAIN_BRANCH, RepositoryFactory};
use crate::preview::{EnvironmentState, PreviewEnvironment, PreviewMaterializer, ReplacementResolver};

/// Steps of the preview workflow, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewStep {
    /// Check out the application repository at the git hash.
    CheckoutApp,
    /// Read `.gitops.config.yaml`.
    LoadConfig,
    /// Check out the config repository on the main branch.
    CheckoutConfigRepo,
    /// Locate the preview template.
    ResolveTemplatePath,
    /// Create the environment folder.
    Materialize,
    /// Write the replacement values.
    ApplyReplacements,
    /// Commit the changes.
    Commit,
    /// Push the main branch.
    Push,
}

impl fmt::Display for PreviewStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CheckoutApp => "checkout app",
            Self::LoadConfig => "load config",
            Self::CheckoutConfigRepo => "checkout config repo",
            Self::ResolveTemplatePath => "resolve template path",
            Self::Materialize => "materialize",
            Self::ApplyReplacements => "apply replacements",
            Self::Commit => "commit",
            Self::Push => "push",
        };
        write!(f, "{name}")
    }
}

/// Result of a preview workflow run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PreviewOutcome {
    /// The environment already holds these values. Nothing was pushed.
    AlreadyUpToDate {
        /// Application git hash the environment was checked against.
        git_hash: String,
    },
    /// An existing environment was updated and pushed.
    ExistingUpdated {
        /// Resolved route host, if a `ROUTE_HOST` rule exists.
        route_host: Option<String>,
        /// Environment folder.
        folder: String,
    },
    /// A new environment was created and pushed.
    NewCreated {
        /// Resolved route host, if a `ROUTE_HOST` rule exists.
        route_host: Option<String>,
        /// Environment folder.
        folder: String,
    },
}

/// Creates or updates the preview environment of an application commit.
///
/// The application repository is checked out at the requested hash to read
/// its `.gitops.config.yaml`; the config repository named there is mutated
/// on its main branch.
pub struct PreviewWorkflow<'a> {
    factory: &'a dyn RepositoryFactory,
    organisation: String,
    repository: String,
    parser: GitOpsConfigParser,
    hasher: PreviewIdHasher,
    materializer: PreviewMaterializer,
    resolver: ReplacementResolver,
}

impl<'a> PreviewWorkflow<'a> {
    /// Creates a workflow for the application repository `organisation/repository`.
    #[must_use]
    pub fn new(
        factory: &'a dyn RepositoryFactory,
        organisation: impl Into<String>,
        repository: impl Into<String>,
    ) -> Self {
        Self {
            factory,
            organisation: organisation.into(),
            repository: repository.into(),
            parser: GitOpsConfigParser::new(),
            hasher: PreviewIdHasher::new(),
            materializer: PreviewMaterializer::new(),
            resolver: ReplacementResolver::new(),
        }
    }

    /// Runs the workflow for `git_hash` under `preview_id`.
    ///
    /// # Errors
    ///
    /// Stops at the first failing step. Both checkouts are released either way.
    pub fn run(&self, git_hash: &str, preview_id: &str) -> Result<PreviewOutcome> {
        step(PreviewStep::CheckoutApp);
        let mut app = self.factory.open(&self.organisation, &self.repository)?;
        app.checkout(git_hash)?;
        info!("App repo git hash {git_hash} checkout successful");

        step(PreviewStep::LoadConfig);
        let config = self.parser.load_file(app.resolve_path(GITOPS_CONFIG_FILE))?;
        info!("Read {GITOPS_CONFIG_FILE}: {config}");

        step(PreviewStep::CheckoutConfigRepo);
        let mut root = self
            .factory
            .open(&config.team_config_org, &config.team_config_repo)?;
        root.checkout(MAIN_BRANCH)?;
        info!("Config repo branch {MAIN_BRANCH} checkout successful");

        step(PreviewStep::ResolveTemplatePath);
        let env = PreviewEnvironment::new(&self.hasher, &config.application_name, preview_id);
        self.materializer.ensure_template(root.as_ref(), &env)?;
        let state = env.state(root.as_ref());
        info!("Preview folder {env} state: {state:?}");

        if state == EnvironmentState::New {
            step(PreviewStep::Materialize);
            self.materializer.materialize(root.as_mut(), &env, git_hash)?;
        }

        step(PreviewStep::ApplyReplacements);
        let resolved = self
            .resolver
            .resolve(&config, git_hash, &env.hashed_preview_id)?;
        let changes = self.resolver.apply(root.as_ref(), &env, &resolved)?;

        if changes.is_empty() {
            info!("The image tag {git_hash} has already been deployed. Doing nothing.");
            return Ok(PreviewOutcome::AlreadyUpToDate {
                git_hash: git_hash.to_string(),
            });
        }

        step(PreviewStep::Commit);
        root.commit(&format!(
            "Update preview environment for '{}' and git hash '{git_hash}'.",
            config.application_name
        ))?;

        step(PreviewStep::Push);
        root.push(MAIN_BRANCH)?;
        info!("Pushed branch {MAIN_BRANCH}");

        let folder = env.folder_name;
        let route_host = resolved.route_host;
        Ok(match state {
            EnvironmentState::Exists => PreviewOutcome::ExistingUpdated { route_host, folder },
            EnvironmentState::New => PreviewOutcome::NewCreated { route_host, folder },
        })
    }
}

fn step(step: PreviewStep) {
    info!("Preview step: {step}");
}
