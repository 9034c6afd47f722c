//! gitopsctl CLI entrypoint.
//!
//! This is the main entrypoint for the gitopsctl command-line tool.

use std::io::Write;
use std::process::ExitCode;

use gitopsctl::cli::{Cli, Commands, GitArgs, LogFormat, OutputFormatter};
use gitopsctl::error::Result;
use gitopsctl::git::Git2RepositoryFactory;
use gitopsctl::planner::CommitMode;
use gitopsctl::provider::create_provider;
use gitopsctl::workflow::{DeployRequest, DeployWorkflow, PreviewWorkflow};

use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Main entrypoint.
fn main() -> ExitCode {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose, cli.log_format);

    // Workflows are sequential; one thread is enough for the provider client
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initializes the logging system.
fn init_logging(verbose: bool, format: LogFormat) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

/// Main async entry point.
async fn run(cli: Cli) -> Result<()> {
    let formatter = OutputFormatter::new(cli.output);

    match cli.command {
        Commands::Deploy {
            git,
            file,
            values,
            create_pr,
            auto_merge,
            single_commit,
            commit_message,
        } => {
            let request = DeployRequest {
                file,
                values,
                create_pr,
                auto_merge,
                commit_mode: CommitMode::from_options(single_commit, commit_message),
            };
            cmd_deploy(&git, request, &formatter).await
        }
        Commands::CreatePreview {
            git,
            git_hash,
            preview_id,
        } => cmd_create_preview(&git, &git_hash, &preview_id, &formatter),
    }
}

/// Deploy values into a config repository.
async fn cmd_deploy(git: &GitArgs, request: DeployRequest, formatter: &OutputFormatter) -> Result<()> {
    let provider_url = git.provider_url();
    debug!(
        "Deploying {} value(s) to {}/{} via {provider_url}",
        request.values.len(),
        git.organisation,
        git.repository_name
    );

    let factory = repository_factory(git);
    let provider = create_provider(
        git.git_provider,
        &provider_url,
        git.password.clone(),
        &git.organisation,
        &git.repository_name,
    )?;

    let outcome = DeployWorkflow::new(
        &factory,
        provider.as_ref(),
        git.organisation.as_str(),
        git.repository_name.as_str(),
    )
    .run(&request)
    .await?;

    print(&formatter.format_deploy(&outcome))
}

/// Create or update a preview environment.
fn cmd_create_preview(
    git: &GitArgs,
    git_hash: &str,
    preview_id: &str,
    formatter: &OutputFormatter,
) -> Result<()> {
    let factory = repository_factory(git);

    let outcome = PreviewWorkflow::new(
        &factory,
        git.organisation.as_str(),
        git.repository_name.as_str(),
    )
    .run(git_hash, preview_id)?;

    print(&formatter.format_preview(&outcome))
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Creates the clone factory from the git options.
fn repository_factory(git: &GitArgs) -> Git2RepositoryFactory {
    Git2RepositoryFactory::new(git.provider_url(), git.credentials(), git.author())
}

/// Writes command output to stdout.
fn print(output: &str) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(output.as_bytes())?;
    if !output.ends_with('\n') {
        stdout.write_all(b"\n")?;
    }
    Ok(())
}
