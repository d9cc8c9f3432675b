use crate::{
    config::{Config, FailurePolicy},
    errors::{BackportError, Result},
    github::{GitHubCli, ReviewPlatform},
    orchestrator::{BackportReport, Orchestrator},
    repository::Repository,
    resolver::{parse_branches, validate_source, InputResolver},
    runner::{CommandRunner, ProcessRunner},
};
use clap::Args;

#[derive(Debug, Args)]
pub struct Backport {
    /// List of comma-separated branch names to backport to.
    /// Ex: branch/v6,branch/v7
    #[arg(long)]
    pub to: Option<String>,

    /// Branch with changes to backport
    #[arg(long)]
    pub from: Option<String>,

    /// Branch the source branch forked from [default: backport.trunk, main or master]
    #[arg(long)]
    pub trunk: Option<String>,

    /// Remote to push to [default: backport.remote or origin]
    #[arg(long)]
    pub remote: Option<String>,

    /// Label put on the pull requests [default: backport.label or backport]
    #[arg(long)]
    pub label: Option<String>,

    /// Push the branches without opening pull requests
    #[arg(long)]
    pub no_pr: bool,

    /// Keep going with the next branch when one fails
    #[arg(long)]
    pub continue_on_error: bool,

    /// Print a JSON report of every branch once done
    #[arg(long)]
    pub json: bool,
}

impl Backport {
    pub fn execute(&self, repo: &git2::Repository) -> Result<()> {
        let workdir = repo.workdir().ok_or_else(|| {
            BackportError::Configuration("cannot backport in a bare repository".to_string())
        })?;
        let config = self.config(Config::from_git(&repo.config()?));

        let repository = Repository::new(ProcessRunner::new(workdir));
        let github = GitHubCli::new(ProcessRunner::new(workdir));

        let report = run(
            &repository,
            &github,
            &config,
            self.from.as_deref(),
            self.to.as_deref(),
        )?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }

        let failed = report.failed_targets();
        if !failed.is_empty() {
            return Err(BackportError::Incomplete(failed.join(", ")));
        }
        Ok(())
    }

    /// Command line flags win over git configuration
    fn config(&self, mut config: Config) -> Config {
        if let Some(trunk) = &self.trunk {
            config.trunk = Some(trunk.clone());
        }
        if let Some(remote) = &self.remote {
            config.remote = remote.clone();
        }
        if let Some(label) = &self.label {
            config.label = label.clone();
        }
        if self.no_pr {
            config.request_review = false;
        }
        if self.continue_on_error {
            config.policy = FailurePolicy::Continue;
        }
        config
    }
}

/// Validate the inputs, resolve the request and backport onto every target.
///
/// Nothing in the repository changes before the inputs are known good.
pub fn run<R: CommandRunner, P: ReviewPlatform>(
    repo: &Repository<R>,
    platform: &P,
    config: &Config,
    from: Option<&str>,
    to: Option<&str>,
) -> Result<BackportReport> {
    parse_branches(to.unwrap_or_default())?;
    validate_source(from)?;

    if config.request_review && !platform.is_available()? {
        return Err(BackportError::Configuration(
            "GitHub CLI (gh) not found, install it from https://cli.github.com/ or pass --no-pr"
                .to_string(),
        ));
    }

    let trunk = config.resolve_trunk(repo)?;
    let request = InputResolver::new(repo).resolve(&trunk, from, to)?;

    Orchestrator::new(repo, platform, config).run(&request)
}
