use crate::errors::{BackportError, Result};
use crate::repository::Repository;
use crate::runner::CommandRunner;
use serde::Serialize;

pub const DEFAULT_REMOTE: &str = "origin";
pub const DEFAULT_LABEL: &str = "backport";
pub const DEFAULT_PREFIX: &str = "auto-backport";

/// What to do with the remaining targets once one of them fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    #[default]
    AbortAll,
    Continue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// `None` means detect `main` or `master`
    pub trunk: Option<String>,
    pub remote: String,
    pub label: String,
    pub prefix: String,
    pub policy: FailurePolicy,
    pub request_review: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            trunk: None,
            remote: DEFAULT_REMOTE.to_string(),
            label: DEFAULT_LABEL.to_string(),
            prefix: DEFAULT_PREFIX.to_string(),
            policy: FailurePolicy::AbortAll,
            request_review: true,
        }
    }
}

impl Config {
    /// Read the `backport.*` keys, falling back to defaults for missing ones
    pub fn from_git(config: &git2::Config) -> Self {
        let defaults = Self::default();
        let read = |key: &str| config.get_string(key).ok().filter(|v| !v.trim().is_empty());

        Self {
            trunk: read("backport.trunk"),
            remote: read("backport.remote").unwrap_or(defaults.remote),
            label: read("backport.label").unwrap_or(defaults.label),
            prefix: read("backport.prefix").unwrap_or(defaults.prefix),
            ..defaults
        }
    }

    /// The trunk branch the merge-base is computed against
    pub fn resolve_trunk<R: CommandRunner>(&self, repo: &Repository<R>) -> Result<String> {
        if let Some(trunk) = &self.trunk {
            return Ok(trunk.clone());
        }

        for candidate in ["main", "master"] {
            if repo.branch_exists(candidate)? {
                log::debug!("Using '{}' as trunk branch", candidate);
                return Ok(candidate.to_string());
            }
        }

        Err(BackportError::Configuration(
            "cannot find a trunk branch (neither 'main' nor 'master' exists), set backport.trunk or pass --trunk".to_string(),
        ))
    }
}
