use crate::errors::{BackportError, Result};
use crate::runner::{CommandOutput, CommandRunner};
use git2::Oid;
use regex::Regex;

/// The one working copy every component operates on.
///
/// The checked-out branch and the work tree are process wide, so exactly one
/// handle exists per run and it is lent to each component in turn.
pub struct Repository<R: CommandRunner> {
    runner: R,
}

impl<R: CommandRunner> Repository<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    /// Run git, returning the output whatever the exit status
    pub fn git(&self, args: &[&str]) -> Result<CommandOutput> {
        self.runner.run("git", args)
    }

    /// Run git and turn a non-zero exit into `BackportError::Command`
    pub fn git_checked(&self, args: &[&str]) -> Result<String> {
        let output = self.git(args)?;
        if !output.success {
            return Err(BackportError::Command(format!(
                "git {}: {}",
                args.join(" "),
                output.diagnostic()
            )));
        }
        Ok(output.stdout)
    }

    pub fn current_branch(&self) -> Result<String> {
        let stdout = self.git_checked(&["rev-parse", "--abbrev-ref", "HEAD"])?;
        Ok(stdout.trim().to_string())
    }

    pub fn branch_exists(&self, branch: &str) -> Result<bool> {
        let reference = format!("refs/heads/{}", branch);
        Ok(self
            .git(&["rev-parse", "--verify", "--quiet", &reference])?
            .success)
    }

    /// Tracked files only; untracked files never block a checkout
    pub fn is_clean(&self) -> Result<bool> {
        let stdout = self.git_checked(&["status", "--porcelain", "--untracked-files=no"])?;
        Ok(stdout.trim().is_empty())
    }
}

/// Extract the first full commit id from command output.
///
/// Anything that is not a 40 character lowercase hex id counts as not found.
pub fn parse_commit(input: &str) -> Option<Oid> {
    let re = Regex::new(r"\b([a-f0-9]{40})\b").ok()?;
    let hash = re.captures(input)?.get(1)?;
    Oid::from_str(hash.as_str()).ok()
}
