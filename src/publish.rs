use crate::errors::{BackportError, Result};
use crate::github::ReviewPlatform;
use crate::repository::Repository;
use crate::runner::CommandRunner;

/// Pushes backport branches and asks for them to be reviewed
pub struct Publisher<'a, R: CommandRunner, P: ReviewPlatform> {
    repo: &'a Repository<R>,
    platform: &'a P,
    remote: &'a str,
    label: &'a str,
}

impl<'a, R: CommandRunner, P: ReviewPlatform> Publisher<'a, R, P> {
    pub fn new(repo: &'a Repository<R>, platform: &'a P, remote: &'a str, label: &'a str) -> Self {
        Self {
            repo,
            platform,
            remote,
            label,
        }
    }

    /// Push `branch` to the remote and track it
    pub fn push(&self, branch: &str) -> Result<()> {
        log::info!("pushing {}:{}", self.remote, branch);

        let output = self
            .repo
            .git(&["push", "--set-upstream", self.remote, branch])?;
        if !output.success {
            return Err(BackportError::Publish {
                branch: branch.to_string(),
                reason: format!("failed to push to {}: {}", self.remote, output.diagnostic()),
            });
        }

        log::info!("{}:{} pushed", self.remote, branch);
        Ok(())
    }

    pub fn request_review(&self, base: &str, head: &str) -> Result<String> {
        self.platform.create_review(base, head, self.label)
    }
}
