use crate::errors::{BackportError, Result};
use crate::repository::Repository;
use crate::runner::CommandRunner;

/// Name of the branch holding the backport of `source` onto `target`.
///
/// Pure on its inputs, so a rerun before cleanup collides with the branch
/// left behind instead of creating a second one.
pub fn backport_branch_name(prefix: &str, source: &str, target: &str) -> String {
    format!("{}/{}/{}", prefix, target, source)
}

pub struct BranchManager<'a, R: CommandRunner> {
    repo: &'a Repository<R>,
    prefix: &'a str,
}

impl<'a, R: CommandRunner> BranchManager<'a, R> {
    pub fn new(repo: &'a Repository<R>, prefix: &'a str) -> Self {
        Self { repo, prefix }
    }

    pub fn branch_name(&self, source: &str, target: &str) -> String {
        backport_branch_name(self.prefix, source, target)
    }

    /// Create the backport branch at the tip of `target` without checking it out
    pub fn create_branch(&self, source: &str, target: &str) -> Result<String> {
        let name = self.branch_name(source, target);
        let output = self.repo.git(&["branch", &name, target])?;
        if !output.success {
            return Err(BackportError::Precondition(format!(
                "failed to create branch {} from {}: {}",
                name,
                target,
                output.diagnostic()
            )));
        }

        log::info!("Created branch '{}' from '{}'", name, target);
        Ok(name)
    }

    /// Check out `branch`; the working tree must be clean
    pub fn checkout(&self, branch: &str) -> Result<()> {
        if !self.repo.is_clean()? {
            return Err(BackportError::Precondition(format!(
                "working tree has uncommitted changes, cannot check out {}",
                branch
            )));
        }

        let output = self.repo.git(&["checkout", branch])?;
        if !output.success {
            return Err(BackportError::Precondition(format!(
                "failed to check out {}: {}",
                branch,
                output.diagnostic()
            )));
        }

        log::debug!("Checked out '{}'", branch);
        Ok(())
    }

    /// Go back to `branch`, doing nothing if it is already checked out.
    ///
    /// No cleanliness check: this is the way home after a failure, and git
    /// itself still refuses to overwrite local changes.
    pub fn return_to(&self, branch: &str) -> Result<()> {
        if self.repo.current_branch()? == branch {
            return Ok(());
        }

        let output = self.repo.git(&["checkout", branch])?;
        if !output.success {
            return Err(BackportError::Command(format!(
                "failed to return to {}: {}",
                branch,
                output.diagnostic()
            )));
        }

        log::debug!("Returned to '{}'", branch);
        Ok(())
    }

    /// Force delete, unmerged commits included
    pub fn delete_branch(&self, name: &str) -> Result<()> {
        let output = self.repo.git(&["branch", "-D", name])?;
        if !output.success {
            return Err(BackportError::Command(format!(
                "failed to delete branch {}: {}",
                name,
                output.diagnostic()
            )));
        }

        log::info!("Deleted branch '{}'", name);
        Ok(())
    }
}
