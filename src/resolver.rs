use crate::errors::{BackportError, Result};
use crate::repository::{parse_commit, Repository};
use crate::runner::CommandRunner;
use git2::Oid;

/// Everything needed to backport, resolved once before any branch is touched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackportRequest {
    /// Branches to backport to, in the order given
    pub target_branches: Vec<String>,
    /// Branch to pick the commits from
    pub source_branch: String,
    /// Merge base of the source branch and trunk, excluded from the replay
    pub range_start: Oid,
    /// Head of the source branch, included in the replay
    pub range_end: Oid,
    /// Branch checked out when the run started, restored after every target
    pub origin_branch: String,
}

/// Parse the comma separated list of branches to backport to.
///
/// One empty entry rejects the whole list.
pub fn parse_branches(input: &str) -> Result<Vec<String>> {
    if input.trim().is_empty() {
        return Err(BackportError::Configuration(
            "must supply branches to backport to".to_string(),
        ));
    }

    input
        .split(',')
        .map(|branch| {
            let branch = branch.trim();
            if branch.is_empty() {
                Err(BackportError::Configuration(format!(
                    "received an empty branch name in '{}'",
                    input
                )))
            } else {
                Ok(branch.to_string())
            }
        })
        .collect()
}

pub fn validate_source(source: Option<&str>) -> Result<String> {
    match source.map(str::trim) {
        Some(source) if !source.is_empty() => Ok(source.to_string()),
        _ => Err(BackportError::Configuration(
            "must supply branch with changes to backport".to_string(),
        )),
    }
}

pub struct InputResolver<'a, R: CommandRunner> {
    repo: &'a Repository<R>,
}

impl<'a, R: CommandRunner> InputResolver<'a, R> {
    pub fn new(repo: &'a Repository<R>) -> Self {
        Self { repo }
    }

    pub fn resolve(
        &self,
        trunk: &str,
        source: Option<&str>,
        targets: Option<&str>,
    ) -> Result<BackportRequest> {
        let target_branches = parse_branches(targets.unwrap_or_default())?;
        let source_branch = validate_source(source)?;

        let range_start = self.merge_base(trunk, &source_branch)?;
        let range_end = self.head_of(&source_branch)?;
        if range_start == range_end {
            return Err(BackportError::Precondition(format!(
                "there are no changes to backport: '{}' has no commits ahead of '{}'",
                source_branch, trunk
            )));
        }

        let origin_branch = self.current_branch()?;

        log::info!(
            "Backporting {}..{} from '{}' onto {}",
            range_start,
            range_end,
            source_branch,
            target_branches.join(", ")
        );

        Ok(BackportRequest {
            target_branches,
            source_branch,
            range_start,
            range_end,
            origin_branch,
        })
    }

    /// Most recent commit shared by `trunk` and `branch`
    pub fn merge_base(&self, trunk: &str, branch: &str) -> Result<Oid> {
        let output = self.repo.git(&["merge-base", trunk, branch])?;
        parse_commit(&output.stdout).ok_or_else(|| BackportError::Resolution {
            what: "merge base",
            branch: branch.to_string(),
            reason: format!("no common commit with '{}': {}", trunk, output.diagnostic()),
        })
    }

    pub fn head_of(&self, branch: &str) -> Result<Oid> {
        let output = self
            .repo
            .git(&["log", "-n", "1", "--pretty=format:%H", branch])?;
        parse_commit(&output.stdout).ok_or_else(|| BackportError::Resolution {
            what: "head commit",
            branch: branch.to_string(),
            reason: output.diagnostic(),
        })
    }

    fn current_branch(&self) -> Result<String> {
        let branch = self.repo.current_branch()?;
        if branch.is_empty() || branch == "HEAD" {
            return Err(BackportError::Resolution {
                what: "current branch",
                branch: "HEAD".to_string(),
                reason: "HEAD is detached, check out a branch to return to".to_string(),
            });
        }
        Ok(branch)
    }
}
