use crate::errors::{BackportError, Result};
use crate::repository::{parse_commit, Repository};
use crate::runner::CommandRunner;
use git2::Oid;

/// Range expression covering the commits after `start` up to and including `end`
pub fn range_expression(start: Oid, end: Oid) -> String {
    format!("{}..{}", start, end)
}

/// Cherry-picks a commit range onto whatever branch is checked out
pub struct ReplayEngine<'a, R: CommandRunner> {
    repo: &'a Repository<R>,
}

impl<'a, R: CommandRunner> ReplayEngine<'a, R> {
    pub fn new(repo: &'a Repository<R>) -> Self {
        Self { repo }
    }

    /// Commits in `start..end`, oldest first
    pub fn commits_in_range(&self, start: Oid, end: Oid) -> Result<Vec<Oid>> {
        let range = range_expression(start, end);
        let output = self.repo.git(&["rev-list", "--reverse", &range])?;
        if !output.success {
            return Err(BackportError::Replay {
                branch: self.repo.current_branch()?,
                range,
                reason: output.diagnostic(),
            });
        }

        Ok(output.stdout.lines().filter_map(parse_commit).collect())
    }

    /// Replay `start..end`, returning how many commits were applied.
    ///
    /// On failure the cherry-pick may be left in progress; call
    /// [`Self::abort`] before switching branches.
    pub fn replay(&self, start: Oid, end: Oid) -> Result<usize> {
        if start == end {
            return Err(BackportError::Precondition(
                "there are no changes to backport".to_string(),
            ));
        }

        let commits = self.commits_in_range(start, end)?;
        if commits.is_empty() {
            return Err(BackportError::Precondition(format!(
                "there are no changes to backport in {}",
                range_expression(start, end)
            )));
        }

        let branch = self.repo.current_branch()?;
        let range = range_expression(start, end);
        log::info!(
            "Cherry-picking {} commit(s) from {} onto '{}'",
            commits.len(),
            range,
            branch
        );

        let output = self.repo.git(&["cherry-pick", &range])?;
        if !output.success {
            log::error!("Cherry-pick of {} onto '{}' failed", range, branch);
            return Err(BackportError::Replay {
                branch,
                range,
                reason: output.diagnostic(),
            });
        }

        Ok(commits.len())
    }

    /// Abandon a stopped cherry-pick, if there is one.
    ///
    /// A range stops either on a conflict (`CHERRY_PICK_HEAD` present) or
    /// before a commit it cannot pick at all, such as a merge, which only
    /// leaves the sequencer behind. `--abort` clears both, so it is always
    /// run and "nothing in progress" counts as done.
    pub fn abort(&self) -> Result<()> {
        let output = self.repo.git(&["cherry-pick", "--abort"])?;
        if output.success {
            log::info!("Aborted cherry-pick in progress");
            return Ok(());
        }

        let diagnostic = output.diagnostic();
        if diagnostic.contains("no cherry-pick or revert in progress") {
            return Ok(());
        }

        Err(BackportError::Command(format!(
            "failed to abort cherry-pick: {}",
            diagnostic
        )))
    }
}
