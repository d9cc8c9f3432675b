//! Drives one backport attempt per target branch.
//!
//! Each attempt walks `Created → CheckedOut → Replayed → Pushed →
//! ReviewRequested`. A failure before `Replayed` rolls the attempt back:
//! the origin branch is checked out again and the new branch is deleted.
//! Publishing failures leave the branch alone for manual recovery.

use crate::branch::BranchManager;
use crate::config::{Config, FailurePolicy};
use crate::errors::{BackportError, Result};
use crate::github::ReviewPlatform;
use crate::publish::Publisher;
use crate::replay::ReplayEngine;
use crate::repository::Repository;
use crate::resolver::BackportRequest;
use crate::runner::CommandRunner;
use serde::Serialize;


#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptState {
    Created,
    CheckedOut,
    Replayed,
    Pushed,
    ReviewRequested,
}

/// What happened to one target branch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetOutcome {
    pub target: String,
    pub branch: String,
    /// Last state reached, `None` if the branch could not be created
    pub state: Option<AttemptState>,
    pub error: Option<String>,
}

impl TargetOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackportReport {
    pub source: String,
    pub range_start: String,
    pub range_end: String,
    pub policy: FailurePolicy,
    /// In processing order; targets never attempted are absent
    pub outcomes: Vec<TargetOutcome>,
}

impl BackportReport {
    pub fn failed_targets(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|outcome| !outcome.succeeded())
            .map(|outcome| outcome.target.as_str())
            .collect()
    }
}

/// One target's trip through the state machine; dropped once the target is done
struct BackportAttempt<'r> {
    target: &'r str,
    new_branch: String,
    state: Option<AttemptState>,
}

impl<'r> BackportAttempt<'r> {
    fn advance(&mut self, state: AttemptState) {
        log::debug!("{}: {:?}", self.new_branch, state);
        self.state = Some(state);
    }

    fn into_outcome(self, error: Option<&BackportError>) -> TargetOutcome {
        TargetOutcome {
            target: self.target.to_string(),
            branch: self.new_branch,
            state: self.state,
            error: error.map(|e| e.to_string()),
        }
    }
}

pub struct Orchestrator<'a, R: CommandRunner, P: ReviewPlatform> {
    repo: &'a Repository<R>,
    platform: &'a P,
    config: &'a Config,
}

impl<'a, R: CommandRunner, P: ReviewPlatform> Orchestrator<'a, R, P> {
    pub fn new(repo: &'a Repository<R>, platform: &'a P, config: &'a Config) -> Self {
        Self {
            repo,
            platform,
            config,
        }
    }

    fn branches(&self) -> BranchManager<'a, R> {
        BranchManager::new(self.repo, &self.config.prefix)
    }

    fn replay_engine(&self) -> ReplayEngine<'a, R> {
        ReplayEngine::new(self.repo)
    }

    fn publisher(&self) -> Publisher<'a, R, P> {
        Publisher::new(self.repo, self.platform, &self.config.remote, &self.config.label)
    }

    /// Backport onto every target in order, one at a time.
    ///
    /// With `FailurePolicy::AbortAll` the first failure is returned and the
    /// remaining targets are not attempted. With `FailurePolicy::Continue`
    /// failures are recorded in the report and the run carries on.
    pub fn run(&self, request: &BackportRequest) -> Result<BackportReport> {
        let mut report = BackportReport {
            source: request.source_branch.clone(),
            range_start: request.range_start.to_string(),
            range_end: request.range_end.to_string(),
            policy: self.config.policy,
            outcomes: Vec::with_capacity(request.target_branches.len()),
        };

        for target in &request.target_branches {
            let mut attempt = BackportAttempt {
                target,
                new_branch: self.branches().branch_name(&request.source_branch, target),
                state: None,
            };

            match self.backport(request, &mut attempt) {
                Ok(()) => report.outcomes.push(attempt.into_outcome(None)),
                Err(e) => {
                    log::error!("❌ Backport onto {} failed: {}", target, e);
                    report.outcomes.push(attempt.into_outcome(Some(&e)));
                    if self.config.policy == FailurePolicy::AbortAll {
                        return Err(e);
                    }
                }
            }
        }

        if report.failed_targets().is_empty() {
            println!("Backporting complete.");
        }
        Ok(report)
    }

    fn backport(&self, request: &BackportRequest, attempt: &mut BackportAttempt) -> Result<()> {
        let branches = self.branches();
        let origin = &request.origin_branch;

        let new_branch = branches.create_branch(&request.source_branch, attempt.target)?;
        attempt.advance(AttemptState::Created);
        println!("New branch {} created.", new_branch);

        if let Err(e) = branches.checkout(&new_branch) {
            println!("*** Ensure your working tree is clean. ***");
            return Err(self.roll_back(&new_branch, origin, e));
        }
        attempt.advance(AttemptState::CheckedOut);

        if let Err(e) = self
            .replay_engine()
            .replay(request.range_start, request.range_end)
        {
            return Err(self.roll_back(&new_branch, origin, e));
        }
        attempt.advance(AttemptState::Replayed);
        println!(
            "Cherry picked {}..{} to branch {} based off of branch {}.",
            request.range_start, request.range_end, new_branch, attempt.target
        );

        let publisher = self.publisher();
        if let Err(e) = publisher.push(&new_branch) {
            log::warn!("Leaving unpushed branch '{}' for inspection", new_branch);
            return Err(self.go_home(origin, e));
        }
        attempt.advance(AttemptState::Pushed);
        println!("Changes pushed successfully.");

        if self.config.request_review {
            if let Err(e) = publisher.request_review(attempt.target, &new_branch) {
                log::warn!("Branch '{}' was pushed but has no pull request", new_branch);
                return Err(self.go_home(origin, e));
            }
            attempt.advance(AttemptState::ReviewRequested);
            println!("Pull request created for {}.", new_branch);
        } else {
            log::info!("⏭️  Skipping pull request for {} (--no-pr flag used)", new_branch);
        }

        branches.return_to(origin)
    }

    /// Undo an attempt that never got pushed.
    ///
    /// Returns `cause` when everything was undone, or a `Cleanup` error
    /// wrapping it when the branch could not be removed.
    fn roll_back(
        &self,
        new_branch: &str,
        origin: &str,
        cause: BackportError,
    ) -> BackportError {
        log::warn!("Rolling back '{}': {}", new_branch, cause);

        match self.clean_up(new_branch, origin) {
            Ok(()) => cause,
            Err(e) => {
                log::error!(
                    "Failed to clean up branch. please manually delete {}. Error: {}",
                    new_branch,
                    e
                );
                BackportError::Cleanup {
                    branch: new_branch.to_string(),
                    reason: e.to_string(),
                    cause: Box::new(cause),
                }
            }
        }
    }

    fn clean_up(&self, new_branch: &str, origin: &str) -> Result<()> {
        self.replay_engine().abort()?;
        let branches = self.branches();
        branches.return_to(origin)?;
        branches.delete_branch(new_branch)
    }

    /// Return to the origin branch after a publishing failure.
    ///
    /// The branch is kept either way; a failed checkout is folded into the
    /// error so the report says where the working copy was left.
    fn go_home(&self, origin: &str, cause: BackportError) -> BackportError {
        match self.branches().return_to(origin) {
            Ok(()) => cause,
            Err(e) => {
                log::error!("Could not return to '{}': {}", origin, e);
                BackportError::Stranded {
                    origin: origin.to_string(),
                    reason: e.to_string(),
                    cause: Box::new(cause),
                }
            }
        }
    }
}
