//! In-memory stand-in for `git` and `gh`.
//!
//! `FakeRepo` implements `CommandRunner` by interpreting the handful of
//! commands the backport flow issues against a tiny model of a repository:
//! branches are lists of commit ids (oldest first), plus the current branch,
//! a dirty flag and the two ways a cherry-pick can be left stopped: a
//! conflict (index unmerged, `CHERRY_PICK_HEAD` written) or a sequencer-only
//! stop such as a merge commit picked without `-m`.

use crate::errors::Result;
use crate::runner::{CommandOutput, CommandRunner};
use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

/// A 40 character commit id made of a single repeated hex digit
pub fn sha(c: char) -> String {
    std::iter::repeat(c).take(40).collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewCall {
    pub base: String,
    pub head: String,
    pub label: String,
}

#[derive(Default)]
struct State {
    branches: BTreeMap<String, Vec<String>>,
    current: String,
    dirty: bool,
    conflicted: bool,
    sequencer: bool,
    conflicts_on: HashSet<String>,
    merges_on: HashSet<String>,
    failing: Vec<String>,
    gh_missing: bool,
    pushed: Vec<(String, String)>,
    reviews: Vec<ReviewCall>,
    calls: Vec<String>,
}

pub struct FakeRepo {
    state: Mutex<State>,
}

fn ok(stdout: impl Into<String>) -> CommandOutput {
    CommandOutput {
        stdout: stdout.into(),
        stderr: String::new(),
        success: true,
    }
}

fn fail(stderr: impl Into<String>) -> CommandOutput {
    CommandOutput {
        stdout: String::new(),
        stderr: stderr.into(),
        success: false,
    }
}

impl FakeRepo {
    /// A repository with only `current` checked out and no commits on it
    pub fn new(current: &str) -> Self {
        let mut state = State {
            current: current.to_string(),
            ..State::default()
        };
        state.branches.insert(current.to_string(), Vec::new());
        Self {
            state: Mutex::new(state),
        }
    }

    /// master: a, feature: a-b-c-d, release/v1: a-1, release/v2: a-2
    ///
    /// `work` is checked out and points at `a`.
    pub fn scenario() -> Self {
        let fake = Self::new("work");
        fake.add_branch("work", &['a']);
        fake.add_branch("master", &['a']);
        fake.add_branch("feature", &['a', 'b', 'c', 'd']);
        fake.add_branch("release/v1", &['a', '1']);
        fake.add_branch("release/v2", &['a', '2']);
        fake
    }

    pub fn add_branch(&self, name: &str, commits: &[char]) {
        let commits = commits.iter().map(|c| sha(*c)).collect();
        self.state.lock().unwrap().branches.insert(name.to_string(), commits);
    }

    pub fn set_dirty(&self, dirty: bool) {
        self.state.lock().unwrap().dirty = dirty;
    }

    /// Cherry-picks onto `branch` stop with a conflict
    pub fn conflict_on(&self, branch: &str) {
        self.state
            .lock()
            .unwrap()
            .conflicts_on
            .insert(branch.to_string());
    }

    /// Cherry-picks onto `branch` stop at a merge commit, leaving only the
    /// sequencer state behind
    pub fn stop_on_merge(&self, branch: &str) {
        self.state
            .lock()
            .unwrap()
            .merges_on
            .insert(branch.to_string());
    }

    /// Whether a stopped cherry-pick is still waiting for `--continue` or `--abort`
    pub fn sequencer_pending(&self) -> bool {
        self.state.lock().unwrap().sequencer
    }

    /// Every command line starting with `prefix` exits non-zero
    pub fn fail_command(&self, prefix: &str) {
        self.state.lock().unwrap().failing.push(prefix.to_string());
    }

    pub fn detach(&self) {
        self.state.lock().unwrap().current = "HEAD".to_string();
    }

    pub fn without_gh(&self) {
        self.state.lock().unwrap().gh_missing = true;
    }

    pub fn current(&self) -> String {
        self.state.lock().unwrap().current.clone()
    }

    pub fn branch(&self, name: &str) -> Option<Vec<String>> {
        self.state.lock().unwrap().branches.get(name).cloned()
    }

    pub fn branch_names(&self) -> Vec<String> {
        self.state.lock().unwrap().branches.keys().cloned().collect()
    }

    pub fn pushed(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().pushed.clone()
    }

    pub fn reviews(&self) -> Vec<ReviewCall> {
        self.state.lock().unwrap().reviews.clone()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Commands that change refs, the work tree or the remote
    pub fn mutations(&self) -> Vec<String> {
        const MUTATING: [&str; 6] = [
            "git branch",
            "git checkout",
            "git cherry-pick",
            "git push",
            "gh pr create",
            "git reset",
        ];
        self.calls()
            .into_iter()
            .filter(|call| MUTATING.iter().any(|m| call.starts_with(m)))
            .collect()
    }
}

impl State {
    /// Commits reachable from `end` but not from `start`, oldest first.
    ///
    /// Picked commits keep their ids here, so `end` is looked up on the
    /// branch where it appears earliest: the one it was written on.
    fn range(&self, start: &str, end: &str) -> Option<Vec<String>> {
        let (end_index, history) = self
            .branches
            .values()
            .filter_map(|commits| commits.iter().position(|c| c == end).map(|i| (i, commits)))
            .min_by_key(|(i, _)| *i)?;
        let reachable = &history[..=end_index];
        let from = reachable
            .iter()
            .position(|c| c == start)
            .map(|i| i + 1)
            .unwrap_or(0);
        Some(reachable[from..].to_vec())
    }

    fn git(&mut self, args: &[&str]) -> CommandOutput {
        match args {
            ["rev-parse", "--abbrev-ref", "HEAD"] => ok(format!("{}\n", self.current)),
            ["rev-parse", "--verify", "--quiet", reference] => {
                let name = reference.trim_start_matches("refs/heads/");
                match self.branches.get(name).and_then(|c| c.last()) {
                    Some(head) => ok(format!("{}\n", head)),
                    None => fail(""),
                }
            }
            ["merge-base", left, right] => {
                let (Some(left), Some(right)) = (self.branches.get(*left), self.branches.get(*right))
                else {
                    return fail("fatal: Not a valid object name");
                };
                match left.iter().zip(right).take_while(|(l, r)| l == r).last() {
                    Some((base, _)) => ok(format!("{}\n", base)),
                    None => fail(""),
                }
            }
            ["log", "-n", "1", "--pretty=format:%H", branch] => {
                match self.branches.get(*branch) {
                    Some(commits) => ok(commits.last().cloned().unwrap_or_default()),
                    None => fail(format!(
                        "fatal: ambiguous argument '{}': unknown revision",
                        branch
                    )),
                }
            }
            ["status", "--porcelain", "--untracked-files=no"] => {
                ok(if self.dirty { " M src/lib.rs\n" } else { "" })
            }
            ["branch", "-D", name] => {
                if *name == self.current {
                    return fail(format!(
                        "error: Cannot delete branch '{}' checked out",
                        name
                    ));
                }
                match self.branches.remove(*name) {
                    Some(_) => ok(format!("Deleted branch {}\n", name)),
                    None => fail(format!("error: branch '{}' not found.", name)),
                }
            }
            ["branch", name, base] => {
                if self.branches.contains_key(*name) {
                    return fail(format!("fatal: a branch named '{}' already exists", name));
                }
                match self.branches.get(*base).cloned() {
                    Some(commits) => {
                        self.branches.insert(name.to_string(), commits);
                        ok("")
                    }
                    None => fail(format!("fatal: not a valid object name: '{}'", base)),
                }
            }
            ["checkout", branch] => {
                if self.conflicted {
                    return fail("error: you need to resolve your current index first");
                }
                if !self.branches.contains_key(*branch) {
                    return fail(format!(
                        "error: pathspec '{}' did not match any file(s) known to git",
                        branch
                    ));
                }
                if self.dirty && *branch != self.current {
                    return fail("error: Your local changes to the following files would be overwritten by checkout");
                }
                self.current = branch.to_string();
                ok("")
            }
            ["rev-list", "--reverse", range] => {
                let Some((start, end)) = range.split_once("..") else {
                    return fail("fatal: bad revision");
                };
                match self.range(start, end) {
                    Some(commits) => ok(commits.iter().map(|c| format!("{}\n", c)).collect::<String>()),
                    None => fail(format!("fatal: bad revision '{}'", range)),
                }
            }
            ["cherry-pick", "--abort"] => {
                if !self.sequencer {
                    return fail("error: no cherry-pick or revert in progress");
                }
                self.sequencer = false;
                self.conflicted = false;
                ok("")
            }
            ["cherry-pick", range] => {
                if self.sequencer {
                    return fail("error: cherry-pick is already in progress\nhint: try \"git cherry-pick (--continue | --abort | --quit)\"");
                }
                if self.merges_on.contains(&self.current) {
                    self.sequencer = true;
                    return fail(format!(
                        "error: commit {} is a merge but no -m option was given.\nfatal: cherry-pick failed",
                        sha('m')
                    ));
                }
                if self.conflicts_on.contains(&self.current) {
                    self.sequencer = true;
                    self.conflicted = true;
                    return CommandOutput {
                        stdout: "CONFLICT (content): Merge conflict in src/lib.rs\n".to_string(),
                        stderr: "error: could not apply".to_string(),
                        success: false,
                    };
                }
                let Some((start, end)) = range.split_once("..") else {
                    return fail("fatal: bad revision");
                };
                let Some(commits) = self.range(start, end) else {
                    return fail(format!("fatal: bad revision '{}'", range));
                };
                let current = self.current.clone();
                if let Some(branch) = self.branches.get_mut(&current) {
                    branch.extend(commits);
                }
                ok("")
            }
            ["push", "--set-upstream", remote, branch] => {
                if !self.branches.contains_key(*branch) {
                    return fail(format!("error: src refspec {} does not match any", branch));
                }
                self.pushed.push((remote.to_string(), branch.to_string()));
                ok("")
            }
            _ => fail(format!("fake git does not understand: {}", args.join(" "))),
        }
    }

    fn gh(&mut self, args: &[&str]) -> CommandOutput {
        match args {
            ["--version"] => ok("gh version 2.40.0\n"),
            ["pr", "create", "--fill", "--label", label, "--base", base, "--head", head] => {
                self.reviews.push(ReviewCall {
                    base: base.to_string(),
                    head: head.to_string(),
                    label: label.to_string(),
                });
                ok(format!(
                    "https://github.com/acme/widget/pull/{}\n",
                    self.reviews.len()
                ))
            }
            _ => fail(format!("fake gh does not understand: {}", args.join(" "))),
        }
    }
}

impl CommandRunner for FakeRepo {
    fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput> {
        let mut state = self.state.lock().unwrap();
        let line = format!("{} {}", program, args.join(" "));
        state.calls.push(line.clone());

        if program == "gh" && state.gh_missing {
            return Err(std::io::Error::new(std::io::ErrorKind::NotFound, "gh: not found").into());
        }
        if state.failing.iter().any(|prefix| line.starts_with(prefix.as_str())) {
            return Ok(fail(format!("injected failure: {}", line)));
        }

        Ok(match program {
            "git" => state.git(args),
            "gh" => state.gh(args),
            _ => fail(format!("{}: command not found", program)),
        })
    }
}
