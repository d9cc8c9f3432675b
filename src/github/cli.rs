use crate::errors::{BackportError, Result};
use crate::runner::CommandRunner;

/// Where review requests are opened
pub trait ReviewPlatform {
    fn is_available(&self) -> Result<bool>;
    /// Open a review request for `head` against `base`, title and body
    /// filled from the commits. Returns whatever the platform printed,
    /// usually the URL.
    fn create_review(&self, base: &str, head: &str, label: &str) -> Result<String>;
}

/// `gh`, using the credentials in ~/.config/gh/hosts.yml
pub struct GitHubCli<R: CommandRunner> {
    runner: R,
}

impl<R: CommandRunner> GitHubCli<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    fn run_command(&self, args: &[&str]) -> Result<String> {
        let output = self.runner.run("gh", args).map_err(|e| {
            BackportError::Publish {
                branch: String::new(),
                reason: format!("Failed to execute gh command: {}", e),
            }
        })?;

        if !output.success {
            return Err(BackportError::Publish {
                branch: String::new(),
                reason: output.diagnostic(),
            });
        }

        Ok(output.stdout)
    }
}

impl<R: CommandRunner> ReviewPlatform for GitHubCli<R> {
    fn is_available(&self) -> Result<bool> {
        match self.runner.run("gh", &["--version"]) {
            Ok(output) => Ok(output.success),
            Err(_) => Ok(false),
        }
    }

    fn create_review(&self, base: &str, head: &str, label: &str) -> Result<String> {
        log::info!("Creating PR: {} → {} (label \"{}\")", head, base, label);

        let stdout = self
            .run_command(&[
                "pr", "create",
                "--fill",
                "--label", label,
                "--base", base,
                "--head", head,
            ])
            .map_err(|e| match e {
                BackportError::Publish { reason, .. } => BackportError::Publish {
                    branch: head.to_string(),
                    reason: format!(
                        "failed to create a pull request against {}: {}. Open up a pull request on github.com",
                        base, reason
                    ),
                },
                other => other,
            })?;

        let result = if !stdout.trim().is_empty() {
            stdout.trim().to_string()
        } else {
            format!("Created PR for {}", head)
        };

        log::info!("✅ {}", result);
        Ok(result)
    }
}
