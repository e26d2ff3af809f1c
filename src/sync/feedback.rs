//! Feedback channel: the bot's outcome comments on the pull request.

use crate::config::Messages;
use crate::github::{GitHubApi, GitHubError};
use crate::models::{norm_login, PullRequestRef};

use super::SyncError;

pub struct Feedback<'a> {
    github: &'a dyn GitHubApi,
    messages: &'a Messages,
}

impl<'a> Feedback<'a> {
    pub fn new(github: &'a dyn GitHubApi, messages: &'a Messages) -> Self {
        Self { github, messages }
    }

    /// Delete the bot's previous outcome comments. Returns how many were removed.
    pub async fn prune(&self, target: &PullRequestRef) -> Result<usize, GitHubError> {
        let bot = norm_login(&self.github.bot_name().await?);
        let comments = self
            .github
            .list_comments(&target.org, &target.repo, target.number)
            .await?;

        let mut removed = 0;
        for comment in comments
            .iter()
            .filter(|c| norm_login(&c.user.login) == bot && self.messages.is_outcome(&c.body))
        {
            self.github
                .delete_comment(&target.org, &target.repo, comment.id)
                .await?;
            removed += 1;
        }

        if removed > 0 {
            tracing::debug!("Pruned {} stale comments on {}", removed, target);
        }
        Ok(removed)
    }

    pub async fn not_approved(&self, target: &PullRequestRef) -> Result<(), GitHubError> {
        self.post(target, self.messages.not_approved()).await
    }

    pub async fn success(&self, target: &PullRequestRef) -> Result<(), GitHubError> {
        self.post(target, self.messages.success()).await
    }

    pub async fn failure(&self, target: &PullRequestRef, error: &SyncError) -> Result<(), GitHubError> {
        self.post(target, &self.failure_body(error)).await
    }

    /// Drift is reported with its own template inside the failure message.
    pub fn failure_body(&self, error: &SyncError) -> String {
        let reason = match error {
            SyncError::DriftDetected(report) => self.messages.drift(&report.to_string()),
            other => other.to_string(),
        };
        self.messages.failure(&reason)
    }

    async fn post(&self, target: &PullRequestRef, body: &str) -> Result<(), GitHubError> {
        self.github
            .create_comment(&target.org, &target.repo, target.number, body)
            .await
    }
}
