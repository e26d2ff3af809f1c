//! GitHub collaborator: the team directory and the pull request conversation.
//!
//! The reconciliation core only talks to GitHub through [`GitHubApi`], so tests can
//! substitute an in-memory directory.

mod client;

pub use client::GitHubClient;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{IssueComment, MembersPage, PullRequestStatus, TeamRef};

#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("request to {path} failed: {source}")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{method} {path} returned {status}: {message}")]
    Status {
        method: String,
        path: String,
        status: u16,
        message: String,
    },

    #[error("unexpected response from {path}: {message}")]
    Decode { path: String, message: String },
}

#[async_trait]
pub trait GitHubApi: Send + Sync {
    /// Login of the account the service acts as.
    async fn bot_name(&self) -> Result<String, GitHubError>;

    /// Resolve a team by organization and slug; `None` when it does not exist.
    async fn team_by_slug(&self, org: &str, slug: &str) -> Result<Option<TeamRef>, GitHubError>;

    /// One page of a team's members. Pages start at 1.
    async fn team_members_page(&self, team: &TeamRef, page: u32)
        -> Result<MembersPage, GitHubError>;

    /// Whether `login` already holds an active or pending membership of `team`.
    async fn is_team_member(
        &self,
        org: &str,
        team: &TeamRef,
        login: &str,
    ) -> Result<bool, GitHubError>;

    /// Create or update a membership with the given role.
    async fn upsert_team_membership(
        &self,
        team: &TeamRef,
        login: &str,
        maintainer: bool,
    ) -> Result<(), GitHubError>;

    async fn create_comment(
        &self,
        org: &str,
        repo: &str,
        number: u64,
        body: &str,
    ) -> Result<(), GitHubError>;

    /// All comments on an issue or pull request.
    async fn list_comments(
        &self,
        org: &str,
        repo: &str,
        number: u64,
    ) -> Result<Vec<IssueComment>, GitHubError>;

    async fn delete_comment(&self, org: &str, repo: &str, id: u64) -> Result<(), GitHubError>;

    /// Head revision and review-derived approval state of a pull request.
    async fn pull_request(
        &self,
        org: &str,
        repo: &str,
        number: u64,
    ) -> Result<PullRequestStatus, GitHubError>;
}

/// Validate the cursor a page points at. `Ok(None)` ends the walk.
///
/// A cursor that does not move forward is rejected so a bad `Link` header cannot
/// loop forever.
pub fn next_cursor(what: &str, current: u32, next: Option<u32>) -> Result<Option<u32>, GitHubError> {
    match next {
        Some(next) if next <= current => Err(GitHubError::Decode {
            path: what.to_string(),
            message: format!("page {} links back to page {}", current, next),
        }),
        next => Ok(next),
    }
}
