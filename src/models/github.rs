//! GitHub REST resources consumed by the reconciliation core.

use serde::Deserialize;

use super::ReviewState;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct User {
    pub login: String,
}

/// Resolved identity of a remote team.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct TeamRef {
    pub id: u64,
    pub slug: String,
    #[serde(default)]
    pub name: String,
}

/// One page of a team's member list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembersPage {
    pub logins: Vec<String>,
    /// Page number to request next, `None` on the last page
    pub next: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct IssueComment {
    pub id: u64,
    pub body: String,
    pub user: User,
}

/// Head revision and approval state of a pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestStatus {
    pub head_sha: String,
    pub approval: ReviewState,
}

/// Normalize a login for comparisons: case-folded, without a leading `@`.
pub fn norm_login(login: &str) -> String {
    login.trim().trim_start_matches('@').to_lowercase()
}
