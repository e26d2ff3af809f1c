//! Directory snapshot: actual membership of every team in the manifest.

use crate::github::{next_cursor, GitHubApi, GitHubError};
use crate::models::{Manifest, MemberDeclaration, TeamRef};

use super::SyncError;

/// One team's declared and actual membership, fetched at one point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamSnapshot {
    pub team: TeamRef,
    pub declared: Vec<MemberDeclaration>,
    pub actual: Vec<String>,
}

/// Resolve every manifest team and read its complete member list.
///
/// Fails on the first team the organization does not have; nothing has been
/// mutated at that point.
pub async fn fetch_snapshots(
    github: &dyn GitHubApi,
    org: &str,
    manifest: &Manifest,
) -> Result<Vec<TeamSnapshot>, SyncError> {
    let mut snapshots = Vec::with_capacity(manifest.teams.len());

    for declaration in &manifest.teams {
        let Some(team) = github.team_by_slug(org, &declaration.name).await? else {
            tracing::error!("Team {} not found in {}", declaration.name, org);
            return Err(SyncError::TeamNotFound {
                org: org.to_string(),
                team: declaration.name.clone(),
            });
        };

        let actual = list_all_members(github, &team).await?;
        tracing::debug!("Team {} (id {}) has {} members", team.slug, team.id, actual.len());

        snapshots.push(TeamSnapshot {
            team,
            declared: declaration.members.clone(),
            actual,
        });
    }

    Ok(snapshots)
}

/// Walk every page; a truncated list would report real members as drift.
async fn list_all_members(github: &dyn GitHubApi, team: &TeamRef) -> Result<Vec<String>, GitHubError> {
    let mut logins = Vec::new();
    let mut page = Some(1);

    while let Some(current) = page {
        let result = github.team_members_page(team, current).await?;
        logins.extend(result.logins);
        page = next_cursor(&format!("team {} members", team.slug), current, result.next)?;
    }

    Ok(logins)
}
