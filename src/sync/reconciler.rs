//! Reconciler: add declared members, never remove, report drift.

use crate::github::GitHubApi;

use super::{diff, DriftReport, SyncError, TeamSnapshot};

/// What one reconciliation pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    /// `(team slug, login)` pairs that were upserted
    pub added: Vec<(String, String)>,
    /// Declared members found already present when re-checked
    pub already_members: Vec<(String, String)>,
    pub drift: DriftReport,
}

impl ReconcileSummary {
    /// Drift turns an otherwise complete pass into a reported failure.
    /// Additions already made are kept.
    pub fn into_result(self) -> Result<Self, SyncError> {
        if self.drift.is_empty() {
            Ok(self)
        } else {
            Err(SyncError::DriftDetected(self.drift))
        }
    }
}

pub struct Reconciler<'a> {
    github: &'a dyn GitHubApi,
    org: &'a str,
}

impl<'a> Reconciler<'a> {
    pub fn new(github: &'a dyn GitHubApi, org: &'a str) -> Self {
        Self { github, org }
    }

    /// Apply additions for every team, in manifest order.
    ///
    /// The first failed upsert aborts the pass; members added before it stay added.
    pub async fn reconcile(&self, snapshots: &[TeamSnapshot]) -> Result<ReconcileSummary, SyncError> {
        let mut summary = ReconcileSummary::default();

        for snapshot in snapshots {
            let team = &snapshot.team;
            let result = diff(&snapshot.declared, &snapshot.actual);

            for member in &result.to_add {
                if self.github.is_team_member(self.org, team, &member.login).await? {
                    tracing::info!("{} is already member of {}", member.login, team.slug);
                    summary
                        .already_members
                        .push((team.slug.clone(), member.login.clone()));
                    continue;
                }

                self.github
                    .upsert_team_membership(team, &member.login, member.is_maintainer)
                    .await
                    .map_err(|source| {
                        tracing::error!("Failed to add {} to {}: {}", member.login, team.slug, source);
                        SyncError::MembershipMutation {
                            team: team.slug.clone(),
                            login: member.login.clone(),
                            source,
                        }
                    })?;

                tracing::info!(
                    "Added {} to {} (maintainer: {})",
                    member.login,
                    team.slug,
                    member.is_maintainer
                );
                summary.added.push((team.slug.clone(), member.login.clone()));
            }

            if !result.drift_logins.is_empty() {
                tracing::warn!(
                    "Team {} has undeclared members: {}",
                    team.slug,
                    result.drift_logins.join(", ")
                );
            }
            summary.drift.record(&team.slug, result.drift_logins);
        }

        Ok(summary)
    }
}
