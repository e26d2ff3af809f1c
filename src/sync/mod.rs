//! Team membership reconciliation.
//!
//! One cycle: classify the trigger, prune stale outcome comments, pass the
//! authorization gate, load the manifest at the triggering revision, snapshot the
//! directory, diff, add missing members, and report exactly one outcome.

mod cycle;
mod diff;
mod feedback;
mod gate;
mod gateway;
mod manifest;
mod reconciler;
mod snapshot;

pub use cycle::{CycleDriver, CycleOutcome};
pub use diff::diff;
pub use feedback::Feedback;
pub use gate::{authorize, GateDecision};
pub use gateway::classify;
pub use manifest::{ManifestError, ManifestLoader};
pub use reconciler::{ReconcileSummary, Reconciler};
pub use snapshot::{fetch_snapshots, TeamSnapshot};

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::github::GitHubError;

/// Members present remotely but not declared, keyed by team slug.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriftReport {
    pub teams: BTreeMap<String, Vec<String>>,
}

impl DriftReport {
    /// Record a team's undeclared members; empty lists are not recorded.
    pub fn record(&mut self, team: &str, logins: Vec<String>) {
        if !logins.is_empty() {
            self.teams.insert(team.to_string(), logins);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }
}

impl fmt::Display for DriftReport {
    /// `platform: [cara, dan]; web: [eve]`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .teams
            .iter()
            .map(|(team, logins)| format!("{}: [{}]", team, logins.join(", ")))
            .collect();
        f.write_str(&parts.join("; "))
    }
}

/// Why a cycle did not end in success.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error("team {team} not found in organization {org}")]
    TeamNotFound { org: String, team: String },

    #[error("directory query failed: {0}")]
    Directory(#[from] GitHubError),

    #[error("failed to add {login} to team {team}: {source}")]
    MembershipMutation {
        team: String,
        login: String,
        #[source]
        source: GitHubError,
    },

    /// Not an operation failure: some remote members are undeclared.
    #[error("undeclared members found: {0}")]
    DriftDetected(DriftReport),

    #[error("cycle exceeded its deadline of {0:?}")]
    Timeout(Duration),
}

impl SyncError {
    pub fn is_drift(&self) -> bool {
        matches!(self, SyncError::DriftDetected(_))
    }
}
