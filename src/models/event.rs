//! Reconciliation events: the classified form of an accepted delivery.

use std::fmt;
use std::str::FromStr;

/// Review-derived approval state of a pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReviewState {
    Approved,
    ChangesRequested,
    Pending,
    Dismissed,
    Commented,
}

impl ReviewState {
    pub fn is_approved(self) -> bool {
        self == ReviewState::Approved
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ReviewState::Approved => "APPROVED",
            ReviewState::ChangesRequested => "CHANGES_REQUESTED",
            ReviewState::Pending => "PENDING",
            ReviewState::Dismissed => "DISMISSED",
            ReviewState::Commented => "COMMENTED",
        }
    }
}

impl fmt::Display for ReviewState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReviewState {
    type Err = String;

    /// Case-insensitive; GitHub uses lowercase in webhooks and uppercase in the REST API.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "APPROVED" => Ok(ReviewState::Approved),
            "CHANGES_REQUESTED" => Ok(ReviewState::ChangesRequested),
            "PENDING" => Ok(ReviewState::Pending),
            "DISMISSED" => Ok(ReviewState::Dismissed),
            "COMMENTED" => Ok(ReviewState::Commented),
            other => Err(format!("unknown review state {:?}", other)),
        }
    }
}

/// The pull request a cycle reports back to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestRef {
    pub org: String,
    pub repo: String,
    pub number: u64,
}

impl fmt::Display for PullRequestRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}#{}", self.org, self.repo, self.number)
    }
}

/// One classified trigger. Every surface converges on [`CycleRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconciliationEvent {
    /// A comment on a pull request; approval looked up from the pull request.
    Comment {
        target: PullRequestRef,
        revision: String,
        approval: ReviewState,
        command_matched: bool,
    },
    /// A review was submitted or dismissed.
    Review {
        target: PullRequestRef,
        revision: String,
        approval: ReviewState,
        action: String,
    },
    /// Any other pull request transition (opened, synchronize, ...).
    LifecycleChange {
        target: PullRequestRef,
        revision: String,
        approval: ReviewState,
        action: String,
    },
}

/// Lifecycle actions after which the manifest may have changed.
const RESYNC_ACTIONS: &[&str] = &["opened", "reopened", "synchronize", "ready_for_review"];

/// Canonical fields consumed by the authorization gate and the reconciler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleRequest {
    pub target: PullRequestRef,
    pub revision: String,
    pub approval: ReviewState,
    pub is_explicit_command: bool,
    /// Comment: the command pattern matched. Passive triggers: the observed
    /// transition warrants a resync.
    pub triggered: bool,
}

impl ReconciliationEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            ReconciliationEvent::Comment { .. } => "comment",
            ReconciliationEvent::Review { .. } => "review",
            ReconciliationEvent::LifecycleChange { .. } => "lifecycle",
        }
    }

    pub fn target(&self) -> &PullRequestRef {
        match self {
            ReconciliationEvent::Comment { target, .. }
            | ReconciliationEvent::Review { target, .. }
            | ReconciliationEvent::LifecycleChange { target, .. } => target,
        }
    }

    pub fn into_request(self) -> CycleRequest {
        match self {
            ReconciliationEvent::Comment {
                target,
                revision,
                approval,
                command_matched,
            } => CycleRequest {
                target,
                revision,
                approval,
                is_explicit_command: true,
                triggered: command_matched,
            },
            ReconciliationEvent::Review {
                target,
                revision,
                approval,
                action,
            } => CycleRequest {
                triggered: approval.is_approved() && (action == "submitted" || action == "edited"),
                target,
                revision,
                approval,
                is_explicit_command: false,
            },
            ReconciliationEvent::LifecycleChange {
                target,
                revision,
                approval,
                action,
            } => CycleRequest {
                triggered: RESYNC_ACTIONS.contains(&action.as_str()),
                target,
                revision,
                approval,
                is_explicit_command: false,
            },
        }
    }
}
