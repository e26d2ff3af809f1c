//! Authorization gate: only approved pull requests may reconcile.

use crate::models::CycleRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// An explicit command on a pull request that is not approved; answer with a notice.
    RejectedUnauthorized,
    /// Nothing to do and nothing to say.
    RejectedPassive,
    Proceed,
}

/// Decide whether a request may run a reconciliation cycle.
///
/// Only explicit commands ever complain; passive triggers stop silently.
pub fn authorize(request: &CycleRequest) -> GateDecision {
    let approved = request.approval.is_approved();

    match (request.is_explicit_command, request.triggered, approved) {
        // A comment that is not the command.
        (true, false, _) => GateDecision::RejectedPassive,
        (true, true, false) => GateDecision::RejectedUnauthorized,
        (false, _, false) => GateDecision::RejectedPassive,
        (false, false, true) => GateDecision::RejectedPassive,
        (_, true, true) => GateDecision::Proceed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PullRequestRef, ReviewState};

    fn request(approval: ReviewState, explicit: bool, triggered: bool) -> CycleRequest {
        CycleRequest {
            target: PullRequestRef {
                org: "acme".to_string(),
                repo: "org-config".to_string(),
                number: 1,
            },
            revision: "abc123".to_string(),
            approval,
            is_explicit_command: explicit,
            triggered,
        }
    }

    #[test]
    fn test_explicit_command_without_approval_is_unauthorized() {
        for state in [
            ReviewState::Pending,
            ReviewState::ChangesRequested,
            ReviewState::Commented,
            ReviewState::Dismissed,
        ] {
            assert_eq!(
                authorize(&request(state, true, true)),
                GateDecision::RejectedUnauthorized
            );
        }
    }

    #[test]
    fn test_passive_trigger_without_approval_is_silent() {
        assert_eq!(
            authorize(&request(ReviewState::Pending, false, true)),
            GateDecision::RejectedPassive
        );
    }

    #[test]
    fn test_non_command_comment_is_ignored_even_when_approved() {
        assert_eq!(
            authorize(&request(ReviewState::Approved, true, false)),
            GateDecision::RejectedPassive
        );
        assert_eq!(
            authorize(&request(ReviewState::Pending, true, false)),
            GateDecision::RejectedPassive
        );
    }

    #[test]
    fn test_approved_without_meaningful_transition_is_ignored() {
        assert_eq!(
            authorize(&request(ReviewState::Approved, false, false)),
            GateDecision::RejectedPassive
        );
    }

    #[test]
    fn test_approved_and_triggered_proceeds() {
        assert_eq!(
            authorize(&request(ReviewState::Approved, true, true)),
            GateDecision::Proceed
        );
        assert_eq!(
            authorize(&request(ReviewState::Approved, false, true)),
            GateDecision::Proceed
        );
    }
}
