//! Webhook payloads for the event types the service reacts to.
//!
//! Only the fields the classifiers read are modelled; everything else in the
//! delivery is ignored by serde.

use serde::Deserialize;

use super::User;

pub const ISSUE_COMMENT: &str = "issue_comment";
pub const PULL_REQUEST_REVIEW: &str = "pull_request_review";
pub const PULL_REQUEST: &str = "pull_request";

#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub name: String,
    pub owner: User,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitRef {
    #[serde(rename = "ref")]
    pub ref_: String,
    pub sha: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    /// `open` or `closed`
    pub state: String,
    pub head: GitRef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Issue {
    pub number: u64,
    /// Present only on issues that are pull requests
    #[serde(default)]
    pub pull_request: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Comment {
    pub body: String,
    pub user: User,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IssueCommentEvent {
    pub action: String,
    pub issue: Issue,
    pub comment: Comment,
    pub repository: Repository,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Review {
    pub state: String,
    #[serde(default)]
    pub user: Option<User>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReviewEvent {
    pub action: String,
    pub review: Review,
    pub pull_request: PullRequest,
    pub repository: Repository,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestEvent {
    pub action: String,
    pub pull_request: PullRequest,
    pub repository: Repository,
}

/// A decoded delivery of a recognized event type.
#[derive(Debug, Clone)]
pub enum WebhookEvent {
    IssueComment(IssueCommentEvent),
    Review(ReviewEvent),
    PullRequest(PullRequestEvent),
}

impl WebhookEvent {
    /// Decode `payload` according to the `X-GitHub-Event` tag.
    ///
    /// Returns `Ok(None)` for event types the service does not handle.
    pub fn parse(event_type: &str, payload: &[u8]) -> Result<Option<Self>, serde_json::Error> {
        let event = match event_type {
            ISSUE_COMMENT => Self::IssueComment(serde_json::from_slice(payload)?),
            PULL_REQUEST_REVIEW => Self::Review(serde_json::from_slice(payload)?),
            PULL_REQUEST => Self::PullRequest(serde_json::from_slice(payload)?),
            _ => return Ok(None),
        };
        Ok(Some(event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_issue_comment() {
        let payload = json!({
            "action": "created",
            "issue": { "number": 7, "pull_request": { "url": "https://api.github.com/x" } },
            "comment": { "body": "/sync-teams", "user": { "login": "amy" } },
            "repository": { "name": "org-config", "owner": { "login": "acme" } }
        });
        let bytes = serde_json::to_vec(&payload).unwrap();

        let Some(WebhookEvent::IssueComment(event)) = WebhookEvent::parse(ISSUE_COMMENT, &bytes).unwrap()
        else {
            panic!("expected issue comment");
        };
        assert_eq!(event.issue.number, 7);
        assert!(event.issue.pull_request.is_some());
        assert_eq!(event.repository.owner.login, "acme");
    }

    #[test]
    fn test_unknown_event_type_is_ignored() {
        assert!(WebhookEvent::parse("push", b"{}").unwrap().is_none());
    }

    #[test]
    fn test_malformed_payload_is_an_error() {
        assert!(WebhookEvent::parse(PULL_REQUEST, b"{\"action\":1}").is_err());
    }
}
