//! Classifiers turning decoded deliveries into reconciliation events.

use crate::config::Messages;
use crate::github::{GitHubApi, GitHubError};
use crate::models::webhook::{IssueCommentEvent, PullRequestEvent, Repository, ReviewEvent};
use crate::models::{norm_login, PullRequestRef, ReconciliationEvent, ReviewState, WebhookEvent};

/// Classify a delivery. `Ok(None)` means the delivery is not about reconciliation.
///
/// Comments and lifecycle events carry no review state, so the pull request is
/// looked up for its current approval.
pub async fn classify(
    event: WebhookEvent,
    github: &dyn GitHubApi,
    messages: &Messages,
) -> Result<Option<ReconciliationEvent>, GitHubError> {
    match event {
        WebhookEvent::IssueComment(e) => classify_comment(e, github, messages).await,
        WebhookEvent::Review(e) => Ok(classify_review(e)),
        WebhookEvent::PullRequest(e) => classify_lifecycle(e, github).await,
    }
}

fn target(repository: &Repository, number: u64) -> PullRequestRef {
    PullRequestRef {
        org: repository.owner.login.clone(),
        repo: repository.name.clone(),
        number,
    }
}

async fn classify_comment(
    e: IssueCommentEvent,
    github: &dyn GitHubApi,
    messages: &Messages,
) -> Result<Option<ReconciliationEvent>, GitHubError> {
    if e.action != "created" {
        tracing::debug!("Ignoring comment action {}", e.action);
        return Ok(None);
    }
    if e.issue.pull_request.is_none() {
        tracing::debug!("Ignoring comment on issue #{}", e.issue.number);
        return Ok(None);
    }

    // Outcome comments posted by the bot must not start a cycle of their own.
    if norm_login(&e.comment.user.login) == norm_login(&github.bot_name().await?) {
        tracing::debug!("Ignoring comment by the bot on #{}", e.issue.number);
        return Ok(None);
    }

    let target = target(&e.repository, e.issue.number);
    let command_matched = messages.is_command(&e.comment.body);
    tracing::debug!(
        "Comment by {} on {} (command: {})",
        e.comment.user.login,
        target,
        command_matched
    );

    let status = github
        .pull_request(&target.org, &target.repo, target.number)
        .await?;

    Ok(Some(ReconciliationEvent::Comment {
        target,
        revision: status.head_sha,
        approval: status.approval,
        command_matched,
    }))
}

fn classify_review(e: ReviewEvent) -> Option<ReconciliationEvent> {
    let approval = match e.review.state.parse::<ReviewState>() {
        Ok(state) => state,
        Err(err) => {
            tracing::warn!("Ignoring review: {}", err);
            return None;
        }
    };

    if let Some(user) = &e.review.user {
        tracing::debug!("Review {} by {}", approval, user.login);
    }

    Some(ReconciliationEvent::Review {
        target: target(&e.repository, e.pull_request.number),
        revision: e.pull_request.head.sha,
        approval,
        action: e.action,
    })
}

async fn classify_lifecycle(
    e: PullRequestEvent,
    github: &dyn GitHubApi,
) -> Result<Option<ReconciliationEvent>, GitHubError> {
    if e.action == "closed" || e.pull_request.state == "closed" {
        tracing::debug!("Pull request action {} not applicable", e.action);
        return Ok(None);
    }

    let target = target(&e.repository, e.pull_request.number);
    tracing::debug!(
        "Pull request {} {} on branch {}",
        target,
        e.action,
        e.pull_request.head.ref_
    );

    let status = github
        .pull_request(&target.org, &target.repo, target.number)
        .await?;

    Ok(Some(ReconciliationEvent::LifecycleChange {
        target,
        revision: e.pull_request.head.sha,
        approval: status.approval,
        action: e.action,
    }))
}
