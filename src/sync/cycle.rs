//! Cycle driver: the single entry point every trigger converges on.
//!
//! It is also the only component that posts outcome comments; everything below
//! it returns errors.

use std::sync::Arc;
use std::time::Duration;

use tracing::Instrument;

use crate::config::Messages;
use crate::github::{GitHubApi, GitHubError};
use crate::models::{CycleRequest, WebhookEvent};

use super::{
    authorize, classify, fetch_snapshots, Feedback, GateDecision, ManifestLoader,
    ReconcileSummary, Reconciler, SyncError,
};

/// How a delivery was handled.
#[derive(Debug)]
pub enum CycleOutcome {
    /// The delivery was not about reconciliation.
    Ignored,
    /// Stopped at the authorization gate.
    Rejected(GateDecision),
    Synced(ReconcileSummary),
    /// A failure comment was posted for this error.
    Failed(SyncError),
}

pub struct CycleDriver {
    github: Arc<dyn GitHubApi>,
    loader: ManifestLoader,
    messages: Messages,
    timeout: Duration,
}

impl CycleDriver {
    pub fn new(
        github: Arc<dyn GitHubApi>,
        loader: ManifestLoader,
        messages: Messages,
        timeout: Duration,
    ) -> Self {
        Self {
            github,
            loader,
            messages,
            timeout,
        }
    }

    /// Run a delivery in the background. Nobody observes the result; it is only logged.
    pub fn submit(self: &Arc<Self>, event_type: &str, delivery: &str, event: WebhookEvent) {
        let span = tracing::info_span!(
            "cycle",
            event = %event_type,
            delivery = %delivery,
            org = tracing::field::Empty,
            repo = tracing::field::Empty,
            pr = tracing::field::Empty,
        );
        let driver = Arc::clone(self);

        tokio::spawn(
            async move {
                match driver.handle(event).await {
                    Ok(outcome) => tracing::info!("Cycle finished: {}", describe(&outcome)),
                    Err(e) => tracing::error!("Cycle aborted: {}", e),
                }
            }
            .instrument(span),
        );
    }

    /// Handle one delivery end to end.
    ///
    /// `Err` means the conversation with GitHub itself failed (lookup, prune or
    /// comment); reconciliation failures are reported as [`CycleOutcome::Failed`].
    pub async fn handle(&self, event: WebhookEvent) -> Result<CycleOutcome, GitHubError> {
        let Some(event) = classify(event, self.github.as_ref(), &self.messages).await? else {
            return Ok(CycleOutcome::Ignored);
        };

        let span = tracing::Span::current();
        let target = event.target();
        span.record("org", target.org.as_str());
        span.record("repo", target.repo.as_str());
        span.record("pr", target.number);
        tracing::info!("Handling {} event", event.kind());

        let request = event.into_request();
        let feedback = Feedback::new(self.github.as_ref(), &self.messages);

        feedback.prune(&request.target).await.inspect_err(|e| {
            tracing::error!("Failed to prune comments: {}", e);
        })?;

        match authorize(&request) {
            GateDecision::Proceed => {}
            GateDecision::RejectedUnauthorized => {
                tracing::warn!("{}", self.messages.not_approved());
                feedback.not_approved(&request.target).await?;
                return Ok(CycleOutcome::Rejected(GateDecision::RejectedUnauthorized));
            }
            GateDecision::RejectedPassive => {
                tracing::debug!(
                    "Will not trigger (approval {}, triggered {})",
                    request.approval,
                    request.triggered
                );
                return Ok(CycleOutcome::Rejected(GateDecision::RejectedPassive));
            }
        }

        let result = match tokio::time::timeout(self.timeout, self.sync(&request)).await {
            Ok(result) => result,
            Err(_) => Err(SyncError::Timeout(self.timeout)),
        };

        match result {
            Ok(summary) => {
                feedback.success(&request.target).await?;
                Ok(CycleOutcome::Synced(summary))
            }
            Err(e) => {
                tracing::error!("Failed to sync teams: {}", e);
                feedback.failure(&request.target, &e).await?;
                Ok(CycleOutcome::Failed(e))
            }
        }
    }

    /// Load, snapshot, diff and apply additions.
    async fn sync(&self, request: &CycleRequest) -> Result<ReconcileSummary, SyncError> {
        let target = &request.target;

        let manifest = self
            .loader
            .load(&target.org, &target.repo, &request.revision)
            .await?;
        let snapshots = fetch_snapshots(self.github.as_ref(), &target.org, &manifest).await?;

        Reconciler::new(self.github.as_ref(), &target.org)
            .reconcile(&snapshots)
            .await?
            .into_result()
    }
}

fn describe(outcome: &CycleOutcome) -> String {
    match outcome {
        CycleOutcome::Ignored => "ignored".to_string(),
        CycleOutcome::Rejected(decision) => format!("rejected ({:?})", decision),
        CycleOutcome::Synced(summary) => format!("synced, {} members added", summary.added.len()),
        CycleOutcome::Failed(e) if e.is_drift() => format!("drift reported: {}", e),
        CycleOutcome::Failed(e) => format!("failed: {}", e),
    }
}
