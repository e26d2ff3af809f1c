//! Webhook endpoint.

use axum::{body::Bytes, extract::State, http::HeaderMap};
use serde::Serialize;

use super::{ApiResponse, ApiResult};
use crate::auth::{verify_signature, SIGNATURE_HEADER};
use crate::errors::AppError;
use crate::models::WebhookEvent;
use crate::AppState;

pub const EVENT_HEADER: &str = "x-github-event";
pub const DELIVERY_HEADER: &str = "x-github-delivery";

const ACK_MESSAGE: &str = "Event received. Have a nice day.";

/// Acknowledgement returned before any reconciliation work starts.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookAck {
    pub message: &'static str,
    pub delivery: String,
    /// Whether a cycle was submitted for this delivery
    pub queued: bool,
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// POST /teams-sync - Receive a GitHub webhook delivery.
pub async fn receive_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<WebhookAck> {
    let delivery = header(&headers, DELIVERY_HEADER)
        .unwrap_or("unknown")
        .to_string();

    if let Err(e) = verify_signature(
        &state.config.webhook_secret,
        &body,
        header(&headers, SIGNATURE_HEADER),
    ) {
        tracing::warn!("Rejected delivery {}: {}", delivery, e);
        return Err(e);
    }

    let Some(event_type) = header(&headers, EVENT_HEADER) else {
        return Err(AppError::BadRequest(format!("Missing {} header", EVENT_HEADER)));
    };

    let queued = match WebhookEvent::parse(event_type, &body)? {
        Some(event) => {
            tracing::info!("Event {} received (delivery {})", event_type, delivery);
            state.driver.submit(event_type, &delivery, event);
            true
        }
        None => {
            tracing::debug!("Skipping event of type {:?}", event_type);
            false
        }
    };

    Ok(ApiResponse::new(WebhookAck {
        message: ACK_MESSAGE,
        delivery,
        queued,
    }))
}
