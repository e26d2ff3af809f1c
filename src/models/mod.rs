//! Data models for the teams-sync service.
//!
//! Webhook payloads, GitHub resources, the TEAMS manifest and the classified
//! reconciliation events built from them.

mod event;
mod github;
mod manifest;
pub mod webhook;

pub use event::*;
pub use github::*;
pub use manifest::*;
pub use webhook::WebhookEvent;
