//! Outcome comment templates and the `/sync-teams` command pattern.

use regex::Regex;

const SUCCESS: &str = "Teams were synced";
const FAILURE_PREFIX: &str = "Failed to sync Teams: ";
const DRIFT_PREFIX: &str = "Some users are on the organization but are not declared on the file, please remove them manually or update the file: ";
const NOT_APPROVED: &str = "Your pull request is not approved yet";
const COMMAND_PATTERN: &str = r"(?mi)^\s*/sync-teams\s*$";

/// Immutable set of bot messages, built once at start-up.
#[derive(Debug, Clone)]
pub struct Messages {
    success: String,
    failure_prefix: String,
    drift_prefix: String,
    not_approved: String,
    command: Regex,
}

impl Messages {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            success: SUCCESS.to_string(),
            failure_prefix: FAILURE_PREFIX.to_string(),
            drift_prefix: DRIFT_PREFIX.to_string(),
            not_approved: NOT_APPROVED.to_string(),
            command: Regex::new(COMMAND_PATTERN)?,
        })
    }

    pub fn success(&self) -> &str {
        &self.success
    }

    pub fn not_approved(&self) -> &str {
        &self.not_approved
    }

    /// ``Failed to sync Teams: `<reason>` ``
    pub fn failure(&self, reason: &str) -> String {
        format!("{}`{}`", self.failure_prefix, reason)
    }

    pub fn drift(&self, mapping: &str) -> String {
        format!("{}{}", self.drift_prefix, mapping)
    }

    /// True when any line of `body` is exactly the reconciliation command.
    pub fn is_command(&self, body: &str) -> bool {
        self.command.is_match(body)
    }

    /// True when `body` was produced from one of the outcome templates.
    pub fn is_outcome(&self, body: &str) -> bool {
        let body = body.trim();
        body == self.success
            || body == self.not_approved
            || body.starts_with(&self.failure_prefix)
            || body.starts_with(&self.drift_prefix)
    }
}
