//! Configuration module for the teams-sync service.
//!
//! All configuration is loaded from environment variables with sensible defaults.
//! Secrets may be given inline or through a `*_FILE` variable pointing at a mounted file.

mod messages;

pub use messages::Messages;

use std::env;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

/// Errors raised while loading configuration at start-up.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },

    #[error("failed to read {var} file {path}: {source}")]
    SecretFile {
        var: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("webhook secret is empty")]
    EmptyWebhookSecret,

    #[error("invalid command pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Shared secret used to verify `X-Hub-Signature-256`
    pub webhook_secret: String,
    /// Token used for the GitHub API and for fetching repositories
    pub github_token: Option<String>,
    /// GitHub REST API base URL
    pub github_api_url: String,
    /// Base URL repositories are fetched from (`{base}/{org}/{repo}.git`)
    pub git_base_url: String,
    /// Parent directory for scoped working copies
    pub workdir: PathBuf,
    /// Relative path of the manifest inside the repository
    pub manifest_file: PathBuf,
    /// Deadline for one reconciliation cycle
    pub cycle_timeout: Duration,
    /// Timeout for a single GitHub API request
    pub http_timeout: Duration,
    /// Log mutating calls instead of performing them
    pub dry_run: bool,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Outcome comment templates and the command pattern
    pub messages: Messages,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let bind_addr = parse_var("TEAMS_SYNC_BIND_ADDR", "0.0.0.0:8888")?;

        let webhook_secret = secret_var(
            "TEAMS_SYNC_WEBHOOK_SECRET",
            "TEAMS_SYNC_WEBHOOK_SECRET_FILE",
            Some("/etc/webhook/hmac"),
        )?
        .ok_or(ConfigError::EmptyWebhookSecret)?;
        if webhook_secret.is_empty() {
            return Err(ConfigError::EmptyWebhookSecret);
        }

        let github_token = secret_var(
            "TEAMS_SYNC_GITHUB_TOKEN",
            "TEAMS_SYNC_GITHUB_TOKEN_FILE",
            None,
        )?;

        let github_api_url = env::var("TEAMS_SYNC_GITHUB_API_URL")
            .unwrap_or_else(|_| "https://api.github.com".to_string())
            .trim_end_matches('/')
            .to_string();

        let git_base_url = env::var("TEAMS_SYNC_GIT_BASE_URL")
            .unwrap_or_else(|_| "https://github.com".to_string())
            .trim_end_matches('/')
            .to_string();

        let workdir = env::var("TEAMS_SYNC_WORKDIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| env::temp_dir());

        let manifest_file = env::var("TEAMS_SYNC_MANIFEST_FILE")
            .unwrap_or_else(|_| "TEAMS".to_string())
            .into();

        let cycle_timeout =
            Duration::from_secs(parse_var("TEAMS_SYNC_CYCLE_TIMEOUT_SECS", "300")?);
        let http_timeout = Duration::from_secs(parse_var("TEAMS_SYNC_HTTP_TIMEOUT_SECS", "30")?);

        let dry_run = parse_var("TEAMS_SYNC_DRY_RUN", "false")?;

        let log_level = env::var("TEAMS_SYNC_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            bind_addr,
            webhook_secret,
            github_token,
            github_api_url,
            git_base_url,
            workdir,
            manifest_file,
            cycle_timeout,
            http_timeout,
            dry_run,
            log_level,
            messages: Messages::new()?,
        })
    }
}

fn parse_var<T: std::str::FromStr>(var: &'static str, default: &str) -> Result<T, ConfigError> {
    let value = env::var(var).unwrap_or_else(|_| default.to_string());
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { var, value })
}

/// Resolve a secret from `var`, falling back to the file named by `file_var`
/// (or `default_file` when that is unset too).
fn secret_var(
    var: &'static str,
    file_var: &'static str,
    default_file: Option<&str>,
) -> Result<Option<String>, ConfigError> {
    if let Ok(value) = env::var(var) {
        return Ok(Some(value.trim().to_string()));
    }

    let path = match env::var(file_var) {
        Ok(path) => PathBuf::from(path),
        Err(_) => match default_file {
            Some(path) if Path::new(path).exists() => PathBuf::from(path),
            _ => return Ok(None),
        },
    };

    std::fs::read_to_string(&path)
        .map(|s| Some(s.trim().to_string()))
        .map_err(|source| ConfigError::SecretFile {
            var: file_var,
            path,
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const VARS: &[&str] = &[
        "TEAMS_SYNC_BIND_ADDR",
        "TEAMS_SYNC_WEBHOOK_SECRET",
        "TEAMS_SYNC_WEBHOOK_SECRET_FILE",
        "TEAMS_SYNC_GITHUB_TOKEN",
        "TEAMS_SYNC_GITHUB_TOKEN_FILE",
        "TEAMS_SYNC_GITHUB_API_URL",
        "TEAMS_SYNC_GIT_BASE_URL",
        "TEAMS_SYNC_WORKDIR",
        "TEAMS_SYNC_MANIFEST_FILE",
        "TEAMS_SYNC_CYCLE_TIMEOUT_SECS",
        "TEAMS_SYNC_HTTP_TIMEOUT_SECS",
        "TEAMS_SYNC_DRY_RUN",
        "TEAMS_SYNC_LOG_LEVEL",
    ];

    // Environment mutation is process-wide; keep every env-driven case in one test.
    #[test]
    fn test_config_from_env() {
        for var in VARS {
            env::remove_var(var);
        }
        env::set_var("TEAMS_SYNC_WEBHOOK_SECRET", "s3cret\n");

        let config = Config::from_env().unwrap();

        assert_eq!(config.bind_addr.to_string(), "0.0.0.0:8888");
        assert_eq!(config.webhook_secret, "s3cret");
        assert!(config.github_token.is_none());
        assert_eq!(config.github_api_url, "https://api.github.com");
        assert_eq!(config.git_base_url, "https://github.com");
        assert_eq!(config.manifest_file, PathBuf::from("TEAMS"));
        assert_eq!(config.cycle_timeout, Duration::from_secs(300));
        assert_eq!(config.http_timeout, Duration::from_secs(30));
        assert!(!config.dry_run);
        assert_eq!(config.log_level, "info");

        let dir = tempfile::TempDir::new().unwrap();
        let token_path = dir.path().join("token");
        std::fs::write(&token_path, "ghp_abc\n").unwrap();
        env::set_var("TEAMS_SYNC_GITHUB_TOKEN_FILE", &token_path);
        env::set_var("TEAMS_SYNC_GITHUB_API_URL", "http://localhost:9000/");
        env::set_var("TEAMS_SYNC_DRY_RUN", "true");

        let config = Config::from_env().unwrap();
        assert_eq!(config.github_token.as_deref(), Some("ghp_abc"));
        assert_eq!(config.github_api_url, "http://localhost:9000");
        assert!(config.dry_run);

        env::set_var("TEAMS_SYNC_CYCLE_TIMEOUT_SECS", "soon");
        let err = Config::from_env().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                var: "TEAMS_SYNC_CYCLE_TIMEOUT_SECS",
                ..
            }
        ));

        for var in VARS {
            env::remove_var(var);
        }
    }
}
