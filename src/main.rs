//! teams-sync
//!
//! Webhook service that reconciles GitHub team membership with the TEAMS manifest
//! of a pull request once the pull request is approved.

mod api;
mod auth;
mod config;
mod errors;
mod git;
mod github;
mod models;
mod sync;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use git::GitCli;
use github::GitHubClient;
use sync::{CycleDriver, ManifestLoader};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub driver: Arc<CycleDriver>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting teams-sync");
    tracing::info!("GitHub API: {}", config.github_api_url);
    tracing::info!("Manifest file: {:?}", config.manifest_file);
    tracing::info!("Bind address: {}", config.bind_addr);

    if config.github_token.is_none() {
        tracing::warn!("No GitHub token configured (TEAMS_SYNC_GITHUB_TOKEN). API calls are anonymous!");
    }
    if config.dry_run {
        tracing::warn!("Dry run enabled: memberships and comments will not be changed");
    }

    let github = Arc::new(GitHubClient::new(
        &config.github_api_url,
        config.github_token.clone(),
        config.http_timeout,
        config.dry_run,
    )?);
    let repos = Arc::new(GitCli::new(
        &config.git_base_url,
        config.github_token.as_deref(),
        &config.workdir,
    ));

    let driver = Arc::new(CycleDriver::new(
        github,
        ManifestLoader::new(repos, &config.manifest_file),
        config.messages.clone(),
        config.cycle_timeout,
    ));

    let state = AppState {
        config: Arc::new(config.clone()),
        driver,
    };

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/teams-sync", post(api::receive_webhook))
        .route("/help", get(api::command_help))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
