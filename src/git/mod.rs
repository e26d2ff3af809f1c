//! Source-control collaborator: scoped working copies of a repository.
//!
//! A [`WorkingCopy`] is released by consuming it, so it can be released at most once.

mod cli;

pub use cli::GitCli;

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GitError {
    #[error("failed to run git {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("git {command} exited with {status}: {stderr}")]
    Command {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait RepoProvider: Send + Sync {
    /// Create a fresh working copy for `org/repo`.
    async fn acquire(&self, org: &str, repo: &str) -> Result<Box<dyn WorkingCopy>, GitError>;
}

#[async_trait]
pub trait WorkingCopy: Send + Sync {
    /// Check out exactly `revision` (a commit sha or ref).
    async fn checkout(&mut self, revision: &str) -> Result<(), GitError>;

    /// Read a file relative to the repository root.
    async fn read_file(&self, path: &Path) -> std::io::Result<Vec<u8>>;

    /// Remove the working copy from disk.
    async fn release(self: Box<Self>) -> Result<(), GitError>;
}
