//! Working copies backed by the `git` command line.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tempfile::TempDir;
use tokio::process::Command;

use super::{GitError, RepoProvider, WorkingCopy};

/// Fetches repositories from `{base_url}/{org}/{repo}.git` into temporary directories.
pub struct GitCli {
    base_url: String,
    auth_header: Option<String>,
    workdir: PathBuf,
}

impl GitCli {
    pub fn new(base_url: &str, token: Option<&str>, workdir: impl Into<PathBuf>) -> Self {
        let auth_header = token.map(|token| {
            let credentials = STANDARD.encode(format!("x-access-token:{}", token));
            format!("http.extraHeader=Authorization: Basic {}", credentials)
        });

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_header,
            workdir: workdir.into(),
        }
    }
}

#[async_trait]
impl RepoProvider for GitCli {
    async fn acquire(&self, org: &str, repo: &str) -> Result<Box<dyn WorkingCopy>, GitError> {
        tokio::fs::create_dir_all(&self.workdir).await?;
        let dir = tempfile::Builder::new()
            .prefix("teams-sync-")
            .tempdir_in(&self.workdir)?;

        let remote = format!("{}/{}/{}.git", self.base_url, org, repo);
        run_git(dir.path(), None, &["init", "--quiet"]).await?;
        run_git(dir.path(), None, &["remote", "add", "origin", &remote]).await?;

        tracing::debug!("Acquired working copy for {}/{} at {:?}", org, repo, dir.path());

        Ok(Box::new(CliWorkingCopy {
            dir,
            auth_header: self.auth_header.clone(),
        }))
    }
}

struct CliWorkingCopy {
    dir: TempDir,
    auth_header: Option<String>,
}

#[async_trait]
impl WorkingCopy for CliWorkingCopy {
    async fn checkout(&mut self, revision: &str) -> Result<(), GitError> {
        run_git(
            self.dir.path(),
            self.auth_header.as_deref(),
            &["fetch", "--quiet", "--depth", "1", "origin", revision],
        )
        .await?;
        run_git(
            self.dir.path(),
            None,
            &["checkout", "--quiet", "--detach", "FETCH_HEAD"],
        )
        .await
    }

    async fn read_file(&self, path: &Path) -> std::io::Result<Vec<u8>> {
        tokio::fs::read(self.dir.path().join(path)).await
    }

    async fn release(self: Box<Self>) -> Result<(), GitError> {
        let dir = self.dir;
        tokio::task::spawn_blocking(move || dir.close())
            .await
            .map_err(std::io::Error::other)??;
        Ok(())
    }
}

/// Run one git command in `dir`; `config` is passed as `-c` and never logged.
async fn run_git(dir: &Path, config: Option<&str>, args: &[&str]) -> Result<(), GitError> {
    let command = args.first().copied().unwrap_or_default().to_string();

    let mut cmd = Command::new("git");
    cmd.current_dir(dir)
        .env("GIT_TERMINAL_PROMPT", "0")
        .kill_on_drop(true);
    if let Some(config) = config {
        cmd.arg("-c").arg(config);
    }
    cmd.args(args);

    let output = cmd.output().await.map_err(|source| GitError::Spawn {
        command: command.clone(),
        source,
    })?;

    if output.status.success() {
        Ok(())
    } else {
        Err(GitError::Command {
            command,
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}
