//! Manifest loader: read the TEAMS file at an exact revision.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::git::{GitError, RepoProvider, WorkingCopy};
use crate::models::{Manifest, ManifestViolation, RawManifest};

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to clone {org}/{repo}: {source}")]
    Clone {
        org: String,
        repo: String,
        #[source]
        source: GitError,
    },

    #[error("cannot checkout {revision}: {source}")]
    Checkout {
        revision: String,
        #[source]
        source: GitError,
    },

    #[error("manifest file {0} not found")]
    NotFound(PathBuf),

    #[error("failed to read manifest {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse manifest: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("team {0} is declared more than once")]
    DuplicateTeam(String),

    #[error("team {0} has a member without a login")]
    EmptyLogin(String),
}

impl From<ManifestViolation> for ManifestError {
    fn from(violation: ManifestViolation) -> Self {
        match violation {
            ManifestViolation::DuplicateTeam(team) => ManifestError::DuplicateTeam(team),
            ManifestViolation::EmptyLogin(team) => ManifestError::EmptyLogin(team),
        }
    }
}

pub struct ManifestLoader {
    repos: Arc<dyn RepoProvider>,
    file: PathBuf,
}

impl ManifestLoader {
    pub fn new(repos: Arc<dyn RepoProvider>, file: impl Into<PathBuf>) -> Self {
        Self {
            repos,
            file: file.into(),
        }
    }

    /// Check out `revision` of `org/repo` and parse its manifest.
    ///
    /// The working copy is released exactly once after it has been acquired, including
    /// when this future is dropped before completing.
    pub async fn load(&self, org: &str, repo: &str, revision: &str) -> Result<Manifest, ManifestError> {
        let copy = self
            .repos
            .acquire(org, repo)
            .await
            .map_err(|source| ManifestError::Clone {
                org: org.to_string(),
                repo: repo.to_string(),
                source,
            })?;
        let mut lease = Lease::new(copy, format!("{}/{}", org, repo));

        let result = match lease.copy.as_deref_mut() {
            Some(copy) => self.read(copy, revision).await,
            None => unreachable!("a lease holds its copy until released"),
        };

        lease.release().await;

        match &result {
            Ok(manifest) => tracing::info!(
                "Loaded manifest {} at {} with {} teams",
                self.file.display(),
                revision,
                manifest.teams.len()
            ),
            Err(e) => tracing::warn!("Cannot load manifest at {}: {}", revision, e),
        }
        result
    }

    async fn read(&self, copy: &mut dyn WorkingCopy, revision: &str) -> Result<Manifest, ManifestError> {
        copy.checkout(revision)
            .await
            .map_err(|source| ManifestError::Checkout {
                revision: revision.to_string(),
                source,
            })?;

        let bytes = copy.read_file(&self.file).await.map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ManifestError::NotFound(self.file.clone())
            } else {
                ManifestError::Read {
                    path: self.file.clone(),
                    source,
                }
            }
        })?;

        parse(&bytes)
    }
}

/// Owns an acquired working copy and releases it when dropped.
///
/// Dropping happens when a cycle hits its deadline mid-checkout; the release then
/// runs as a detached task.
struct Lease {
    copy: Option<Box<dyn WorkingCopy>>,
    label: String,
}

impl Lease {
    fn new(copy: Box<dyn WorkingCopy>, label: String) -> Self {
        Self {
            copy: Some(copy),
            label,
        }
    }

    async fn release(mut self) {
        if let Some(copy) = self.copy.take() {
            if let Err(e) = copy.release().await {
                tracing::error!("Error cleaning up working copy of {}: {}", self.label, e);
            }
        }
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        let Some(copy) = self.copy.take() else {
            return;
        };
        let label = std::mem::take(&mut self.label);

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    match copy.release().await {
                        Ok(()) => tracing::debug!("Released abandoned working copy of {}", label),
                        Err(e) => tracing::error!("Error cleaning up working copy of {}: {}", label, e),
                    }
                });
            }
            Err(_) => tracing::warn!("No runtime left to release working copy of {}", label),
        }
    }
}

/// Parse and default-fill a manifest document.
pub fn parse(bytes: &[u8]) -> Result<Manifest, ManifestError> {
    let raw: RawManifest = serde_yaml::from_slice(bytes)?;
    Ok(raw.into_manifest()?)
}
