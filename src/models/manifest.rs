//! The TEAMS manifest: desired membership of a set of organization teams.
//!
//! ```yaml
//! apiVersion: v1
//! teams:
//!   - platform:
//!       - login: amy
//!         maintainer: true
//!       - login: bo
//! ```

use std::collections::{BTreeMap, HashSet};

use serde::Deserialize;

/// Manifest as it appears on disk. `maintainer` may be omitted per member.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawManifest {
    #[serde(default)]
    pub api_version: String,
    #[serde(default)]
    pub teams: Vec<BTreeMap<String, Vec<RawMember>>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawMember {
    pub login: String,
    #[serde(default, alias = "isMaintainer")]
    pub maintainer: Option<bool>,
}

impl RawMember {
    /// Fill in defaults for omitted fields.
    pub fn fill_defaults(self) -> MemberDeclaration {
        MemberDeclaration::new(self.login.trim(), self.maintainer.unwrap_or(true))
    }
}

/// One desired membership fact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberDeclaration {
    pub login: String,
    pub is_maintainer: bool,
}

impl MemberDeclaration {
    pub fn new(login: impl Into<String>, is_maintainer: bool) -> Self {
        Self {
            login: login.into(),
            is_maintainer,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamDeclaration {
    pub name: String,
    pub members: Vec<MemberDeclaration>,
}

/// Parsed, default-filled manifest. Team names are unique.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    pub api_version: String,
    pub teams: Vec<TeamDeclaration>,
}

/// Structural problems found after the YAML itself parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestViolation {
    DuplicateTeam(String),
    EmptyLogin(String),
}

impl RawManifest {
    /// Flatten the team groups, default-fill every member and check invariants.
    pub fn into_manifest(self) -> Result<Manifest, ManifestViolation> {
        let mut seen = HashSet::new();
        let mut teams = Vec::new();

        for group in self.teams {
            for (name, members) in group {
                if !seen.insert(name.clone()) {
                    return Err(ManifestViolation::DuplicateTeam(name));
                }

                let members: Vec<MemberDeclaration> =
                    members.into_iter().map(RawMember::fill_defaults).collect();
                if members.iter().any(|m| m.login.is_empty()) {
                    return Err(ManifestViolation::EmptyLogin(name));
                }

                teams.push(TeamDeclaration { name, members });
            }
        }

        Ok(Manifest {
            api_version: self.api_version,
            teams,
        })
    }
}
