//! Desired vs actual membership of one team.

use std::collections::HashSet;

use crate::models::{norm_login, MemberDeclaration};

/// Result of comparing one team's declarations with its snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamDiff {
    /// Declared but not a member, in declaration order
    pub to_add: Vec<MemberDeclaration>,
    /// Member but not declared, in snapshot order
    pub drift_logins: Vec<String>,
}

/// Compare declarations with the actual member logins, case-insensitively.
///
/// Duplicate logins on either side are reported once. The two outputs are
/// disjoint: a login is either declared or it is not.
pub fn diff(declared: &[MemberDeclaration], actual: &[String]) -> TeamDiff {
    let actual_keys: HashSet<String> = actual.iter().map(|l| norm_login(l)).collect();
    let declared_keys: HashSet<String> = declared.iter().map(|m| norm_login(&m.login)).collect();

    let mut seen = HashSet::new();
    let to_add = declared
        .iter()
        .filter(|m| {
            let key = norm_login(&m.login);
            !actual_keys.contains(&key) && seen.insert(key)
        })
        .cloned()
        .collect();

    let mut seen = HashSet::new();
    let drift_logins = actual
        .iter()
        .filter(|login| {
            let key = norm_login(login);
            !declared_keys.contains(&key) && seen.insert(key)
        })
        .cloned()
        .collect();

    TeamDiff {
        to_add,
        drift_logins,
    }
}
