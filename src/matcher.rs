//! Comparison keys and membership checks.
//!
//! A local credential and a vault item denote the same login iff their keys
//! are byte-equal. Matching is purely syntactic: no case folding, no
//! trimming, no fuzzy matching.

use crate::model::{LocalCredential, VaultEntry};
use std::collections::HashSet;
use std::fmt;

/// Separator between service and account in vault item names.
///
/// NOTE: a service that itself contains this separator yields a truncated
/// key. Kept for compatibility with items created by earlier imports.
pub const DISPLAY_NAME_SEPARATOR: &str = " - ";

/// `"<account>@<service>"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComparisonKey(String);

impl ComparisonKey {
    fn join(account: &str, service: &str) -> Self {
        Self(format!("{}@{}", account, service))
    }

    /// Key of a local credential.
    pub fn for_local(credential: &LocalCredential) -> Self {
        Self::join(credential.account(), credential.service())
    }

    /// Key of a vault item: login username plus the part of the item name
    /// before the first separator.
    pub fn for_vault(entry: &VaultEntry) -> Self {
        let username = entry.login.username.as_deref().unwrap_or("");
        Self::join(username, service_from_display_name(&entry.display_name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ComparisonKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether a local credential already has a vault counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Present,
    Missing,
}

/// First segment of `display_name` split on the separator, or the whole
/// name when the separator is absent.
pub fn service_from_display_name(display_name: &str) -> &str {
    display_name
        .split(DISPLAY_NAME_SEPARATOR)
        .next()
        .unwrap_or(display_name)
}

/// Keys of all vault entries. Duplicate keys collapse.
pub fn vault_key_set(entries: &[VaultEntry]) -> HashSet<ComparisonKey> {
    entries.iter().map(ComparisonKey::for_vault).collect()
}

pub fn classify(local: &LocalCredential, existing_keys: &HashSet<ComparisonKey>) -> Presence {
    if existing_keys.contains(&ComparisonKey::for_local(local)) {
        Presence::Present
    } else {
        Presence::Missing
    }
}
