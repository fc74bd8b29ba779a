//! keychain-bw-sync
//!
//! One-way inventory of macOS Keychain passwords against a Bitwarden vault.
//! Provides:
//! - Keychain reader (`security dump-keychain` + `find-*-password` secret lookup)
//! - Bitwarden client (`bw` CLI: login, list items, create item)
//! - Comparison-key matcher
//! - Sync orchestrator (dry-run by default)
//!
//! Pipeline: Authenticate -> List local -> List vault -> Diff -> (optional) Create

pub mod config;
pub mod keychain;
pub mod matcher;
pub mod model;
pub mod process;
pub mod sync;
pub mod vault;

// Re-export main types
pub use config::Config;
pub use keychain::{CredentialStore, SecretLookup, SecretQuery, SecurityKeychain, SecurityLookup};
pub use matcher::{classify, vault_key_set, ComparisonKey, Presence};
pub use model::{LocalCredential, LoginFields, SessionToken, VaultEntry};
pub use sync::{SyncMode, SyncReport, Synchronizer};
pub use vault::{BitwardenCli, TerminalPrompter, Vault};
