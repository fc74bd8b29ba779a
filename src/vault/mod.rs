//! Vault module - Remote password vault access.
//!
//! This module contains:
//! - `Vault` trait: the narrow interface the orchestrator depends on
//! - Bitwarden CLI client
//! - Interactive prompts for the master password

pub mod bitwarden;
pub mod prompt;

use crate::model::{LocalCredential, SessionToken, VaultEntry};
use crate::process::ToolError;
use thiserror::Error;

pub use bitwarden::BitwardenCli;
pub use prompt::{LoginCredentials, Prompter, TerminalPrompter};

#[derive(Debug, Error)]
pub enum VaultError {
    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error("cannot read login credentials: {0}")]
    Prompt(#[source] std::io::Error),

    #[error("email must not be empty")]
    EmptyEmail,

    #[error("bw returned an empty session token")]
    EmptySession,

    #[error("cannot parse bw output: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Remote vault as seen by the orchestrator.
///
/// Every method fails soft: errors are logged by the implementation and
/// turned into `None`, an empty list or `false`.
pub trait Vault {
    /// Obtain a session for this run.
    fn authenticate(&self) -> Option<SessionToken>;

    /// All items visible to the session.
    fn list_entries(&self, session: &SessionToken) -> Vec<VaultEntry>;

    /// Create a login item for `credential`. Returns whether it succeeded.
    fn create_entry(&self, session: &SessionToken, credential: &LocalCredential) -> bool;
}
