//! Keychain module - Reads password items from the macOS Keychain.
//!
//! Item attributes come from `security dump-keychain`; secrets are fetched
//! one by one with `security find-generic-password` or
//! `security find-internet-password`, depending on the item class, from the
//! same keychain that was dumped.

pub mod dump;

use crate::config::Config;
use crate::model::LocalCredential;
use crate::process::{run_tool, ToolError};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, info, warn};

pub use dump::{parse_dump, KeychainRecord, PasswordClass};

/// `security` exit status for "The specified item could not be found".
const ITEM_NOT_FOUND_EXIT: &str = "44";

#[derive(Debug, Error)]
pub enum KeychainError {
    #[error("cannot dump keychain: {0}")]
    Dump(#[source] ToolError),

    #[error("cannot read secret for {account}@{service}: {source}")]
    Secret {
        account: String,
        service: String,
        #[source]
        source: ToolError,
    },
}

/// Source of local credentials.
pub trait CredentialStore {
    /// All local password items, in store order.
    /// Errors are logged and yield an empty list.
    fn list_local(&self) -> Vec<LocalCredential>;
}

/// Identifies one password item for a secret lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecretQuery<'a> {
    pub class: PasswordClass,
    pub service: &'a str,
    pub account: &'a str,
}

/// Secret lookup for a password item.
pub trait SecretLookup {
    /// `Ok(None)` when the item does not exist.
    fn secret(&self, query: &SecretQuery<'_>) -> Result<Option<String>, KeychainError>;
}

/// Reads secrets with `security find-{generic,internet}-password -w`.
#[derive(Debug, Clone)]
pub struct SecurityLookup {
    security_path: PathBuf,
    keychain: Option<PathBuf>,
}

impl SecurityLookup {
    pub fn new(config: &Config) -> Self {
        Self {
            security_path: config.security_path.clone(),
            keychain: config.keychain.clone(),
        }
    }
}

impl SecretLookup for SecurityLookup {
    fn secret(&self, query: &SecretQuery<'_>) -> Result<Option<String>, KeychainError> {
        let keychain = self.keychain.as_deref().map(Path::to_string_lossy);
        let mut args = vec![
            query.class.find_command(),
            "-s",
            query.service,
            "-a",
            query.account,
            "-w",
        ];
        if let Some(path) = keychain.as_deref() {
            args.push(path);
        }

        match run_tool(&self.security_path, &args, None) {
            Ok(output) => Ok(Some(
                output.strip_suffix('\n').unwrap_or(output.as_str()).to_string(),
            )),
            Err(ToolError::Failed { code, .. }) if code == ITEM_NOT_FOUND_EXIT => Ok(None),
            Err(source) => Err(KeychainError::Secret {
                account: query.account.to_string(),
                service: query.service.to_string(),
                source,
            }),
        }
    }
}

/// Credential store backed by the `security` command line tool.
pub struct SecurityKeychain<L = SecurityLookup> {
    security_path: PathBuf,
    keychain: Option<PathBuf>,
    secrets: L,
}

impl SecurityKeychain<SecurityLookup> {
    pub fn new(config: &Config) -> Self {
        Self::with_lookup(config, SecurityLookup::new(config))
    }
}

impl<L: SecretLookup> SecurityKeychain<L> {
    pub fn with_lookup(config: &Config, secrets: L) -> Self {
        Self {
            security_path: config.security_path.clone(),
            keychain: config.keychain.clone(),
            secrets,
        }
    }

    fn dump(&self) -> Result<String, KeychainError> {
        let keychain = self.keychain.as_ref().map(|p| p.to_string_lossy());
        let mut args = vec!["dump-keychain"];
        if let Some(path) = keychain.as_deref() {
            args.push(path);
        }
        run_tool(&self.security_path, &args, None).map_err(KeychainError::Dump)
    }

    /// Password items only, first occurrence of each `(account, service)`.
    pub fn read_items(&self) -> Result<Vec<LocalCredential>, KeychainError> {
        let output = self.dump()?;
        let records = parse_dump(&output);
        debug!("Keychain dump contains {} records", records.len());

        let mut seen = HashSet::new();
        let mut items = Vec::new();
        for record in &records {
            let Some(class) = record.password_class() else {
                continue;
            };
            let query = SecretQuery {
                class,
                service: record.service(),
                account: record.account(),
            };
            if !seen.insert((query.account.to_string(), query.service.to_string())) {
                continue;
            }
            items.push(LocalCredential::new(
                query.account,
                query.service,
                self.secret_or_empty(&query),
            ));
        }
        Ok(items)
    }

    fn secret_or_empty(&self, query: &SecretQuery<'_>) -> String {
        match self.secrets.secret(query) {
            Ok(Some(secret)) => secret,
            Ok(None) => {
                warn!(
                    "No {:?} password found for {}@{}, using an empty secret",
                    query.class, query.account, query.service
                );
                String::new()
            }
            Err(e) => {
                error!("{}", e);
                String::new()
            }
        }
    }
}

impl<L: SecretLookup> CredentialStore for SecurityKeychain<L> {
    fn list_local(&self) -> Vec<LocalCredential> {
        match self.read_items() {
            Ok(items) => {
                info!("Found {} keychain password items", items.len());
                items
            }
            Err(e) => {
                error!("Failed to retrieve keychain items: {}", e);
                Vec::new()
            }
        }
    }
}
