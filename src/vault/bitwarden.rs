//! Bitwarden vault client.
//! Wraps the `bw` command line tool.

use super::prompt::{Prompter, TerminalPrompter};
use super::{Vault, VaultError};
use crate::config::Config;
use crate::model::{LocalCredential, LoginUri, SessionToken, VaultEntry};
use crate::process::{run_tool_with_env, ToolError};
use base64::Engine as _;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

/// Child environment variable carrying the master password for
/// `bw login --passwordenv`.
const PASSWORD_ENV: &str = "KC2BW_MASTER_PASSWORD";

/// Session variable understood by every `bw` command.
const BW_SESSION_ENV: &str = "BW_SESSION";

/// Bitwarden item type for logins.
const ITEM_TYPE_LOGIN: u8 = 1;

const ALREADY_LOGGED_IN: &str = "already logged in";

/// Payload for `bw create item`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NewLoginItem<'a> {
    organization_id: Option<String>,
    folder_id: Option<String>,
    #[serde(rename = "type")]
    item_type: u8,
    name: String,
    notes: String,
    favorite: bool,
    login: NewLogin<'a>,
}

#[derive(Serialize)]
struct NewLogin<'a> {
    username: &'a str,
    password: &'a str,
    uris: Vec<LoginUri>,
}

impl<'a> NewLoginItem<'a> {
    fn from_credential(credential: &'a LocalCredential, imported_at: DateTime<Local>) -> Self {
        Self {
            organization_id: None,
            folder_id: None,
            item_type: ITEM_TYPE_LOGIN,
            name: format!("{} - {}", credential.service(), credential.account()),
            notes: format!("Imported from macOS Keychain on {}", imported_at.to_rfc3339()),
            favorite: false,
            login: NewLogin {
                username: credential.account(),
                password: credential.secret(),
                uris: vec![LoginUri {
                    match_type: None,
                    uri: Some(format!("https://{}", credential.service())),
                }],
            },
        }
    }
}

/// Vault client backed by the `bw` executable.
pub struct BitwardenCli<P = TerminalPrompter> {
    bw_path: PathBuf,
    /// Session exported by a previous `bw unlock`, reused without prompting
    existing_session: Option<String>,
    prompter: P,
}

impl BitwardenCli<TerminalPrompter> {
    pub fn new(config: &Config) -> Self {
        Self::with_prompter(config, TerminalPrompter)
    }
}

impl<P: Prompter> BitwardenCli<P> {
    pub fn with_prompter(config: &Config, prompter: P) -> Self {
        Self {
            bw_path: config.bw_path.clone(),
            existing_session: std::env::var(&config.session_var).ok(),
            prompter,
        }
    }

    /// Override the session picked up from the environment.
    pub fn existing_session(mut self, session: Option<String>) -> Self {
        self.existing_session = session;
        self
    }

    fn run(
        &self,
        args: &[&str],
        session: Option<&SessionToken>,
        input: Option<&[u8]>,
    ) -> Result<String, ToolError> {
        let envs: Vec<(&str, &str)> = session
            .map(|s| vec![(BW_SESSION_ENV, s.expose())])
            .unwrap_or_default();
        run_tool_with_env(&self.bw_path, args, &envs, input)
    }

    /// Log in (or unlock, when the CLI already holds a login) and return the
    /// session token. An exported session is reused when `bw unlock --check`
    /// accepts it.
    pub fn login(&self) -> Result<SessionToken, VaultError> {
        if let Some(token) = self
            .existing_session
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
        {
            let session = SessionToken::new(token);
            match self.run(&["unlock", "--check"], Some(&session), None) {
                Ok(_) => {
                    info!("Using existing Bitwarden session");
                    return Ok(session);
                }
                Err(e) => {
                    debug!("Session check failed: {}", e);
                    warn!("Exported Bitwarden session is not valid, logging in");
                }
            }
        }

        let creds = self.prompter.login_credentials()?;
        let envs = [(PASSWORD_ENV, creds.master_password.as_str())];

        let login_args = [
            "login",
            creds.email.as_str(),
            "--passwordenv",
            PASSWORD_ENV,
            "--raw",
        ];
        let output = match run_tool_with_env(&self.bw_path, &login_args, &envs, None) {
            Ok(output) => output,
            Err(ToolError::Failed { stderr, .. }) if stderr.contains(ALREADY_LOGGED_IN) => {
                debug!("bw already logged in, unlocking instead");
                let unlock_args = ["unlock", "--passwordenv", PASSWORD_ENV, "--raw"];
                run_tool_with_env(&self.bw_path, &unlock_args, &envs, None)?
            }
            Err(e) => return Err(e.into()),
        };

        let token = output.trim();
        if token.is_empty() {
            return Err(VaultError::EmptySession);
        }
        Ok(SessionToken::new(token))
    }

    pub fn fetch_items(&self, session: &SessionToken) -> Result<Vec<VaultEntry>, VaultError> {
        let output = self.run(&["list", "items"], Some(session), None)?;
        Ok(serde_json::from_str(&output)?)
    }

    /// Create a login item stamped with `imported_at`.
    pub fn create_item(
        &self,
        session: &SessionToken,
        credential: &LocalCredential,
        imported_at: DateTime<Local>,
    ) -> Result<(), VaultError> {
        let item = NewLoginItem::from_credential(credential, imported_at);
        let json = serde_json::to_string(&item)?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(json);
        self.run(&["create", "item"], Some(session), Some(encoded.as_bytes()))?;
        Ok(())
    }
}

impl<P: Prompter> Vault for BitwardenCli<P> {
    fn authenticate(&self) -> Option<SessionToken> {
        match self.login() {
            Ok(session) => Some(session),
            Err(e) => {
                error!("Failed to login to Bitwarden: {}", e);
                None
            }
        }
    }

    fn list_entries(&self, session: &SessionToken) -> Vec<VaultEntry> {
        match self.fetch_items(session) {
            Ok(items) => {
                info!("Found {} Bitwarden items", items.len());
                items
            }
            Err(e) => {
                error!("Failed to retrieve Bitwarden items: {}", e);
                warn!("Continuing with an empty vault listing; every keychain item will look new");
                Vec::new()
            }
        }
    }

    fn create_entry(&self, session: &SessionToken, credential: &LocalCredential) -> bool {
        match self.create_item(session, credential, Local::now()) {
            Ok(()) => true,
            Err(e) => {
                error!(
                    "Error creating Bitwarden item for {}@{}: {}",
                    credential.account(),
                    credential.service(),
                    e
                );
                false
            }
        }
    }
}
