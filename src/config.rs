//! Runtime settings.
//!
//! There is no config file: defaults can be overridden with environment
//! variables.
//! - `KC2BW_SECURITY_BIN`: path to the `security` tool
//! - `KC2BW_BW_BIN`: path to the Bitwarden CLI
//! - `KC2BW_KEYCHAIN`: keychain file to dump (default: search list)

use std::path::PathBuf;

pub const SECURITY_BIN_VAR: &str = "KC2BW_SECURITY_BIN";
pub const BW_BIN_VAR: &str = "KC2BW_BW_BIN";
pub const KEYCHAIN_VAR: &str = "KC2BW_KEYCHAIN";

/// Environment variable `bw unlock` tells users to export.
pub const DEFAULT_SESSION_VAR: &str = "BW_SESSION";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// `security` executable
    pub security_path: PathBuf,
    /// `bw` executable
    pub bw_path: PathBuf,
    /// Keychain to dump; `None` dumps the user's search list
    pub keychain: Option<PathBuf>,
    /// Environment variable holding an existing session token
    pub session_var: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            security_path: PathBuf::from("security"),
            bw_path: PathBuf::from("bw"),
            keychain: None,
            session_var: DEFAULT_SESSION_VAR.to_string(),
        }
    }
}

impl Config {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(path) = non_empty(SECURITY_BIN_VAR) {
            config.security_path = PathBuf::from(path);
        }
        if let Some(path) = non_empty(BW_BIN_VAR) {
            config.bw_path = PathBuf::from(path);
        }
        config.keychain = non_empty(KEYCHAIN_VAR).map(PathBuf::from);

        config
    }
}
