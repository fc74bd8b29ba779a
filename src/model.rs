//! Records exchanged between the credential store, the vault and the matcher.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// A password item read from the local credential store.
///
/// Identity is the `(account, service)` pair; the secret is carried along
/// only so it can be written into the vault.
#[derive(Clone, PartialEq, Eq)]
pub struct LocalCredential {
    account: String,
    service: String,
    secret: String,
}

impl LocalCredential {
    pub fn new(
        account: impl Into<String>,
        service: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            account: account.into(),
            service: service.into(),
            secret: secret.into(),
        }
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl fmt::Debug for LocalCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalCredential")
            .field("account", &self.account)
            .field("service", &self.service)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// An item from `bw list items`.
///
/// Only the fields the matcher needs are decoded; everything else in the
/// Bitwarden JSON is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VaultEntry {
    pub id: String,
    /// Item name, conventionally `"<service> - <account>"`
    #[serde(rename = "name")]
    pub display_name: String,
    /// Login fields (empty for notes, cards and identities)
    #[serde(default, deserialize_with = "null_as_default")]
    pub login: LoginFields,
}

impl VaultEntry {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>, login: LoginFields) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            login,
        }
    }
}

/// The `login` object of a Bitwarden item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginFields {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub uris: Vec<LoginUri>,
}

impl LoginFields {
    pub fn with_username(username: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            ..Self::default()
        }
    }
}

/// One entry of `login.uris`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginUri {
    /// Bitwarden URI match strategy; `None` means the account default
    #[serde(rename = "match")]
    pub match_type: Option<u8>,
    pub uri: Option<String>,
}

/// Session token returned by `bw login --raw`.
///
/// Held for a single run and passed explicitly to every vault call.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(<redacted>)")
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
