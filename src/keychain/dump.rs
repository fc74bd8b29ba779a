//! Parser for `security dump-keychain` output.
//!
//! ```text
//! keychain: "/Users/me/Library/Keychains/login.keychain-db"
//! version: 512
//! class: "genp"
//! attributes:
//!     0x00000007 <blob>="example.com"
//!     "acct"<blob>="user1"
//!     "svce"<blob>="example.com"
//!     "crtr"<uint32>=<NULL>
//! ```

use std::collections::HashMap;

const RECORD_START: &str = "keychain:";
const CLASS_PREFIX: &str = "class:";

/// Generic password item.
pub const CLASS_GENERIC_PASSWORD: &str = "genp";
/// Internet password item.
pub const CLASS_INTERNET_PASSWORD: &str = "inet";

/// Keychain item classes that hold a password.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PasswordClass {
    Generic,
    Internet,
}

impl PasswordClass {
    pub fn from_class(class: &str) -> Option<Self> {
        match class {
            CLASS_GENERIC_PASSWORD => Some(Self::Generic),
            CLASS_INTERNET_PASSWORD => Some(Self::Internet),
            _ => None,
        }
    }

    /// Attribute naming the service (`svce`) or server (`srvr`).
    pub fn service_attribute(self) -> &'static str {
        match self {
            Self::Generic => "svce",
            Self::Internet => "srvr",
        }
    }

    /// `security` subcommand that reads a secret of this class.
    pub fn find_command(self) -> &'static str {
        match self {
            Self::Generic => "find-generic-password",
            Self::Internet => "find-internet-password",
        }
    }
}

/// One item of the dump, reduced to the attributes we care about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeychainRecord {
    pub class: String,
    attributes: HashMap<String, String>,
}

impl KeychainRecord {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn password_class(&self) -> Option<PasswordClass> {
        PasswordClass::from_class(&self.class)
    }

    pub fn is_password(&self) -> bool {
        self.password_class().is_some()
    }

    pub fn account(&self) -> &str {
        self.attribute("acct").unwrap_or("")
    }

    /// `svce` for generic passwords, `srvr` for internet passwords.
    pub fn service(&self) -> &str {
        let class = self.password_class().unwrap_or(PasswordClass::Generic);
        self.attribute(class.service_attribute()).unwrap_or("")
    }
}

/// Split the dump into records. Every `keychain:` line starts a new record;
/// the last record is closed at end of input.
pub fn parse_dump(output: &str) -> Vec<KeychainRecord> {
    let mut records = Vec::new();
    let mut current: Option<KeychainRecord> = None;

    for line in output.lines() {
        let trimmed = line.trim();

        if trimmed.starts_with(RECORD_START) {
            records.extend(current.take());
            current = Some(KeychainRecord::default());
            continue;
        }

        let Some(record) = current.as_mut() else {
            continue;
        };

        if let Some(class) = trimmed.strip_prefix(CLASS_PREFIX) {
            record.class = class.trim().trim_matches('"').to_string();
        } else if let Some((name, value)) = parse_attribute(trimmed) {
            record.attributes.insert(name, value);
        }
    }

    records.extend(current);
    records
}

/// `"acct"<blob>="user"` -> `("acct", "user")`. `<NULL>` values are skipped.
fn parse_attribute(line: &str) -> Option<(String, String)> {
    let type_start = line.find('<')?;
    let type_end = type_start + line[type_start..].find('>')?;
    let name = line[..type_start].trim().trim_matches('"');
    let value = line[type_end + 1..].strip_prefix('=')?.trim();

    if name.is_empty() {
        return None;
    }
    Some((name.to_string(), parse_value(value)?))
}

/// `"text"`, `0x74657874  "text"`, `0x74657874` or `<NULL>`.
///
/// The hex form carries the exact bytes; the quoted rendering escapes
/// non-ASCII bytes as octal, so it is only a fallback.
fn parse_value(raw: &str) -> Option<String> {
    let quoted = quoted_value(raw);
    let Some(hex_part) = raw.strip_prefix("0x") else {
        return quoted;
    };
    let digits = hex_part.split_whitespace().next().unwrap_or("");
    let Ok(bytes) = hex::decode(digits) else {
        return quoted;
    };

    // C strings (dates, some blobs) carry a trailing NUL.
    let end = bytes.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
    match String::from_utf8(bytes[..end].to_vec()) {
        Ok(text) => Some(text),
        Err(e) => quoted.or_else(|| Some(String::from_utf8_lossy(e.as_bytes()).into_owned())),
    }
}

fn quoted_value(raw: &str) -> Option<String> {
    let open = raw.find('"')?;
    let close = raw.rfind('"')?;
    if close <= open {
        return None;
    }
    Some(raw[open + 1..close].to_string())
}
