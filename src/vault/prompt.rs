//! Master password prompts.

use super::VaultError;
use std::fmt;
use std::io::{self, BufRead, Write};

/// Email and master password for `bw login`.
#[derive(Clone)]
pub struct LoginCredentials {
    pub email: String,
    pub master_password: String,
}

impl fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("email", &self.email)
            .field("master_password", &"<redacted>")
            .finish()
    }
}

/// Asks the operator for vault credentials.
pub trait Prompter {
    fn login_credentials(&self) -> Result<LoginCredentials, VaultError>;
}

/// Reads the email from stdin and the master password without echo.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn login_credentials(&self) -> Result<LoginCredentials, VaultError> {
        print!("Bitwarden email: ");
        io::stdout().flush().map_err(VaultError::Prompt)?;

        let mut email = String::new();
        io::stdin()
            .lock()
            .read_line(&mut email)
            .map_err(VaultError::Prompt)?;
        let email = email.trim().to_string();
        if email.is_empty() {
            return Err(VaultError::EmptyEmail);
        }

        let master_password = rpassword::prompt_password("Bitwarden master password: ")
            .map_err(VaultError::Prompt)?;

        Ok(LoginCredentials {
            email,
            master_password,
        })
    }
}
