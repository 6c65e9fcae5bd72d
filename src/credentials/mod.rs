pub mod prompt;

use std::fmt;
use std::io::IsTerminal;

/// Environment variable name for providing the Review Board password
pub const ENV_PASSWORD_VAR: &str = "RB_KEEPER_PASSWORD";

pub use prompt::prompt_for_password;

/// Basic-auth credentials for the review server
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug)]
pub enum CredentialError {
    /// A username is configured but no password is available and none can be asked for
    PasswordUnavailable(String),
    PromptFailed(String),
}

impl fmt::Display for CredentialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialError::PasswordUnavailable(user) => write!(
                f,
                "No password for user '{}': set {} or run interactively",
                user, ENV_PASSWORD_VAR
            ),
            CredentialError::PromptFailed(msg) => write!(f, "Failed to read password: {}", msg),
        }
    }
}

impl std::error::Error for CredentialError {}

/// Check for a password in the RB_KEEPER_PASSWORD environment variable.
/// Returns Some(password) if the env var is set and non-empty, None otherwise.
pub fn get_password_from_env() -> Option<String> {
    crate::config::env_value(ENV_PASSWORD_VAR)
}

/// Resolve credentials for `username`.
///
/// No username means anonymous access. Otherwise the password comes from the
/// environment, or from a prompt when stdin is a terminal.
pub fn resolve_credentials(username: Option<String>) -> Result<Option<Credentials>, CredentialError> {
    let Some(username) = username else {
        return Ok(None);
    };

    let password = match get_password_from_env() {
        Some(password) => password,
        None if std::io::stdin().is_terminal() => prompt_for_password(&username)
            .map_err(|e| CredentialError::PromptFailed(format!("{:#}", e)))?,
        None => return Err(CredentialError::PasswordUnavailable(username)),
    };

    Ok(Some(Credentials { username, password }))
}
