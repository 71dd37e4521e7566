//! Gemini API key storage and resolution
//!
//! Keys live in the OS keyring with a file fallback under the config
//! directory. Resolution walks one ordered list of sources and yields a
//! single typed outcome.

use anyhow::{Context, Result};
use std::fmt;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

use super::error::{AssistantError, KEY_PREFIX};

const SERVICE_NAME: &str = "axiom-path";
const API_KEY_USERNAME: &str = "gemini-api-key";
const API_KEY_FILE: &str = "api_key.txt";

/// Environment variables consulted, in order
pub const ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

/// Where a stored key ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStorage {
    Keyring,
    File,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// Passed on the command line for this run
    Flag,
    /// Selected earlier with `config --set-api-key`
    Stored,
    Environment(&'static str),
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::Flag => write!(f, "--api-key"),
            CredentialSource::Stored => write!(f, "stored key"),
            CredentialSource::Environment(var) => write!(f, "${}", var),
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub value: String,
    pub source: CredentialSource,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("value", &mask(&self.value))
            .field("source", &self.source)
            .finish()
    }
}

impl Credential {
    pub fn validate(&self) -> Result<(), AssistantError> {
        validate(&self.value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialResolution {
    Configured(Credential),
    Unconfigured,
}

impl CredentialResolution {
    pub fn is_configured(&self) -> bool {
        matches!(self, CredentialResolution::Configured(_))
    }

    pub fn credential(&self) -> Option<&Credential> {
        match self {
            CredentialResolution::Configured(c) => Some(c),
            CredentialResolution::Unconfigured => None,
        }
    }
}

/// Resolve the key to use: explicit flag, then stored key, then environment
pub fn resolve(explicit: Option<String>) -> CredentialResolution {
    let stored = get_api_key().ok();
    resolve_from(explicit, stored, |var| std::env::var(var).ok())
}

/// Precedence rules, independent of where the values come from
pub fn resolve_from<F>(explicit: Option<String>, stored: Option<String>, env: F) -> CredentialResolution
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());

    if let Some(value) = non_empty(explicit) {
        debug!("Using API key from command line");
        return CredentialResolution::Configured(Credential {
            value,
            source: CredentialSource::Flag,
        });
    }
    if let Some(value) = non_empty(stored) {
        debug!("Using stored API key");
        return CredentialResolution::Configured(Credential {
            value,
            source: CredentialSource::Stored,
        });
    }
    for var in ENV_VARS {
        if let Some(value) = non_empty(env(var)) {
            debug!("Using API key from ${}", var);
            return CredentialResolution::Configured(Credential {
                value,
                source: CredentialSource::Environment(var),
            });
        }
    }
    debug!("No API key configured");
    CredentialResolution::Unconfigured
}

/// Check a key value before it is sent anywhere
pub fn validate(value: &str) -> Result<(), AssistantError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AssistantError::MissingCredential);
    }
    if looks_like_variable_name(value) {
        return Err(AssistantError::CredentialLooksLikeVariableName {
            name: value.to_string(),
        });
    }
    if !value.starts_with(KEY_PREFIX) {
        return Err(AssistantError::InvalidCredentialFormat {
            expected_prefix: KEY_PREFIX,
        });
    }
    Ok(())
}

/// `GEMINI_API_KEY`, `$API_KEY`, `${API_KEY}`, `process.env.API_KEY` and the like
fn looks_like_variable_name(value: &str) -> bool {
    let name = value;
    for prefix in ["process.env.", "import.meta.env.", "env."] {
        if let Some(rest) = name.strip_prefix(prefix) {
            return is_identifier(rest);
        }
    }
    if let Some(rest) = name.strip_prefix('$') {
        let rest = rest
            .strip_prefix('{')
            .and_then(|r| r.strip_suffix('}'))
            .unwrap_or(rest);
        return is_identifier(rest);
    }
    ENV_VARS.contains(&name)
        || (name.contains('_')
            && name
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_'))
}

fn is_identifier(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// `AIza...wxyz` style masking for display
pub fn mask(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

fn api_key_file_path() -> Result<PathBuf> {
    let dir = crate::config::config_dir()?;
    fs::create_dir_all(&dir).context("Failed to create config directory")?;
    Ok(dir.join(API_KEY_FILE))
}

/// Store the key, preferring the OS keyring
pub fn set_api_key(key: &str) -> Result<KeyStorage> {
    if let Ok(entry) = keyring::Entry::new(SERVICE_NAME, API_KEY_USERNAME) {
        if entry.set_password(key).is_ok() {
            // Keep the file copy in sync; some keyrings read back unreliably
            let _ = save_to_file(key);
            return Ok(KeyStorage::Keyring);
        }
    }

    save_to_file(key)?;
    Ok(KeyStorage::File)
}

fn save_to_file(key: &str) -> Result<()> {
    let path = api_key_file_path()?;
    fs::write(&path, key).context("Failed to write API key file")?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o600))
            .context("Failed to set file permissions")?;
    }

    Ok(())
}

pub fn get_api_key() -> Result<String> {
    if let Ok(entry) = keyring::Entry::new(SERVICE_NAME, API_KEY_USERNAME) {
        if let Ok(key) = entry.get_password() {
            return Ok(key);
        }
    }

    let path = api_key_file_path()?;
    let key = fs::read_to_string(&path)
        .context("No stored API key. Run 'axioms config --set-api-key YOUR_KEY' first.")?;
    Ok(key.trim().to_string())
}

/// Remove the key from both the keyring and the file
pub fn delete_api_key() -> Result<()> {
    if let Ok(entry) = keyring::Entry::new(SERVICE_NAME, API_KEY_USERNAME) {
        let _ = entry.delete_credential();
    }

    let path = api_key_file_path()?;
    if path.exists() {
        fs::remove_file(&path).context("Failed to delete API key file")?;
    }
    Ok(())
}

pub fn has_api_key() -> bool {
    get_api_key().map(|k| !k.is_empty()).unwrap_or(false)
}
