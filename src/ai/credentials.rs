//! API key resolution and storage.
//!
//! Resolution order: a key the user stored in the OS keychain first, the
//! `GEMINI_API_KEY` environment variable second. Blank values count as
//! absent. Resolution happens on every gateway call, so adding or removing
//! a key takes effect on the next call.

use std::fmt;

use thiserror::Error;
use zeroize::Zeroize;

/// Environment variable consulted when no stored key exists.
pub const ENV_VAR: &str = "GEMINI_API_KEY";

/// Service name for keyring entries.
const SERVICE_NAME: &str = "solarplan";

/// Entry name for the Gemini key.
const KEY_NAME: &str = "gemini_api_key";

/// Errors from the key store.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// Failed to access the system keychain.
    #[error("failed to access system keychain: {0}")]
    Keychain(String),
}

/// An API key, zeroed on drop.
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct ApiKey {
    value: String,
}

impl ApiKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self { value: value.into() }
    }

    /// Get the key value.
    ///
    /// Note: use sparingly and ensure the value is not logged.
    pub fn expose(&self) -> &str {
        &self.value
    }

    /// Short fingerprint safe to display (first and last four characters).
    pub fn fingerprint(&self) -> String {
        let chars: Vec<char> = self.value.chars().collect();
        if chars.len() <= 8 {
            return "****".to_string();
        }
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}****{tail}")
    }
}

// Prevent accidental logging of keys
impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiKey([REDACTED])")
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

/// Resolves the key the gateway should use for a call.
#[derive(Debug, Clone)]
pub struct CredentialResolver {
    service: String,
}

impl Default for CredentialResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialResolver {
    pub fn new() -> Self {
        Self { service: SERVICE_NAME.to_string() }
    }

    /// Resolve the key to use right now: stored first, environment second.
    pub fn resolve(&self) -> Option<ApiKey> {
        pick(self.stored_key(), env_key())
    }

    /// Whether any usable key is currently configured.
    pub fn is_available(&self) -> bool {
        self.resolve().is_some()
    }

    /// Fingerprint of the stored key, if one exists.
    pub fn stored_fingerprint(&self) -> Option<String> {
        self.stored_key().and_then(non_blank).map(|key| ApiKey::new(key).fingerprint())
    }

    /// Save a key to the keychain.
    pub fn store(&self, key: &str) -> Result<(), CredentialError> {
        self.entry()?.set_password(key).map_err(|e| CredentialError::Keychain(e.to_string()))
    }

    /// Remove the stored key. Removing a key that does not exist is fine.
    pub fn clear(&self) -> Result<(), CredentialError> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(CredentialError::Keychain(e.to_string())),
        }
    }

    fn entry(&self) -> Result<keyring::Entry, CredentialError> {
        keyring::Entry::new(&self.service, KEY_NAME)
            .map_err(|e| CredentialError::Keychain(e.to_string()))
    }

    fn stored_key(&self) -> Option<String> {
        let entry = keyring::Entry::new(&self.service, KEY_NAME).ok()?;
        entry.get_password().ok()
    }
}

fn env_key() -> Option<String> {
    std::env::var(ENV_VAR).ok()
}

/// Precedence rule: stored key beats environment key; blanks are absent.
fn pick(stored: Option<String>, env: Option<String>) -> Option<ApiKey> {
    stored.and_then(non_blank).or_else(|| env.and_then(non_blank)).map(ApiKey::new)
}

fn non_blank(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_stored_key_takes_precedence() {
        let key = pick(Some("stored".to_string()), Some("env".to_string())).unwrap();
        assert_eq!(key.expose(), "stored");
    }

    #[test]
    fn test_blank_stored_key_falls_back_to_env() {
        let key = pick(Some("   ".to_string()), Some("env".to_string())).unwrap();
        assert_eq!(key.expose(), "env");
    }

    #[test]
    fn test_no_key_resolves_to_none() {
        assert!(pick(None, None).is_none());
        assert!(pick(Some(String::new()), Some("  ".to_string())).is_none());
    }

    #[test]
    fn test_fingerprint_hides_middle() {
        let key = ApiKey::new("AIzaSyExampleExample9f3Q");
        let fingerprint = key.fingerprint();
        assert!(fingerprint.starts_with("AIza"));
        assert!(fingerprint.ends_with("9f3Q"));
        assert!(!fingerprint.contains("Example"));

        assert_eq!(ApiKey::new("short").fingerprint(), "****");
    }

    #[test]
    fn test_debug_is_redacted() {
        let key = ApiKey::new("super-secret");
        assert!(!format!("{key:?}").contains("super-secret"));
        assert!(!format!("{key}").contains("super-secret"));
    }

    #[test]
    #[serial]
    fn test_env_key_is_read_from_environment() {
        std::env::set_var(ENV_VAR, "from-env");
        assert_eq!(env_key().as_deref(), Some("from-env"));

        std::env::remove_var(ENV_VAR);
        assert!(env_key().is_none());
    }
}
