//! API credential handling.

use crate::error::{KhayalError, Result};

/// Environment variables checked for the API key, in priority order.
pub const API_KEY_ENV_VARS: [&str; 3] = ["GEMINI_API_KEY", "API_KEY", "GOOGLE_API_KEY"];

/// An optional API key.
///
/// A missing or blank key is a valid state: the backend still builds, and every
/// operation reports [`KhayalError::MissingCredential`] before touching the
/// network.
#[derive(Clone, Default)]
pub struct Credential(Option<String>);

impl Credential {
    /// Wraps an explicit key. Blank keys count as missing.
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        if key.trim().is_empty() {
            Self(None)
        } else {
            Self(Some(key))
        }
    }

    /// A credential with no key.
    pub fn missing() -> Self {
        Self(None)
    }

    /// Reads the first non-empty key from [`API_KEY_ENV_VARS`].
    pub fn from_env() -> Self {
        API_KEY_ENV_VARS
            .iter()
            .filter_map(|name| std::env::var(name).ok())
            .map(Self::new)
            .find(Self::is_available)
            .unwrap_or_default()
    }

    /// Returns true if a usable key is configured.
    pub fn is_available(&self) -> bool {
        self.0.is_some()
    }

    /// Returns the key, or the configuration error if none is set.
    pub fn require(&self) -> Result<&str> {
        self.0.as_deref().ok_or(KhayalError::MissingCredential)
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Some(_) => f.write_str("Credential(<redacted>)"),
            None => f.write_str("Credential(<missing>)"),
        }
    }
}
