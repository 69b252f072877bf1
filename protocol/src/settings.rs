use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sweeptoken_core::{Coord, GameConfig, GameError, MAX_SIZE};
use thiserror::Error;

use crate::{CipherError, TokenCipher};

/// Operator secret for the credential cipher.
pub const CRYPTO_KEY_VAR: &str = "CRYPTO_KEY";

/// Platform access credential, used as the cipher secret when no operator secret is set.
pub const PLATFORM_TOKEN_VAR: &str = "TOKEN";

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Could not read settings file")]
    Io(#[from] std::io::Error),
    #[error("Could not parse settings file")]
    Parse(#[from] toml::de::Error),
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub size: Coord,
    pub crypto_key: Option<String>,
    pub platform_token: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            size: MAX_SIZE,
            crypto_key: None,
            platform_token: None,
        }
    }
}

impl Settings {
    pub fn from_toml(text: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path)?;
        let settings = Self::from_toml(&text)?;
        log::debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Overrides secrets with any that `lookup` finds under their environment names.
    pub fn overlay_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(key) = lookup(CRYPTO_KEY_VAR) {
            self.crypto_key = Some(key);
        }
        if let Some(token) = lookup(PLATFORM_TOKEN_VAR) {
            self.platform_token = Some(token);
        }
        self
    }

    pub fn from_env(self) -> Self {
        self.overlay_env(|name| std::env::var(name).ok())
    }

    pub fn config(&self) -> Result<GameConfig, GameError> {
        GameConfig::new(self.size)
    }

    pub fn cipher_secret(&self) -> Option<&str> {
        self.crypto_key
            .as_deref()
            .or(self.platform_token.as_deref())
    }

    /// `None` when no secret is configured at all.
    pub fn cipher(&self) -> Result<Option<TokenCipher>, CipherError> {
        self.cipher_secret()
            .map(|secret| TokenCipher::new(secret.as_bytes()))
            .transpose()
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("size", &self.size)
            .field("crypto_key", &self.crypto_key.as_ref().map(|_| "<redacted>"))
            .field("platform_token", &self.platform_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
