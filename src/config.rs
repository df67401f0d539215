use std::fmt;
use thiserror::Error;

pub const PEXELS_KEY_VAR: &str = "PEXELS_API_KEY";
pub const FREESOUND_KEY_VAR: &str = "FREESOUND_API_KEY";

const PEXELS_SEARCH_URL: &str = "https://api.pexels.com/videos/search";
const FREESOUND_API_URL: &str = "https://freesound.org/apiv2";

const KEY_PREVIEW_CHARS: usize = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("environment variable {0} is missing or empty")]
    MissingCredential(&'static str),
}

/// Credentials and endpoint addresses for one run.
#[derive(Clone)]
pub struct Config {
    pub pexels_key: String,
    pub freesound_key: String,
    pub pexels_url: String,
    pub freesound_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let pexels_key = required(&lookup, PEXELS_KEY_VAR)?;
        let freesound_key = required(&lookup, FREESOUND_KEY_VAR)?;

        Ok(Self {
            pexels_key,
            freesound_key,
            pexels_url: PEXELS_SEARCH_URL.to_string(),
            freesound_url: FREESOUND_API_URL.to_string(),
        })
    }

    /// Short prefix of the Pexels key for the startup banner. Never more
    /// than half of the key is shown.
    pub fn key_preview(&self) -> String {
        let total = self.pexels_key.chars().count();
        let shown = KEY_PREVIEW_CHARS.min(total / 2);
        let prefix: String = self.pexels_key.chars().take(shown).collect();
        format!("{}...", prefix)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("pexels_key", &"<redacted>")
            .field("freesound_key", &"<redacted>")
            .field("pexels_url", &self.pexels_url)
            .field("freesound_url", &self.freesound_url)
            .finish()
    }
}

fn required<F>(lookup: &F, name: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(ConfigError::MissingCredential(name)),
    }
}
