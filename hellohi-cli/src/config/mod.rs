//! Connection settings
//!
//! Settings come from an optional TOML file and are then overridden by
//! `HELLOHI_*` environment variables (a `.env` file in the working directory
//! is loaded first).

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::api::constants::DEFAULT_TIMEOUT_SECS;
use crate::api::{CredentialSet, SessionConfig};

/// Connection settings for one tenant
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub auth_url: Option<String>,
    pub base_url: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub tenant_id: Option<String>,
    /// Pre-issued token; when set no OAuth grant is performed
    pub access_token: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl Config {
    /// Default config file location: `<config dir>/hellohi/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("hellohi").join("config.toml"))
    }

    /// Load file settings (explicit path, else the default path when it
    /// exists), then apply `.env` and process environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };

        if let Ok(path) = dotenvy::dotenv() {
            log::debug!("Loaded environment from {}", path.display());
        }
        config.apply_env(|key| std::env::var(key).ok())?;

        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Override fields from `HELLOHI_*` variables found through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let fields: [(&str, &mut Option<String>); 8] = [
            ("HELLOHI_AUTH_URL", &mut self.auth_url),
            ("HELLOHI_BASE_URL", &mut self.base_url),
            ("HELLOHI_CLIENT_ID", &mut self.client_id),
            ("HELLOHI_CLIENT_SECRET", &mut self.client_secret),
            ("HELLOHI_USERNAME", &mut self.username),
            ("HELLOHI_PASSWORD", &mut self.password),
            ("HELLOHI_TENANT_ID", &mut self.tenant_id),
            ("HELLOHI_ACCESS_TOKEN", &mut self.access_token),
        ];
        for (key, field) in fields {
            if let Some(value) = lookup(key).filter(|v| !v.is_empty()) {
                *field = Some(value);
            }
        }

        if let Some(value) = lookup("HELLOHI_TIMEOUT_SECS").filter(|v| !v.is_empty()) {
            let secs = value
                .parse::<u64>()
                .with_context(|| format!("HELLOHI_TIMEOUT_SECS is not a number: {}", value))?;
            self.timeout_secs = Some(secs);
        }

        Ok(())
    }

    /// Validate the settings and turn them into a session configuration
    pub fn session_config(&self) -> Result<SessionConfig> {
        let base_url = required(&self.base_url, "base_url", "HELLOHI_BASE_URL")?;

        let credentials = match &self.access_token {
            Some(token) => CredentialSet::BearerToken(token.clone()),
            None => {
                let client_id = required(&self.client_id, "client_id", "HELLOHI_CLIENT_ID")?;
                let client_secret =
                    required(&self.client_secret, "client_secret", "HELLOHI_CLIENT_SECRET")?;
                CredentialSet::from_parts(
                    client_id,
                    client_secret,
                    self.username.clone(),
                    self.password.clone(),
                )?
            }
        };

        let auth_url = match (&self.auth_url, &credentials) {
            (Some(url), _) => url.clone(),
            (None, CredentialSet::BearerToken(_)) => String::new(),
            (None, _) => format!("{}/oauth/token", base_url.trim_end_matches('/')),
        };

        let timeout = Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS));
        if timeout.is_zero() {
            bail!("timeout_secs must be greater than zero");
        }

        Ok(
            SessionConfig::new(auth_url, base_url, credentials, self.tenant_id.clone())
                .with_timeout(timeout),
        )
    }
}

fn required(value: &Option<String>, field: &str, env: &str) -> Result<String> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value.clone()),
        _ => bail!("Missing '{}' (set it in the config file or via {})", field, env),
    }
}
