use std::env;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use eyre::{Result, WrapErr, eyre};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

pub const DEFAULT_API_BASE: &str = "https://api-inference.huggingface.co/";
pub const DEFAULT_SIMULATED_DELAY_MS: u64 = 10;

/// Environment variables checked for the bearer token, in order.
pub const TOKEN_ENV_VARS: [&str; 2] = ["HF_API_TOKEN", "NEXT_PUBLIC_HF_API_TOKEN"];
pub const API_BASE_ENV_VAR: &str = "HF_API_BASE";

const CONFIG_DIR_NAME: &str = "finslm-chat";
const CONFIG_FILE_NAME: &str = "config.json";

/// Which exchange provider answers chat turns
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Hugging Face Inference API
    #[default]
    Live,
    /// Canned replies after a fixed delay, no network
    Simulated,
}

/// Settings handed to the exchange provider at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    pub provider: ProviderKind,
    pub api_base: String,
    /// Preferred model id or display name
    pub model: Option<String>,
    pub simulated_delay_ms: u64,
    #[serde(skip_serializing)]
    pub api_token: Option<String>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            api_base: DEFAULT_API_BASE.to_string(),
            model: None,
            simulated_delay_ms: DEFAULT_SIMULATED_DELAY_MS,
            api_token: None,
        }
    }
}

/// Command-line values that take precedence over file and environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub provider: Option<ProviderKind>,
    pub model: Option<String>,
    pub api_base: Option<String>,
}

impl ChatConfig {
    /// Build the effective configuration: defaults, then the config file,
    /// then the process environment, then command-line overrides.
    pub fn load(path: Option<&Path>, overrides: ConfigOverrides) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };

        config.apply_env(|key| env::var(key).ok());
        config.apply_overrides(overrides);
        config.normalize()?;

        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read config file {}", path.display()))?;
        let config: ChatConfig = serde_json::from_str(&data)
            .wrap_err_with(|| format!("Invalid config file {}", path.display()))?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = TOKEN_ENV_VARS
            .iter()
            .filter_map(|key| lookup(*key))
            .find(|value| !value.trim().is_empty());
        if let Some(token) = token {
            self.api_token = Some(token.trim().to_string());
        }

        if let Some(api_base) = lookup(API_BASE_ENV_VAR).filter(|v| !v.trim().is_empty()) {
            self.api_base = api_base;
        }
    }

    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(provider) = overrides.provider {
            self.provider = provider;
        }
        if let Some(model) = overrides.model {
            self.model = Some(model);
        }
        if let Some(api_base) = overrides.api_base {
            self.api_base = api_base;
        }
    }

    /// Validate the endpoint base and make sure it ends with a slash so that
    /// `models/{id}` joins under it rather than replacing its last segment.
    pub fn normalize(&mut self) -> Result<()> {
        let trimmed = self.api_base.trim();
        let with_slash = if trimmed.ends_with('/') {
            trimmed.to_string()
        } else {
            format!("{}/", trimmed)
        };

        let url = Url::parse(&with_slash)
            .map_err(|e| eyre!("Invalid API base URL '{}': {}", self.api_base, e))?;
        if url.cannot_be_a_base() {
            return Err(eyre!("API base URL '{}' cannot be used as a base", self.api_base));
        }

        self.api_base = url.to_string();
        Ok(())
    }

    pub fn has_token(&self) -> bool {
        self.api_token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}
