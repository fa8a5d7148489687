//! Mix configuration and runtime settings.

use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sprite_merger::HiDpiMatching;

use crate::ConfigError;

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "CONFIG_PATH";

/// Config file used when neither `--config` nor `CONFIG_PATH` is given.
pub const DEFAULT_CONFIG_PATH: &str = "configs/styles_config.yaml";

/// Glyph source tried when a style's own glyph endpoint has no range.
pub const FALLBACK_GLYPHS_URL: &str = "https://demotiles.maplibre.org/font/{fontstack}/{range}.pbf";

const REDACTED: &str = "***";

/// Top-level YAML document: `styles: {mix_id: MixConfig}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub styles: IndexMap<String, MixConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MixConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

/// A source entry: either a bare URL or a table with auth and prefix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourceConfig {
    Url(String),
    Detailed {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        auth: Option<Auth>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        prefix: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Auth {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl Auth {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self { username: Some(username.into()), password: Some(password.into()) }
    }

    /// `(username, password)` when both are present.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        Some((self.username.as_deref()?, self.password.as_deref()?))
    }
}

impl SourceConfig {
    pub fn url(&self) -> &str {
        match self {
            Self::Url(url) | Self::Detailed { url, .. } => url,
        }
    }

    pub fn auth(&self) -> Option<&Auth> {
        match self {
            Self::Url(_) => None,
            Self::Detailed { auth, .. } => auth.as_ref(),
        }
    }

    pub fn prefix(&self) -> Option<&str> {
        match self {
            Self::Url(_) => None,
            Self::Detailed { prefix, .. } => prefix.as_deref(),
        }
    }
}

impl Config {
    /// Config path from `CONFIG_PATH`, else [`DEFAULT_CONFIG_PATH`].
    pub fn default_path() -> PathBuf {
        env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    /// Read and validate a YAML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        Self::from_yaml(&text).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse { path: path.to_path_buf(), source },
            other => other,
        })
    }

    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)
            .map_err(|source| ConfigError::Parse { path: PathBuf::new(), source })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (mix_id, mix) in &self.styles {
            for (index, source) in mix.sources.iter().enumerate() {
                if source.auth().is_some_and(|auth| auth.credentials().is_none()) {
                    return Err(ConfigError::IncompleteAuth { mix: mix_id.clone(), index });
                }
            }
        }
        Ok(())
    }

    pub fn mix(&self, mix_id: &str) -> Result<&MixConfig, ConfigError> {
        self.styles
            .get(mix_id)
            .ok_or_else(|| ConfigError::UnknownMix(mix_id.to_owned()))
    }

    /// Copy with every password replaced by `***`.
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        for mix in config.styles.values_mut() {
            for source in &mut mix.sources {
                if let SourceConfig::Detailed { auth: Some(auth), .. } = source
                    && auth.password.is_some()
                {
                    auth.password = Some(REDACTED.to_owned());
                }
            }
        }
        config
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

/// Bounded retry with capped exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 20,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(20),
        }
    }
}

impl RetryPolicy {
    /// Wait after failed attempt `attempt` (1-based): `min(base · 2^(attempt-1), max)`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Runtime options not carried in the YAML file.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Root under which `raw_styles/`, `sprites/`, `fonts/`, `sprite/` and
    /// `mixed_styles/` live.
    pub work_dir: PathBuf,
    pub request_timeout: Duration,
    /// Worker threads per font stack.
    pub glyph_concurrency: usize,
    pub fallback_glyphs_url: String,
    pub hidpi_matching: HiDpiMatching,
    pub retry: RetryPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("."),
            request_timeout: Duration::from_secs(30),
            glyph_concurrency: 8,
            fallback_glyphs_url: FALLBACK_GLYPHS_URL.to_owned(),
            hidpi_matching: HiDpiMatching::default(),
            retry: RetryPolicy::default(),
        }
    }
}

impl Settings {
    pub fn work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = dir.into();
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn hidpi_matching(mut self, matching: HiDpiMatching) -> Self {
        self.hidpi_matching = matching;
        self
    }

    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}
