//! Error kinds of the download and mix pipeline.

use std::{io, path::PathBuf};

use sprite_merger::SpriteError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("invalid config {}: {source}", path.display())]
    Parse { path: PathBuf, source: serde_yaml::Error },

    #[error("style '{0}' not found in config")]
    UnknownMix(String),

    #[error("mix '{mix}' source {index}: auth requires both username and password")]
    IncompleteAuth { mix: String, index: usize },
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("failed to fetch {url}: {source}")]
    Request { url: String, source: reqwest::Error },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },
}

/// Failure of one mix. Never aborts other mixes.
#[derive(Error, Debug)]
pub enum MixError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("failed to parse {what}: {source}")]
    Parse { what: String, source: style_merger::Error },

    #[error("sprite error: {0}")]
    Image(#[from] SpriteError),

    #[error("filesystem error on {}: {source}", path.display())]
    Filesystem { path: PathBuf, source: io::Error },

    #[error("failed to serialize {what}: {source}")]
    Serialize { what: String, source: serde_json::Error },

    #[error("failed to start worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

impl MixError {
    pub(crate) fn fs(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Filesystem { path: path.into(), source }
    }
}

pub type Result<T> = std::result::Result<T, MixError>;
