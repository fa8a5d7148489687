use std::{io, path::PathBuf, result};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpriteError {
    #[error("failed to decode or encode image: {0}")]
    Image(#[from] image::ImageError),

    #[error("invalid sprite metadata: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error on {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("sprite file missing: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),
}

impl SpriteError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}

pub type Result<T> = result::Result<T, SpriteError>;
