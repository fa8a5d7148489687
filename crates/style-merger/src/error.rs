use std::result;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to parse style document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("style document root must be a JSON object, found {0}")]
    NotAnObject(&'static str),
}

pub type Result<T> = result::Result<T, Error>;
