//! Stylemix Core - download, mix and retry pipeline for combined map styles.
//!
//! A *mix* is a named list of source style URLs. For every mix the pipeline
//! fetches the source styles with their sprites and glyphs, then merges them
//! into `mixed_styles/{mix_id}.json` plus one sprite atlas per density tier.

pub mod config;
pub mod error;
pub mod fetch;
pub mod io;
pub mod parallel;
pub mod pipeline;
pub mod status;

pub use config::{
    Auth, CONFIG_PATH_ENV, Config, DEFAULT_CONFIG_PATH, FALLBACK_GLYPHS_URL, MixConfig, RetryPolicy, Settings,
    SourceConfig,
};
pub use error::{ConfigError, FetchError, MixError, Result};
pub use fetch::{Fetch, HttpFetcher, basic_auth_header};
pub use io::Workspace;
pub use parallel::BatchResult;
pub use pipeline::{CycleReport, DownloadSummary, MixSummary, Pipeline, StyleDownloader, StyleMixer, run_stage};
pub use sprite_merger::HiDpiMatching;
pub use status::{State, Status, StatusHandle};
