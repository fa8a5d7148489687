//! Download-then-mix pipeline with retry.

mod download;
mod glyphs;
mod mix;

pub use download::{DownloadSummary, StyleDownloader};
pub use glyphs::{FontJob, GLYPH_RANGE_SIZE, GlyphDownloader, MAX_CODEPOINT, encode_fontstack, glyph_ranges, glyph_url, is_valid_fontstack};
pub use mix::{MixSummary, StyleMixer};

use std::{thread::sleep, time::Instant};

use anyhow::{Context, Result, bail};
use log::{error, info, warn};

use crate::{
    Config, Fetch, Settings,
    parallel::BatchResult,
    status::{Status, StatusHandle},
};

/// Counts from one download-then-mix cycle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub downloaded: BatchResult,
    pub mixed: BatchResult,
}

/// Run `f` as a named stage, logging its duration.
pub fn run_stage<T>(name: &str, f: impl FnOnce() -> Result<T>) -> Result<T> {
    info!("[{name}] starting");
    let start = Instant::now();
    let value = f().with_context(|| format!("{name} stage failed"))?;
    info!("[{name}] done ({:.2}s)", start.elapsed().as_secs_f64());
    Ok(value)
}

/// Owns the config, the fetcher and the published status.
pub struct Pipeline<F: Fetch> {
    config: Config,
    settings: Settings,
    fetcher: F,
    status: StatusHandle,
}

impl<F: Fetch> Pipeline<F> {
    pub fn new(config: Config, settings: Settings, fetcher: F) -> Self {
        Self { config, settings, fetcher, status: StatusHandle::new() }
    }

    /// Handle for readers of the pipeline status.
    pub fn status(&self) -> StatusHandle {
        self.status.clone()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn downloader(&self) -> StyleDownloader<'_, F> {
        StyleDownloader::new(&self.config, &self.settings, &self.fetcher)
    }

    pub fn mixer(&self) -> StyleMixer<'_> {
        StyleMixer::new(&self.config, &self.settings)
    }

    /// Download every mix, then mix every mix.
    ///
    /// Fails when a stage cannot prepare its directories or when no mix made
    /// it through; individual mix failures are only logged.
    pub fn run_cycle(&self) -> Result<CycleReport> {
        self.status.set(Status::downloading());
        let downloaded = run_stage("download", || Ok(self.downloader().download_all()?))?;

        self.status.set(Status::mixing());
        let mixed = run_stage("mix", || Ok(self.mixer().mix_all()?))?;

        if mixed.all_failed() {
            bail!("all {} mix(es) failed", mixed.total());
        }

        self.status.set(Status::ready());
        Ok(CycleReport { downloaded, mixed })
    }

    /// Run cycles until one succeeds or the retry policy is exhausted,
    /// publishing status along the way.
    pub fn run_with_retry(&self) -> Result<CycleReport> {
        let policy = self.settings.retry;
        let max_attempts = policy.max_attempts.max(1);

        let mut attempt = 1;
        loop {
            info!("Starting initialization (attempt {attempt}/{max_attempts})...");
            match self.run_cycle() {
                Ok(report) => {
                    info!("Styles successfully loaded and mixed");
                    return Ok(report);
                }
                Err(e) => {
                    self.status.set(Status::failed(format!("{e:#}")));
                    if attempt >= max_attempts {
                        error!("Failed to initialize styles after {max_attempts} attempts: {e:#}");
                        return Err(e.context(format!("giving up after {max_attempts} attempts")));
                    }
                    let delay = policy.delay_for(attempt);
                    warn!(
                        "Initialization failed (attempt {attempt}/{max_attempts}): {e:#}. Retrying in {}s...",
                        delay.as_secs_f64()
                    );
                    sleep(delay);
                    attempt += 1;
                }
            }
        }
    }
}
