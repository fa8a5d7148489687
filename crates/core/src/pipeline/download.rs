//! Download stage: source styles, their sprites and their glyphs.

use indexmap::IndexSet;
use log::{debug, error, info, warn};
use style_merger::{SourceStyle, assign_prefixes, font_references};

use super::glyphs::{FontJob, GlyphDownloader, is_valid_fontstack};
use crate::{
    Config, Fetch, MixConfig, MixError, Result, Settings, SourceConfig,
    io::{Workspace, write_file},
    parallel::BatchResult,
};

/// What one mix's download produced.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DownloadSummary {
    pub styles: usize,
    pub sprite_files: usize,
    pub font_stacks: usize,
}

/// Fetches everything a mix needs into the workspace.
pub struct StyleDownloader<'a, F: Fetch> {
    config: &'a Config,
    settings: &'a Settings,
    fetcher: &'a F,
    workspace: Workspace,
}

impl<'a, F: Fetch> StyleDownloader<'a, F> {
    pub fn new(config: &'a Config, settings: &'a Settings, fetcher: &'a F) -> Self {
        Self { config, settings, fetcher, workspace: Workspace::new(&settings.work_dir) }
    }

    /// Download every configured mix. The download directories are wiped
    /// first; failing to prepare them is the only error returned. A failing
    /// mix is logged and counted.
    pub fn download_all(&self) -> Result<BatchResult> {
        self.workspace.reset_downloads()?;

        let mut result = BatchResult::default();
        for (mix_id, mix) in &self.config.styles {
            let outcome = self.process_mix(mix_id, mix);
            match &outcome {
                Ok(summary) => info!(
                    "Downloaded {mix_id}: {} styles, {} sprite files, {} font stacks",
                    summary.styles, summary.sprite_files, summary.font_stacks
                ),
                Err(e) => error!("Error downloading {mix_id}: {e}"),
            }
            result.record(&outcome);
        }
        Ok(result)
    }

    /// Download a single mix, replacing only that mix's earlier downloads.
    pub fn download_mix(&self, mix_id: &str) -> Result<DownloadSummary> {
        let mix = self.config.mix(mix_id)?;
        self.workspace.reset_mix_downloads(mix_id)?;
        self.process_mix(mix_id, mix)
    }

    fn process_mix(&self, mix_id: &str, mix: &MixConfig) -> Result<DownloadSummary> {
        info!("Downloading {} source style(s) for {mix_id}", mix.sources.len());

        let mut styles = Vec::with_capacity(mix.sources.len());
        for (index, source) in mix.sources.iter().enumerate() {
            styles.push(self.download_source_style(mix_id, index + 1, source)?);
        }

        let prefixes = assign_prefixes(
            styles
                .iter()
                .zip(&mix.sources)
                .map(|(style, source)| (style, source.prefix())),
        );

        let mut summary = DownloadSummary { styles: styles.len(), ..Default::default() };
        for (index, style) in styles.iter().enumerate() {
            summary.sprite_files += self.download_sprites(mix_id, index + 1, style);
        }

        let jobs: IndexSet<FontJob> = styles
            .iter()
            .zip(&prefixes)
            .flat_map(|(style, prefix)| {
                font_references(style.layers())
                    .into_iter()
                    .filter(move |fontstack| {
                        let valid = is_valid_fontstack(fontstack);
                        if !valid {
                            warn!("Skipping font stack {fontstack:?} in {mix_id}: not a plain directory name");
                        }
                        valid
                    })
                    .map(move |fontstack| FontJob {
                        prefix: prefix.to_string(),
                        fontstack,
                        template: style.glyphs_url().map(str::to_owned),
                    })
            })
            .collect();

        let glyphs = GlyphDownloader::new(
            self.fetcher,
            &self.settings.fallback_glyphs_url,
            self.settings.glyph_concurrency,
        );
        for job in &jobs {
            let font_dir = self.workspace.font_dir(&job.prefix, &job.fontstack);
            if let Some(ranges) = glyphs.download(job, &font_dir)?
                && ranges.failed > 0
            {
                warn!("{}/{}: {} glyph range(s) unavailable", job.prefix, job.fontstack, ranges.failed);
            }
            summary.font_stacks += 1;
        }

        Ok(summary)
    }

    /// Fetch, parse and persist source `n` of a mix.
    fn download_source_style(&self, mix_id: &str, n: usize, source: &SourceConfig) -> Result<SourceStyle> {
        debug!("Downloading source {n}: {}", source.url());
        let bytes = self.fetcher.fetch(source.url(), source.auth())?;
        let style = SourceStyle::from_slice(&bytes)
            .map_err(|e| MixError::Parse { what: source.url().to_owned(), source: e })?;

        let path = self.workspace.raw_style_path(mix_id, n);
        let pretty = serde_json::to_string_pretty(style.as_map())
            .map_err(|e| MixError::Serialize { what: path.display().to_string(), source: e })?;
        write_file(&path, pretty)?;
        Ok(style)
    }

    /// Fetch `{url}.json/.png` and `{url}@2x.json/.png`. Failures are logged
    /// and skipped; returns the number of files written.
    fn download_sprites(&self, mix_id: &str, n: usize, style: &SourceStyle) -> usize {
        let Some(url) = style.sprite_url() else {
            return 0;
        };

        let mut written = 0;
        for (suffix, high_dpi) in [("", false), ("@2x", true)] {
            let dir = self.workspace.source_sprite_dir(mix_id, n, high_dpi);
            for ext in ["json", "png"] {
                let file_url = format!("{url}{suffix}.{ext}");
                let outcome = self
                    .fetcher
                    .fetch(&file_url, None)
                    .map_err(MixError::from)
                    .and_then(|bytes| write_file(&dir.join(format!("sprite.{ext}")), bytes));
                match outcome {
                    Ok(()) => written += 1,
                    Err(e) => warn!("Sprite file unavailable: {e}"),
                }
            }
        }
        written
    }
}
