//! Mix stage: merge downloaded styles and sprites into one style per mix.

use log::{error, info, warn};
use sprite_merger::{MergedSprites, Options as SpriteOptions, SpriteError, SpriteMerger, collect_atlases, output_stem, write_atlas};
use style_merger::{SourceStyle, StyleMerger};

use crate::{
    Config, MixConfig, MixError, Result, Settings,
    io::{Workspace, read_file, write_file},
    parallel::BatchResult,
};

/// What one mix produced.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MixSummary {
    pub sources: usize,
    pub layers: usize,
    pub filters: usize,
    pub sprite: bool,
    pub high_dpi_sprite: bool,
}

pub struct StyleMixer<'a> {
    config: &'a Config,
    workspace: Workspace,
    styles: StyleMerger,
    sprites: SpriteMerger,
}

impl<'a> StyleMixer<'a> {
    pub fn new(config: &'a Config, settings: &Settings) -> Self {
        Self {
            config,
            workspace: Workspace::new(&settings.work_dir),
            styles: StyleMerger::default(),
            sprites: SpriteMerger::new(SpriteOptions::new().hidpi_matching(settings.hidpi_matching)),
        }
    }

    /// Mix every configured style. Output directories are wiped first;
    /// failing to prepare them is the only error returned.
    pub fn mix_all(&self) -> Result<BatchResult> {
        self.workspace.reset_outputs()?;
        info!("Starting mixing of all styles");

        let mut result = BatchResult::default();
        for (mix_id, mix) in &self.config.styles {
            let outcome = self.mix_one(mix_id, mix);
            if let Err(e) = &outcome {
                error!("Error mixing {mix_id}: {e}");
            }
            result.record(&outcome);
        }

        info!("Style mixing completed: {} succeeded, {} failed", result.succeeded, result.failed);
        Ok(result)
    }

    pub fn mix(&self, mix_id: &str) -> Result<MixSummary> {
        let mix = self.config.mix(mix_id)?;
        self.workspace.reset_mix_outputs(mix_id)?;
        self.mix_one(mix_id, mix)
    }

    fn mix_one(&self, mix_id: &str, mix: &MixConfig) -> Result<MixSummary> {
        info!("Starting style mixing: {mix_id}");

        let sources = self.load_source_styles(mix_id, mix)?;
        if sources.is_empty() {
            warn!("No source styles found for {mix_id}");
        }

        let sprites = if sources.is_empty() { MergedSprites::default() } else { self.merge_sprites(mix_id)? };

        let (mut mixed, _) = self.styles.merge_with_prefixes(mix_id, mix.name.as_deref(), &sources);
        mixed.attach_sprite(sprites.regular.is_some());

        let path = self.workspace.mixed_style_path(mix_id);
        let json = mixed
            .to_json_pretty()
            .map_err(|e| MixError::Serialize { what: path.display().to_string(), source: e })?;
        write_file(&path, json)?;

        let summary = MixSummary {
            sources: mixed.sources.len(),
            layers: mixed.layers.len(),
            filters: mixed.filter_count(),
            sprite: sprites.regular.is_some(),
            high_dpi_sprite: sprites.high_dpi.is_some(),
        };
        info!(
            "Mixed style completed: {} sources, {} layers, {} filters",
            summary.sources, summary.layers, summary.filters
        );
        Ok(summary)
    }

    /// Raw styles `1..=n` paired with their configured prefixes.
    fn load_source_styles(&self, mix_id: &str, mix: &MixConfig) -> Result<Vec<(SourceStyle, Option<String>)>> {
        mix.sources
            .iter()
            .enumerate()
            .map(|(index, source)| {
                let path = self.workspace.raw_style_path(mix_id, index + 1);
                let style = SourceStyle::from_slice(&read_file(&path)?)
                    .map_err(|e| MixError::Parse { what: path.display().to_string(), source: e })?;
                Ok((style, source.prefix().map(str::to_owned)))
            })
            .collect()
    }

    /// Merge and write both sprite tiers. Returns the tiers actually written.
    fn merge_sprites(&self, mix_id: &str) -> Result<MergedSprites> {
        let sources = collect_atlases(&self.workspace.sprites_dir(), mix_id)?;
        let merged = self.sprites.merge(sources.regular, sources.high_dpi);

        let out_dir = self.workspace.sprite_out_dir();
        let mut written = MergedSprites::default();
        for (atlas, high_dpi) in [(merged.regular, false), (merged.high_dpi, true)] {
            let Some(atlas) = atlas else { continue };
            match write_atlas(&atlas, &out_dir, &output_stem(mix_id, high_dpi)) {
                Ok(()) => {
                    let suffix = if high_dpi { " @2x" } else { "" };
                    info!("Merged{suffix} sprite for {mix_id}: {}x{}", atlas.width(), atlas.height());
                    let tier = if high_dpi { &mut written.high_dpi } else { &mut written.regular };
                    *tier = Some(atlas);
                }
                Err(e @ SpriteError::Io { .. }) => return Err(e.into()),
                Err(e) => warn!("Skipping sprite output for {mix_id}: {e}"),
            }
        }
        Ok(written)
    }
}
