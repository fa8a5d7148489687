//! Main SpriteMerger implementation

use log::{debug, info};

use crate::atlas::HIGH_DPI_SCALE;
use crate::compose::compose;
use crate::dedup::dedup;
use crate::options::{HiDpiMatching, Options};
use crate::{SourceAtlas, SpriteAtlas};

/// Result of merging both density tiers. A tier with nothing usable is `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedSprites {
    pub regular: Option<SpriteAtlas>,
    pub high_dpi: Option<SpriteAtlas>,
}

/// Sprite merger that combines the atlases of several sources into one
#[derive(Debug, Default)]
pub struct SpriteMerger {
    options: Options,
}

impl SpriteMerger {
    pub fn new(options: Options) -> Self {
        Self { options }
    }

    /// Merge regular and high-density atlases.
    ///
    /// Both tiers are deduplicated first. When their counts still differ, the
    /// high-density tier is rebuilt to follow the regular one: each regular
    /// atlas takes its matching @2x atlas, or a doubled copy of itself when
    /// there is none.
    pub fn merge(&self, regular: Vec<SourceAtlas>, high_dpi: Vec<SourceAtlas>) -> MergedSprites {
        let regular = dedup(regular);
        let high_dpi = dedup(high_dpi);
        info!("Merging {} regular and {} @2x sprite(s)", regular.len(), high_dpi.len());

        let high_dpi = if regular.len() == high_dpi.len() {
            high_dpi
        } else {
            self.complete_high_dpi(&regular, high_dpi)
        };

        MergedSprites {
            regular: compose(&regular),
            high_dpi: compose(&high_dpi),
        }
    }

    fn complete_high_dpi(&self, regular: &[SourceAtlas], high_dpi: Vec<SourceAtlas>) -> Vec<SourceAtlas> {
        let mut available: Vec<Option<SourceAtlas>> = high_dpi.into_iter().map(Some).collect();

        let completed: Vec<_> = regular
            .iter()
            .enumerate()
            .map(|(index, source)| {
                let slot = match self.options.hidpi_matching {
                    HiDpiMatching::ByName => available
                        .iter()
                        .position(|c| c.as_ref().is_some_and(|c| c.key == source.key)),
                    HiDpiMatching::ByPosition => (index < available.len()).then_some(index),
                };
                match slot.and_then(|i| available[i].take()) {
                    Some(found) => found,
                    None => {
                        debug!("Synthesizing @2x sprite for {}", source.key);
                        SourceAtlas::new(source.key.clone(), source.atlas.scaled(HIGH_DPI_SCALE))
                    }
                }
            })
            .collect();

        let orphans = available.iter().flatten().count();
        if orphans > 0 {
            debug!("Dropping {orphans} @2x sprite(s) without a regular counterpart");
        }
        completed
    }
}
