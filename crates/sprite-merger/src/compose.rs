//! Stack atlases vertically into one.

use image::{RgbaImage, imageops};
use log::{debug, warn};

use crate::{IconIndex, SourceAtlas, SpriteAtlas};

/// Compose a tier of atlases.
///
/// Zero usable atlases yield `None`; one is returned as is; more are stacked
/// top to bottom in input order at `x = 0`, with every icon shifted down by the
/// heights of the atlases above it. Empty images are skipped, as is any atlas
/// that would push the total height past `u32::MAX`.
pub fn compose(atlases: &[SourceAtlas]) -> Option<SpriteAtlas> {
    let mut usable = Vec::with_capacity(atlases.len());
    let mut total_height: u32 = 0;

    for source in atlases {
        if source.atlas.is_empty() {
            warn!("Skipping sprite {}: empty image", source.key);
            continue;
        }
        match total_height.checked_add(source.atlas.height()) {
            Some(height) => {
                total_height = height;
                usable.push(&source.atlas);
            }
            None => warn!("Skipping sprite {}: stacked height overflows", source.key),
        }
    }

    match usable.as_slice() {
        [] => None,
        [single] => Some((*single).clone()),
        many => Some(stack(many, total_height)),
    }
}

fn stack(atlases: &[&SpriteAtlas], height: u32) -> SpriteAtlas {
    let width = atlases.iter().map(|a| a.width()).max().unwrap_or(0);
    let mut canvas = RgbaImage::new(width, height);
    let mut icons = IconIndex::new();
    let mut y_offset: u32 = 0;

    for atlas in atlases {
        imageops::replace(&mut canvas, &atlas.image, 0, i64::from(y_offset));
        for (name, icon) in &atlas.icons {
            icons.insert(name.clone(), icon.rebased(y_offset));
        }
        debug!("Placed {}x{} atlas at y={y_offset}", atlas.width(), atlas.height());
        y_offset += atlas.height();
    }

    SpriteAtlas::new(canvas, icons)
}
