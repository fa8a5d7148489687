//! # Sprite Merger
//!
//! Merge the icon atlases of several map styles into one atlas per density
//! tier.
//!
//! - Atlases with identical pixels and metadata are kept once.
//! - Survivors are stacked top to bottom; icon rectangles move down with them.
//! - A missing `@2x` atlas is synthesized by doubling its regular counterpart.
//!
//! ## Example
//!
//! ```
//! use image::{Rgba, RgbaImage};
//! use sprite_merger::{Icon, SourceAtlas, SpriteAtlas, SpriteMerger};
//!
//! let atlas = |h: u32, name: &str| {
//!     let icons = [(name.to_owned(), Icon::new(0, 0, 8, h))].into_iter().collect();
//!     SpriteAtlas::new(RgbaImage::from_pixel(8, h, Rgba([0, 0, 0, 255])), icons)
//! };
//!
//! let merged = SpriteMerger::default().merge(
//!     vec![SourceAtlas::new("1", atlas(8, "a")), SourceAtlas::new("2", atlas(4, "b"))],
//!     Vec::new(),
//! );
//!
//! let regular = merged.regular.unwrap();
//! assert_eq!(regular.height(), 12);
//! assert_eq!(regular.icons["b"].y, 8);
//! assert_eq!(merged.high_dpi.unwrap().height(), 24);
//! ```

mod atlas;
mod compose;
mod dedup;
mod error;
mod icon;
mod io;
mod merger;
mod options;

pub use atlas::{Fingerprint, HIGH_DPI_SCALE, SourceAtlas, SpriteAtlas};
pub use compose::compose;
pub use dedup::dedup;
pub use error::{Result, SpriteError};
pub use icon::{Icon, IconIndex};
pub use io::{
    HIGH_DPI_SUFFIX, SPRITE_JSON, SPRITE_PNG, SourceAtlases, collect_atlases, load_atlas_dir, load_sources,
    output_stem, source_index, write_atlas,
};
pub use merger::{MergedSprites, SpriteMerger};
pub use options::{HiDpiMatching, Options};
