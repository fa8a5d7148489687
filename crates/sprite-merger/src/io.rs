//! Sprite atlas files on disk.
//!
//! A source atlas is a directory holding `sprite.png` and `sprite.json`; a
//! directory name ending in `_@2x` marks the high-density tier. Merged atlases
//! are written as `{stem}.png` / `{stem}.json`.

use std::{
    fs,
    path::{Path, PathBuf},
};

use glob::{Pattern, glob};
use log::{debug, warn};

use crate::{Result, SourceAtlas, SpriteAtlas, SpriteError};

pub const SPRITE_PNG: &str = "sprite.png";
pub const SPRITE_JSON: &str = "sprite.json";
pub const HIGH_DPI_SUFFIX: &str = "_@2x";

/// Source atlases split by density tier.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceAtlases {
    pub regular: Vec<SourceAtlas>,
    pub high_dpi: Vec<SourceAtlas>,
}

/// Load `sprite.png` + `sprite.json` from one directory.
pub fn load_atlas_dir(dir: &Path) -> Result<SpriteAtlas> {
    let png_path = dir.join(SPRITE_PNG);
    let json_path = dir.join(SPRITE_JSON);
    for path in [&png_path, &json_path] {
        if !path.is_file() {
            return Err(SpriteError::MissingFile(path.clone()));
        }
    }
    let png = fs::read(&png_path).map_err(|e| SpriteError::io(&png_path, e))?;
    let json = fs::read(&json_path).map_err(|e| SpriteError::io(&json_path, e))?;
    SpriteAtlas::from_bytes(&png, &json)
}

/// Load the given atlas directories, keyed by directory name with any `_@2x`
/// suffix removed. Directories that fail to load are skipped.
pub fn load_sources<P: AsRef<Path>>(dirs: impl IntoIterator<Item = P>) -> SourceAtlases {
    let mut sources = SourceAtlases::default();
    for dir in dirs {
        let dir = dir.as_ref();
        let name = dir.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        let (key, high_dpi) = match name.strip_suffix(HIGH_DPI_SUFFIX) {
            Some(key) => (key, true),
            None => (name, false),
        };

        let atlas = match load_atlas_dir(dir) {
            Ok(atlas) => atlas,
            Err(e) => {
                warn!("Skipping sprite {}: {e}", dir.display());
                continue;
            }
        };
        debug!("Loaded sprite {} ({}x{}, {} icons)", dir.display(), atlas.width(), atlas.height(), atlas.icons.len());

        let tier = if high_dpi { &mut sources.high_dpi } else { &mut sources.regular };
        tier.push(SourceAtlas::new(key, atlas));
    }
    sources
}

/// Collect the downloaded atlases of one mix from `sprites_dir`.
///
/// Only `{mix_id}_{n}` and `{mix_id}_{n}_@2x` directories are considered,
/// ordered by `n`; the source key of each atlas is `n`.
pub fn collect_atlases(sprites_dir: &Path, mix_id: &str) -> Result<SourceAtlases> {
    let pattern = Path::new(&Pattern::escape(&sprites_dir.to_string_lossy()))
        .join(format!("{}_*", Pattern::escape(mix_id)))
        .to_string_lossy()
        .into_owned();

    let mut dirs: Vec<(u32, bool, PathBuf)> = glob(&pattern)?
        .filter_map(|entry| entry.ok())
        .filter(|path| path.is_dir())
        .filter_map(|path| {
            let (index, high_dpi) = source_index(path.file_name()?.to_str()?, mix_id)?;
            Some((index, high_dpi, path))
        })
        .collect();
    dirs.sort();

    let mut sources = SourceAtlases::default();
    for (index, high_dpi, dir) in dirs {
        let loaded = load_sources([&dir]);
        let tier = if high_dpi { &mut sources.high_dpi } else { &mut sources.regular };
        tier.extend(
            loaded
                .regular
                .into_iter()
                .chain(loaded.high_dpi)
                .map(|s| SourceAtlas::new(index.to_string(), s.atlas)),
        );
    }
    Ok(sources)
}

/// Parse `{mix_id}_{n}` or `{mix_id}_{n}_@2x` into `(n, high_dpi)`.
///
/// Sources of a mix named `{mix_id}_{n}` (`{mix_id}_{n}_{m}`) are not
/// sources of `mix_id`.
pub fn source_index(name: &str, mix_id: &str) -> Option<(u32, bool)> {
    let rest = name.strip_prefix(mix_id)?.strip_prefix('_')?;
    let (index, high_dpi) = match rest.strip_suffix(HIGH_DPI_SUFFIX) {
        Some(index) => (index, true),
        None => (rest, false),
    };
    if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((index.parse().ok()?, high_dpi))
}

/// Output file stem of a merged atlas.
pub fn output_stem(mix_id: &str, high_dpi: bool) -> String {
    if high_dpi { format!("{mix_id}_sprite@2x") } else { format!("{mix_id}_sprite") }
}

/// Write `{stem}.png` and `{stem}.json` into `dir`.
///
/// Encoding happens before anything touches the disk, so an
/// [`SpriteError::Image`] or [`SpriteError::Json`] leaves no partial output.
pub fn write_atlas(atlas: &SpriteAtlas, dir: &Path, stem: &str) -> Result<()> {
    let png = atlas.encode_png()?;
    let json = atlas.metadata_json()?;

    fs::create_dir_all(dir).map_err(|e| SpriteError::io(dir, e))?;
    let png_path = dir.join(format!("{stem}.png"));
    let json_path = dir.join(format!("{stem}.json"));
    fs::write(&png_path, png).map_err(|e| SpriteError::io(&png_path, e))?;
    fs::write(&json_path, json).map_err(|e| SpriteError::io(&json_path, e))?;
    debug!("Wrote {}", png_path.display());
    Ok(())
}
