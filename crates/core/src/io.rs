//! Working-directory layout and file helpers.

use std::{
    fs::{create_dir_all, read, remove_dir_all, remove_file, write},
    path::{Path, PathBuf},
};

use glob::{Pattern, glob};
use log::debug;
use sprite_merger::{HIGH_DPI_SUFFIX, output_stem, source_index};

use crate::{MixError, Result};

/// Paths of every artifact the pipeline reads or writes, rooted at one
/// directory.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn raw_styles_dir(&self) -> PathBuf {
        self.root.join("raw_styles")
    }

    pub fn sprites_dir(&self) -> PathBuf {
        self.root.join("sprites")
    }

    pub fn fonts_dir(&self) -> PathBuf {
        self.root.join("fonts")
    }

    pub fn sprite_out_dir(&self) -> PathBuf {
        self.root.join("sprite")
    }

    pub fn mixed_dir(&self) -> PathBuf {
        self.root.join("mixed_styles")
    }

    /// `raw_styles/{mix_id}_{n}.json`, `n` starting at 1.
    pub fn raw_style_path(&self, mix_id: &str, n: usize) -> PathBuf {
        self.raw_styles_dir().join(format!("{mix_id}_{n}.json"))
    }

    /// `sprites/{mix_id}_{n}` or `sprites/{mix_id}_{n}_@2x`.
    pub fn source_sprite_dir(&self, mix_id: &str, n: usize, high_dpi: bool) -> PathBuf {
        let suffix = if high_dpi { HIGH_DPI_SUFFIX } else { "" };
        self.sprites_dir().join(format!("{mix_id}_{n}{suffix}"))
    }

    /// `fonts/{prefix}/{fontstack}`.
    pub fn font_dir(&self, prefix: &str, fontstack: &str) -> PathBuf {
        self.fonts_dir().join(prefix).join(fontstack)
    }

    pub fn mixed_style_path(&self, mix_id: &str) -> PathBuf {
        self.mixed_dir().join(format!("{mix_id}.json"))
    }

    /// Wipe and recreate the download directories.
    pub fn reset_downloads(&self) -> Result<()> {
        reset_dirs(&[self.raw_styles_dir(), self.fonts_dir(), self.sprites_dir()])
    }

    /// Wipe and recreate the output directories.
    pub fn reset_outputs(&self) -> Result<()> {
        reset_dirs(&[self.mixed_dir(), self.sprite_out_dir()])
    }

    /// Create the download directories and remove whatever an earlier run
    /// downloaded for `mix_id`, leaving other mixes alone.
    pub fn reset_mix_downloads(&self, mix_id: &str) -> Result<()> {
        ensure_dirs(&[self.raw_styles_dir(), self.fonts_dir(), self.sprites_dir()])?;
        for dir in [self.raw_styles_dir(), self.sprites_dir()] {
            for path in mix_entries(&dir, mix_id) {
                let removed = if path.is_dir() { remove_dir_all(&path) } else { remove_file(&path) };
                removed.map_err(|e| MixError::fs(&path, e))?;
                debug!("Removed stale {}", path.display());
            }
        }
        Ok(())
    }

    pub fn ensure_outputs(&self) -> Result<()> {
        ensure_dirs(&[self.mixed_dir(), self.sprite_out_dir()])
    }

    /// Create the output directories and remove the mixed style and merged
    /// sprites an earlier run wrote for `mix_id`.
    pub fn reset_mix_outputs(&self, mix_id: &str) -> Result<()> {
        self.ensure_outputs()?;
        let sprite_dir = self.sprite_out_dir();
        let sprites = [false, true]
            .into_iter()
            .flat_map(|high_dpi| {
                let stem = output_stem(mix_id, high_dpi);
                ["png", "json"].map(|ext| sprite_dir.join(format!("{stem}.{ext}")))
            });
        for path in std::iter::once(self.mixed_style_path(mix_id)).chain(sprites) {
            if path.is_file() {
                remove_file(&path).map_err(|e| MixError::fs(&path, e))?;
                debug!("Removed stale {}", path.display());
            }
        }
        Ok(())
    }
}

fn reset_dirs(dirs: &[PathBuf]) -> Result<()> {
    for dir in dirs {
        if dir.exists() {
            remove_dir_all(dir).map_err(|e| MixError::fs(dir, e))?;
        }
    }
    ensure_dirs(dirs)
}

fn ensure_dirs(dirs: &[PathBuf]) -> Result<()> {
    for dir in dirs {
        create_dir_all(dir).map_err(|e| MixError::fs(dir, e))?;
    }
    Ok(())
}

/// Downloads of `mix_id` in `dir`: `{mix_id}_{n}.json` files and
/// `{mix_id}_{n}[_@2x]` directories.
fn mix_entries(dir: &Path, mix_id: &str) -> Vec<PathBuf> {
    let pattern = Path::new(&Pattern::escape(&dir.to_string_lossy()))
        .join(format!("{}_*", Pattern::escape(mix_id)))
        .to_string_lossy()
        .into_owned();
    // both parts are escaped, so the pattern always compiles
    glob(&pattern)
        .into_iter()
        .flatten()
        .filter_map(|entry| entry.ok())
        .filter(|path| is_mix_entry(path, mix_id))
        .collect()
}

fn is_mix_entry(path: &Path, mix_id: &str) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    if path.is_dir() {
        source_index(name, mix_id).is_some()
    } else {
        name.strip_suffix(".json")
            .and_then(|stem| source_index(stem, mix_id))
            .is_some_and(|(_, high_dpi)| !high_dpi)
    }
}

pub fn read_file(path: &Path) -> Result<Vec<u8>> {
    read(path).map_err(|e| MixError::fs(path, e))
}

/// Write `data`, creating the parent directory first.
pub fn write_file(path: &Path, data: impl AsRef<[u8]>) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        create_dir_all(parent).map_err(|e| MixError::fs(parent, e))?;
    }
    write(path, data).map_err(|e| MixError::fs(path, e))
}
