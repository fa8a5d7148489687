//! Glyph range download for one font stack.

use std::{fs::create_dir_all, path::Path};

use log::{debug, info};

use crate::{
    Fetch, MixError, Result,
    io::write_file,
    parallel::{BatchResult, bounded_pool, process_parallel_iter},
};

/// Codepoints per glyph range file.
pub const GLYPH_RANGE_SIZE: u32 = 256;

/// Highest codepoint covered.
pub const MAX_CODEPOINT: u32 = 65535;

/// `(low, high)` of every range file: `0-255`, `256-511`, … `65280-65535`.
pub fn glyph_ranges() -> impl Iterator<Item = (u32, u32)> {
    (0..=MAX_CODEPOINT)
        .step_by(GLYPH_RANGE_SIZE as usize)
        .map(|low| (low, low + GLYPH_RANGE_SIZE - 1))
}

/// Whether `fontstack` can name a single directory under `fonts/{prefix}/`.
pub fn is_valid_fontstack(fontstack: &str) -> bool {
    !fontstack.is_empty() && fontstack != "." && fontstack != ".." && !fontstack.contains(['/', '\\', '\0'])
}

/// Font stack name as it appears in a glyph URL.
pub fn encode_fontstack(fontstack: &str) -> String {
    fontstack.replace(' ', "%20")
}

/// Fill `{fontstack}` and `{range}` in a glyph template. `.pbf` is appended
/// when the template does not end with it.
pub fn glyph_url(template: &str, fontstack: &str, range: (u32, u32)) -> String {
    let mut url = template
        .replacen("{fontstack}", &encode_fontstack(fontstack), 1)
        .replacen("{range}", &format!("{}-{}", range.0, range.1), 1);
    if !url.ends_with(".pbf") {
        url.push_str(".pbf");
    }
    url
}

/// One font stack to fetch for one source style.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FontJob {
    pub prefix: String,
    pub fontstack: String,
    /// The source style's own `glyphs` template.
    pub template: Option<String>,
}

/// Downloads every range of one font stack, each range independently.
pub struct GlyphDownloader<'a, F: Fetch> {
    fetcher: &'a F,
    fallback_template: &'a str,
    concurrency: usize,
}

impl<'a, F: Fetch> GlyphDownloader<'a, F> {
    pub fn new(fetcher: &'a F, fallback_template: &'a str, concurrency: usize) -> Self {
        Self { fetcher, fallback_template, concurrency }
    }

    /// Fetch all ranges into `font_dir` as `{low}-{high}.pbf`. A directory that
    /// already exists is taken as complete and skipped.
    pub fn download(&self, job: &FontJob, font_dir: &Path) -> Result<Option<BatchResult>> {
        if font_dir.exists() {
            debug!("Font stack already present: {}", font_dir.display());
            return Ok(None);
        }
        info!("Downloading fonts for: {} (style: {})", job.fontstack, job.prefix);
        create_dir_all(font_dir).map_err(|e| MixError::fs(font_dir, e))?;

        let pool = bounded_pool(self.concurrency)?;
        let label = format!("{}/{}", job.prefix, job.fontstack);
        let result = process_parallel_iter(&pool, &label, glyph_ranges(), |range| {
            let bytes = self.fetch_range(job, range)?;
            write_file(&font_dir.join(format!("{}-{}.pbf", range.0, range.1)), bytes)
        });
        Ok(Some(result))
    }

    /// Own template first, then the shared fallback.
    fn fetch_range(&self, job: &FontJob, range: (u32, u32)) -> Result<Vec<u8>> {
        if let Some(own) = job.template.as_deref() {
            match self.fetcher.fetch(&glyph_url(own, &job.fontstack, range), None) {
                Ok(bytes) => return Ok(bytes),
                Err(e) => debug!("{e}, trying fallback"),
            }
        }
        Ok(self
            .fetcher
            .fetch(&glyph_url(self.fallback_template, &job.fontstack, range), None)?)
    }
}
