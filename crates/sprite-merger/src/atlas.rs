//! Sprite atlases: pixels plus icon metadata.

use std::{fmt, io::Cursor};

use image::{ImageBuffer, ImageFormat, RgbaImage};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::{IconIndex, Result};

/// Linear scale of a high-density atlas relative to the regular one.
pub const HIGH_DPI_SCALE: u32 = 2;

/// One icon atlas: an RGBA image and the icon rectangles inside it.
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteAtlas {
    pub image: RgbaImage,
    pub icons: IconIndex,
}

/// Content hash of an atlas. Equal fingerprints mean identical pixels and
/// identical metadata.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl SpriteAtlas {
    pub fn new(image: RgbaImage, icons: IconIndex) -> Self {
        Self { image, icons }
    }

    /// Decode a `sprite.png` / `sprite.json` pair.
    pub fn from_bytes(png: &[u8], json: &[u8]) -> Result<Self> {
        let image = image::load_from_memory_with_format(png, ImageFormat::Png)?.to_rgba8();
        let icons = serde_json::from_slice(json)?;
        Ok(Self { image, icons })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    pub fn encode_png(&self) -> Result<Vec<u8>> {
        let mut buffer = Cursor::new(Vec::new());
        self.image.write_to(&mut buffer, ImageFormat::Png)?;
        Ok(buffer.into_inner())
    }

    pub fn metadata_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.icons)?)
    }

    /// SHA-256 of the pixels combined with SHA-256 of the key-sorted metadata.
    pub fn fingerprint(&self) -> Result<Fingerprint> {
        let mut pixels = Sha256::new();
        pixels.update(self.width().to_be_bytes());
        pixels.update(self.height().to_be_bytes());
        pixels.update(self.image.as_raw());

        let metadata = Sha256::digest(canonical_json(&serde_json::to_value(&self.icons)?).to_string());

        let mut combined = Sha256::new();
        combined.update(pixels.finalize());
        combined.update(metadata);
        Ok(Fingerprint(hex::encode(combined.finalize())))
    }

    /// High-density counterpart: pixels replicated `factor`×`factor`, every
    /// icon rectangle and pixel ratio multiplied by `factor`.
    pub fn scaled(&self, factor: u32) -> Self {
        let image = ImageBuffer::from_fn(
            self.width().saturating_mul(factor),
            self.height().saturating_mul(factor),
            |x, y| *self.image.get_pixel(x / factor, y / factor),
        );
        let icons = self
            .icons
            .iter()
            .map(|(name, icon)| (name.clone(), icon.scaled(factor)))
            .collect();
        Self { image, icons }
    }
}

/// An atlas together with the key of the source it came from.
///
/// Keys tie a regular atlas to its high-density counterpart.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceAtlas {
    pub key: String,
    pub atlas: SpriteAtlas,
}

impl SourceAtlas {
    pub fn new(key: impl Into<String>, atlas: SpriteAtlas) -> Self {
        Self { key: key.into(), atlas }
    }
}

/// Recursively sort object keys so equal metadata hashes equally regardless of
/// key order.
fn canonical_json(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.clone(), canonical_json(v)))
                    .collect::<Map<_, _>>(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(canonical_json).collect()),
        other => other.clone(),
    }
}
