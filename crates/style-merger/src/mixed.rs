//! The merged output document.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Style format version emitted for every mix.
pub const STYLE_VERSION: u8 = 8;

/// Glyph template served for every mix. The placeholders are filled in by the
/// serving layer.
pub const GLYPHS_TEMPLATE: &str = "/fonts/{fontstack}/{range}.pbf";

/// Languages every mix carries a locale table for.
pub const LOCALES: &[&str] = &["ru", "en-US"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixedStyle {
    pub version: u8,
    pub name: String,
    pub sprite: Option<String>,
    pub glyphs: Option<String>,
    pub metadata: MixedMetadata,
    pub sources: Map<String, Value>,
    pub layers: Vec<Value>,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MixedMetadata {
    pub filters: IndexMap<String, Vec<Value>>,
    pub locale: IndexMap<String, Map<String, Value>>,
    /// Style-wide singletons copied from the sources (`popup_template`, …).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MixedStyle {
    /// Empty base document for `mix_id`.
    pub fn new(mix_id: &str, name: Option<&str>) -> Self {
        let locale = LOCALES
            .iter()
            .map(|lang| ((*lang).to_owned(), Map::new()))
            .collect();
        Self {
            version: STYLE_VERSION,
            name: name
                .map(str::to_owned)
                .unwrap_or_else(|| format!("Mixed Style: {mix_id}")),
            sprite: None,
            glyphs: None,
            metadata: MixedMetadata { locale, ..Default::default() },
            sources: Map::new(),
            layers: Vec::new(),
            id: mix_id.to_owned(),
        }
    }

    /// URL the merged regular atlas is served under.
    pub fn sprite_url(mix_id: &str) -> String {
        format!("/sprite/{mix_id}_sprite")
    }

    /// Point `sprite` at the merged atlas, or clear it when the mix has none.
    pub fn attach_sprite(&mut self, has_regular_atlas: bool) {
        self.sprite = has_regular_atlas.then(|| Self::sprite_url(&self.id));
    }

    pub fn filter_count(&self) -> usize {
        self.metadata.filters.len()
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
