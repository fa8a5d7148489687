//! Options for style merging

use crate::mixed::{GLYPHS_TEMPLATE, LOCALES};

/// Metadata fields copied verbatim from the sources, last source wins.
pub const PASSTHROUGH_METADATA: &[&str] = &[
    "feature_inspector",
    "feature_geometry",
    "find_in_point",
    "popup_template",
    "hover_template",
    "maputnik:renderer",
];

/// Options for style merging
#[derive(Debug, Clone)]
pub struct Options {
    /// Languages whose locale tables are merged
    pub locales: Vec<String>,

    /// Metadata fields treated as style-wide singletons
    pub passthrough_metadata: Vec<String>,

    /// Value of `glyphs` in the merged style
    pub glyphs_template: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            locales: LOCALES.iter().map(|s| (*s).to_owned()).collect(),
            passthrough_metadata: PASSTHROUGH_METADATA.iter().map(|s| (*s).to_owned()).collect(),
            glyphs_template: GLYPHS_TEMPLATE.to_owned(),
        }
    }
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn glyphs_template(mut self, template: impl Into<String>) -> Self {
        self.glyphs_template = template.into();
        self
    }

    /// Add a metadata field to the pass-through allow-list
    pub fn passthrough(mut self, field: impl Into<String>) -> Self {
        let field = field.into();
        if !self.passthrough_metadata.contains(&field) {
            self.passthrough_metadata.push(field);
        }
        self
    }
}
