//! Main StyleMerger implementation

use log::{debug, info, warn};
use serde_json::{Map, Value};

use crate::{
    MixedStyle, Options, Prefix, SourceStyle,
    prefix::assign_prefixes,
    source::scalar_text,
    text_font::TextFont,
};

/// A source style paired with its namespace token.
#[derive(Debug, Clone, Copy)]
pub struct PrefixedStyle<'a> {
    pub style: &'a SourceStyle,
    pub prefix: &'a Prefix,
}

/// Deep-merges source styles into one collision-free style
#[derive(Debug, Default)]
pub struct StyleMerger {
    options: Options,
}

impl StyleMerger {
    pub fn new(options: Options) -> Self {
        Self { options }
    }

    /// Merge `styles` in order into a new mix.
    ///
    /// `sprite` is left unset; call [`MixedStyle::attach_sprite`] once the
    /// atlases are merged. With no styles the empty base document is returned.
    pub fn merge(&self, mix_id: &str, name: Option<&str>, styles: &[PrefixedStyle<'_>]) -> MixedStyle {
        let mut mixed = MixedStyle::new(mix_id, name);
        if styles.is_empty() {
            warn!("No source styles for {mix_id}");
            return mixed;
        }

        for lang in &self.options.locales {
            mixed.metadata.locale.entry(lang.clone()).or_default();
        }

        for entry in styles {
            debug!("Merging source style with prefix {}", entry.prefix);
            merge_sources(&mut mixed, entry);
            self.merge_metadata(&mut mixed, entry);
            merge_layers(&mut mixed, entry);
        }

        mixed.glyphs = Some(self.options.glyphs_template.clone());

        info!(
            "Merged {mix_id}: {} sources, {} layers, {} filters",
            mixed.sources.len(),
            mixed.layers.len(),
            mixed.filter_count()
        );
        mixed
    }

    /// Assign prefixes and merge in one step.
    ///
    /// Each entry carries the prefix configured for that source, if any.
    pub fn merge_with_prefixes(
        &self,
        mix_id: &str,
        name: Option<&str>,
        styles: &[(SourceStyle, Option<String>)],
    ) -> (MixedStyle, Vec<Prefix>) {
        let prefixes = assign_prefixes(styles.iter().map(|(style, explicit)| (style, explicit.as_deref())));
        let entries: Vec<_> = styles
            .iter()
            .zip(&prefixes)
            .map(|((style, _), prefix)| PrefixedStyle { style, prefix })
            .collect();
        (self.merge(mix_id, name, &entries), prefixes)
    }

    fn merge_metadata(&self, mixed: &mut MixedStyle, entry: &PrefixedStyle<'_>) {
        let metadata = entry.style.metadata();
        match metadata.and_then(|m| m.get("filters")).and_then(Value::as_object) {
            Some(filters) => merge_filters(mixed, filters, entry.prefix),
            None => create_style_filter(mixed, entry.prefix),
        }

        let Some(metadata) = metadata else {
            return;
        };
        self.merge_locale(mixed, metadata, entry.prefix);
        self.merge_passthrough(mixed, metadata);
    }

    fn merge_locale(&self, mixed: &mut MixedStyle, metadata: &Map<String, Value>, prefix: &Prefix) {
        let Some(locale) = metadata.get("locale").and_then(Value::as_object) else {
            return;
        };
        for lang in &self.options.locales {
            let Some(entries) = locale.get(lang).and_then(Value::as_object) else {
                continue;
            };
            let target = mixed.metadata.locale.entry(lang.clone()).or_default();
            for (key, value) in entries {
                target.insert(prefix.namespaced(key), value.clone());
            }
        }
    }

    fn merge_passthrough(&self, mixed: &mut MixedStyle, metadata: &Map<String, Value>) {
        for field in &self.options.passthrough_metadata {
            if let Some(value) = metadata.get(field).filter(|v| is_truthy(v)) {
                mixed.metadata.extra.insert(field.clone(), value.clone());
            }
        }
    }
}

fn merge_sources(mixed: &mut MixedStyle, entry: &PrefixedStyle<'_>) {
    let Some(sources) = entry.style.sources() else {
        return;
    };
    for (name, config) in sources {
        mixed.sources.insert(entry.prefix.namespaced(name), config.clone());
    }
}

fn merge_layers(mixed: &mut MixedStyle, entry: &PrefixedStyle<'_>) {
    let prefix = entry.prefix;
    for (index, layer) in entry.style.layers().iter().enumerate() {
        let Some(layer) = layer.as_object() else {
            warn!("Skipping layer {index} of {prefix}: not an object");
            continue;
        };
        let mut new_layer = layer.clone();

        let id = layer
            .get("id")
            .and_then(scalar_text)
            .unwrap_or_else(|| format!("layer_{index}"));
        new_layer.insert("id".to_owned(), Value::String(prefix.namespaced(&id)));

        if let Some(source) = layer.get("source").and_then(scalar_text) {
            new_layer.insert("source".to_owned(), Value::String(prefix.namespaced(&source)));
        }

        if let Some(Value::Object(layout)) = new_layer.get_mut("layout")
            && let Some(text_font) = layout.get("text-font").and_then(TextFont::parse)
        {
            layout.insert("text-font".to_owned(), text_font.prefixed(prefix).to_value());
        }

        let filter_id = match layer
            .get("metadata")
            .and_then(|m| m.get("filter_id"))
            .and_then(scalar_text)
        {
            Some(existing) if existing == prefix.as_str() => existing,
            Some(existing) => prefix.namespaced(&existing),
            None => prefix.to_string(),
        };
        let metadata = new_layer
            .entry("metadata")
            .or_insert_with(|| Value::Object(Map::new()));
        if !metadata.is_object() {
            *metadata = Value::Object(Map::new());
        }
        if let Value::Object(metadata) = metadata {
            metadata.insert("filter_id".to_owned(), Value::String(filter_id));
        }

        mixed.layers.push(Value::Object(new_layer));
    }
}

fn merge_filters(mixed: &mut MixedStyle, filters: &Map<String, Value>, prefix: &Prefix) {
    for (group, list) in filters {
        let Some(list) = list.as_array() else {
            warn!("Skipping filter group {group} of {prefix}: not a list");
            continue;
        };
        let prefixed = list
            .iter()
            .map(|filter| match filter {
                Value::Object(filter) => {
                    let mut new_filter = filter.clone();
                    for key in ["id", "group_id"] {
                        if let Some(value) = filter.get(key).filter(|v| is_truthy(v)).and_then(scalar_text) {
                            new_filter.insert(key.to_owned(), Value::String(prefix.namespaced(&value)));
                        }
                    }
                    Value::Object(new_filter)
                }
                other => other.clone(),
            })
            .collect();
        mixed.metadata.filters.insert(prefix.namespaced(group), prefixed);
    }
}

/// Default filter group for a source that ships none.
fn create_style_filter(mixed: &mut MixedStyle, prefix: &Prefix) {
    let name = humanize(prefix.as_str());

    let mut filter = Map::new();
    filter.insert("id".to_owned(), Value::String(prefix.to_string()));
    filter.insert("name".to_owned(), Value::String(name.clone()));
    mixed
        .metadata
        .filters
        .insert(prefix.to_string(), vec![Value::Object(filter)]);

    mixed
        .metadata
        .locale
        .entry("en-US".to_owned())
        .or_default()
        .insert(prefix.to_string(), Value::String(name));
}

/// `"weather_radar"` → `"Weather Radar"`, `"cityLabels"` → `"City Labels"`.
pub fn humanize(token: &str) -> String {
    let mut spaced = String::with_capacity(token.len() + 4);
    let mut prev: Option<char> = None;
    for c in token.chars() {
        if let Some(p) = prev
            && (p.is_ascii_lowercase() || p.is_ascii_digit())
            && c.is_ascii_uppercase()
        {
            spaced.push(' ');
        }
        spaced.push(if c == '_' || c == '-' { ' ' } else { c });
        prev = Some(c);
    }
    spaced.split_whitespace().map(capitalize).collect::<Vec<_>>().join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

fn is_truthy(value: &Value) -> bool {
    !matches!(value, Value::Null | Value::Bool(false))
}
