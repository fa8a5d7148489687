//! Namespace tokens for source styles.
//!
//! Every id a source contributes to a mix is prefixed with a token that is
//! unique within that mix. Tokens are derived, in priority order, from:
//! - the prefix configured for the source
//! - the style `id`
//! - the style `name` (lower-cased, whitespace runs replaced by `_`)
//! - the positional fallback `style_{n}`
//!
//! Collisions are resolved by probing `{base}_1`, `{base}_2`, … in source order.

use std::{collections::HashSet, fmt};

use crate::SourceStyle;

/// A sanitized namespace token: `[A-Za-z0-9_]`, never two `_` in a row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Prefix(String);

impl Prefix {
    /// Sanitize `raw` into a prefix. Returns `None` when nothing usable remains.
    pub fn new(raw: &str) -> Option<Self> {
        let token = sanitize(raw);
        (!token.is_empty()).then_some(Self(token))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `"{prefix}_{id}"`
    pub fn namespaced(&self, id: &str) -> String {
        format!("{}_{id}", self.0)
    }

    /// `"{prefix}/{font}"`
    pub fn font(&self, font: &str) -> String {
        format!("{}/{font}", self.0)
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Prefix {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Prefix {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Prefix {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Replace anything outside `[A-Za-z0-9_]` with `_` and squeeze `_` runs.
pub fn sanitize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        let c = if c.is_ascii_alphanumeric() { c } else { '_' };
        if c == '_' && out.ends_with('_') {
            continue;
        }
        out.push(c);
    }
    out
}

/// Hands out unique prefixes for one mix.
#[derive(Debug, Default)]
pub struct PrefixAssigner {
    used: HashSet<Prefix>,
    assigned: usize,
}

impl PrefixAssigner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign the prefix for the next source in mix order.
    pub fn assign(&mut self, style: &SourceStyle, explicit: Option<&str>) -> Prefix {
        self.assigned += 1;
        let base = base_prefix(style, explicit, self.assigned);
        let prefix = self.resolve_conflict(base);
        self.used.insert(prefix.clone());
        prefix
    }

    fn resolve_conflict(&self, base: Prefix) -> Prefix {
        if !self.used.contains(&base) {
            return base;
        }
        (1..)
            .map(|i| Prefix(format!("{base}_{i}")))
            .find(|candidate| !self.used.contains(candidate))
            .unwrap_or(base)
    }
}

fn base_prefix(style: &SourceStyle, explicit: Option<&str>, position: usize) -> Prefix {
    explicit
        .and_then(Prefix::new)
        .or_else(|| style.id().as_deref().and_then(Prefix::new))
        .or_else(|| style.name().and_then(|name| Prefix::new(&name_token(name))))
        .unwrap_or_else(|| Prefix(format!("style_{position}")))
}

fn name_token(name: &str) -> String {
    name.to_lowercase().split_whitespace().collect::<Vec<_>>().join("_")
}

/// Assign prefixes for an ordered list of `(style, configured prefix)` pairs.
pub fn assign_prefixes<'a, I>(entries: I) -> Vec<Prefix>
where
    I: IntoIterator<Item = (&'a SourceStyle, Option<&'a str>)>,
{
    let mut assigner = PrefixAssigner::new();
    entries
        .into_iter()
        .map(|(style, explicit)| assigner.assign(style, explicit))
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn style(doc: serde_json::Value) -> SourceStyle {
        SourceStyle::from_value(doc).unwrap()
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("weather-map v2"), "weather_map_v2");
        assert_eq!(sanitize("a__b...c"), "a_b_c");
        assert_eq!(sanitize("plain_id"), "plain_id");
        assert_eq!(sanitize("кириллица"), "_");
    }

    #[test]
    fn test_priority_order() {
        let styles = [
            style(json!({ "id": "ignored", "name": "Ignored" })),
            style(json!({ "id": "weather", "name": "Weather" })),
            style(json!({ "name": "Location Layers" })),
            style(json!({})),
        ];
        let explicit = [Some("custom"), None, None, None];

        let prefixes = assign_prefixes(styles.iter().zip(explicit));

        assert_eq!(prefixes, ["custom", "weather", "location_layers", "style_4"]);
    }

    #[test]
    fn test_conflicts_get_numeric_suffixes() {
        let styles = [
            style(json!({ "id": "town" })),
            style(json!({ "id": "town" })),
            style(json!({ "id": "town" })),
        ];

        let prefixes = assign_prefixes(styles.iter().map(|s| (s, None)));

        assert_eq!(prefixes, ["town", "town_1", "town_2"]);
    }

    #[test]
    fn test_suffix_skips_taken_tokens() {
        let styles = [
            style(json!({ "id": "town_1" })),
            style(json!({ "id": "town" })),
            style(json!({ "id": "town" })),
        ];

        let prefixes = assign_prefixes(styles.iter().map(|s| (s, None)));

        assert_eq!(prefixes, ["town_1", "town", "town_2"]);
    }

    #[test]
    fn test_explicit_prefix_is_sanitized() {
        let s = style(json!({ "id": "x" }));
        let prefixes = assign_prefixes([(&s, Some("my prefix!"))]);
        assert_eq!(prefixes, ["my_prefix_"]);
    }

    #[test]
    fn test_empty_candidates_fall_through() {
        let s = style(json!({ "id": "", "name": "   " }));
        let prefixes = assign_prefixes([(&s, Some(""))]);
        assert_eq!(prefixes, ["style_1"]);
    }

    #[test]
    fn test_deterministic() {
        let styles = [
            style(json!({ "id": "a" })),
            style(json!({ "id": "a" })),
            style(json!({ "name": "A" })),
        ];
        let first = assign_prefixes(styles.iter().map(|s| (s, None)));
        let second = assign_prefixes(styles.iter().map(|s| (s, None)));
        assert_eq!(first, second);
        assert_eq!(first, ["a", "a_1", "a_2"]);
    }
}
