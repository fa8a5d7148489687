//! `layout["text-font"]` handling.
//!
//! The field shows up in two shapes:
//!
//! ```json
//! ["Roboto Regular", "Noto Sans Regular"]
//! {"base": 1, "stops": [[6, ["Roboto Regular"]], [7, "Roboto Bold"]]}
//! ```
//!
//! Both are parsed into [`TextFont`], rewritten font by font, and serialized
//! back in the shape they came in. Anything else (expressions, bare strings)
//! is left alone.

use indexmap::IndexSet;
use serde_json::{Map, Value};

use crate::Prefix;

/// Font value of a single zoom stop.
#[derive(Debug, Clone, PartialEq)]
pub enum StopFont {
    Single(String),
    List(Vec<String>),
}

impl StopFont {
    fn parse(value: &Value) -> Option<Self> {
        match value {
            Value::String(font) => Some(Self::Single(font.clone())),
            Value::Array(_) => string_list(value).map(Self::List),
            _ => None,
        }
    }

    fn fonts(&self) -> &[String] {
        match self {
            Self::Single(font) => std::slice::from_ref(font),
            Self::List(fonts) => fonts,
        }
    }

    fn map(self, f: &impl Fn(&str) -> String) -> Self {
        match self {
            Self::Single(font) => Self::Single(f(&font)),
            Self::List(fonts) => Self::List(fonts.iter().map(|font| f(font)).collect()),
        }
    }

    fn to_value(&self) -> Value {
        match self {
            Self::Single(font) => Value::String(font.clone()),
            Self::List(fonts) => fonts.iter().cloned().map(Value::String).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TextFont {
    /// Plain list of font names.
    Flat(Vec<String>),
    /// Zoom-function form. `object` is the original object, kept for its other
    /// keys (`base`, …) and their order.
    Stops {
        stops: Vec<(Value, StopFont)>,
        object: Map<String, Value>,
    },
}

impl TextFont {
    pub fn parse(value: &Value) -> Option<Self> {
        match value {
            Value::Array(_) => string_list(value).map(Self::Flat),
            Value::Object(object) => {
                let raw_stops = object.get("stops")?.as_array()?;
                let stops = raw_stops
                    .iter()
                    .map(|stop| match stop.as_array()?.as_slice() {
                        [zoom, font] => Some((zoom.clone(), StopFont::parse(font)?)),
                        _ => None,
                    })
                    .collect::<Option<Vec<_>>>()?;
                Some(Self::Stops { stops, object: object.clone() })
            }
            _ => None,
        }
    }

    /// All font names in document order, duplicates included.
    pub fn fonts(&self) -> Vec<&str> {
        match self {
            Self::Flat(fonts) => fonts.iter().map(String::as_str).collect(),
            Self::Stops { stops, .. } => stops
                .iter()
                .flat_map(|(_, font)| font.fonts())
                .map(String::as_str)
                .collect(),
        }
    }

    pub fn map_fonts(self, f: impl Fn(&str) -> String) -> Self {
        match self {
            Self::Flat(fonts) => Self::Flat(fonts.iter().map(|font| f(font)).collect()),
            Self::Stops { stops, object } => Self::Stops {
                stops: stops.into_iter().map(|(zoom, font)| (zoom, font.map(&f))).collect(),
                object,
            },
        }
    }

    pub fn prefixed(self, prefix: &Prefix) -> Self {
        self.map_fonts(|font| prefix.font(font))
    }

    pub fn to_value(&self) -> Value {
        match self {
            Self::Flat(fonts) => fonts.iter().cloned().map(Value::String).collect(),
            Self::Stops { stops, object } => {
                let mut object = object.clone();
                object.insert(
                    "stops".to_owned(),
                    stops
                        .iter()
                        .map(|(zoom, font)| Value::Array(vec![zoom.clone(), font.to_value()]))
                        .collect(),
                );
                Value::Object(object)
            }
        }
    }
}

/// The `layout["text-font"]` value of a layer, if it has one.
pub fn layer_text_font(layer: &Value) -> Option<&Value> {
    layer.get("layout")?.get("text-font")
}

/// Unique font names referenced by `layers`, in first-seen order.
pub fn font_references(layers: &[Value]) -> Vec<String> {
    let mut fonts = IndexSet::new();
    for text_font in layers.iter().filter_map(layer_text_font).filter_map(TextFont::parse) {
        fonts.extend(text_font.fonts().into_iter().map(str::to_owned));
    }
    fonts.into_iter().collect()
}

fn string_list(value: &Value) -> Option<Vec<String>> {
    value
        .as_array()?
        .iter()
        .map(|item| item.as_str().map(str::to_owned))
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn prefix(token: &str) -> Prefix {
        Prefix::new(token).unwrap()
    }

    #[test]
    fn test_flat_list() {
        let font = TextFont::parse(&json!(["Roboto Regular", "Arial Unicode MS Regular"])).unwrap();
        assert_eq!(font.fonts(), ["Roboto Regular", "Arial Unicode MS Regular"]);

        let prefixed = font.prefixed(&prefix("test_prefix")).to_value();
        assert_eq!(
            prefixed,
            json!(["test_prefix/Roboto Regular", "test_prefix/Arial Unicode MS Regular"])
        );
    }

    #[test]
    fn test_stops_with_lists() {
        let value = json!({ "stops": [[6, ["Roboto Regular"]], [7, ["Roboto Bold"]]] });
        let font = TextFont::parse(&value).unwrap();
        assert_eq!(font.fonts(), ["Roboto Regular", "Roboto Bold"]);

        let prefixed = font.prefixed(&prefix("test_prefix")).to_value();
        assert_eq!(
            prefixed,
            json!({ "stops": [[6, ["test_prefix/Roboto Regular"]], [7, ["test_prefix/Roboto Bold"]]] })
        );
    }

    #[test]
    fn test_stops_keep_shape_and_extra_keys() {
        let value = json!({ "base": 1.2, "stops": [[6, "Roboto Regular"], [7.5, ["Roboto Bold"]]] });
        let prefixed = TextFont::parse(&value).unwrap().prefixed(&prefix("p")).to_value();
        assert_eq!(
            prefixed,
            json!({ "base": 1.2, "stops": [[6, "p/Roboto Regular"], [7.5, ["p/Roboto Bold"]]] })
        );
    }

    #[test]
    fn test_unrecognized_shapes() {
        assert_eq!(TextFont::parse(&json!("invalid")), None);
        assert_eq!(TextFont::parse(&json!(["literal", ["Roboto"]])), None);
        assert_eq!(TextFont::parse(&json!({ "stops": "invalid" })), None);
        assert_eq!(TextFont::parse(&json!({ "stops": [[6]] })), None);
        assert_eq!(TextFont::parse(&json!(null)), None);
    }

    #[test]
    fn test_font_references_dedup_across_layers() {
        let layers = vec![
            json!({ "id": "a", "layout": { "text-font": ["Roboto Regular"] } }),
            json!({ "id": "b", "layout": { "text-font": { "stops": [[6, ["Roboto Regular"]], [7, "Roboto Bold"]] } } }),
            json!({ "id": "c", "layout": { "text-size": 12 } }),
            json!({ "id": "d" }),
        ];
        assert_eq!(font_references(&layers), ["Roboto Regular", "Roboto Bold"]);
    }
}
