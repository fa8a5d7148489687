//! Parsed source style documents.

use serde_json::{Map, Value};

use crate::{Error, Result};

/// One upstream style document contributing to a mix.
///
/// The document is kept as raw JSON; only the fields the merge touches have
/// accessors, everything else passes through untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceStyle {
    doc: Map<String, Value>,
}

impl SourceStyle {
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(doc) => Ok(Self { doc }),
            other => Err(Error::NotAnObject(json_kind(&other))),
        }
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Self::from_value(serde_json::from_slice(bytes)?)
    }

    /// Style id as text. Numeric ids use their JSON representation.
    pub fn id(&self) -> Option<String> {
        self.doc.get("id").and_then(scalar_text)
    }

    pub fn name(&self) -> Option<&str> {
        self.doc.get("name").and_then(Value::as_str)
    }

    pub fn sources(&self) -> Option<&Map<String, Value>> {
        self.doc.get("sources").and_then(Value::as_object)
    }

    pub fn layers(&self) -> &[Value] {
        self.doc
            .get("layers")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn metadata(&self) -> Option<&Map<String, Value>> {
        self.doc.get("metadata").and_then(Value::as_object)
    }

    /// Glyph URL template (`.../{fontstack}/{range}.pbf`), if any.
    pub fn glyphs_url(&self) -> Option<&str> {
        self.doc.get("glyphs").and_then(Value::as_str).filter(|s| !s.is_empty())
    }

    /// Sprite base URL.
    ///
    /// Reads `sprite` first, then the first entry of a `sprites` array (either a
    /// plain URL or an `{id, url}` object). Only absolute http(s) URLs count.
    pub fn sprite_url(&self) -> Option<&str> {
        let candidate = match self.doc.get("sprite") {
            Some(Value::String(url)) if !url.is_empty() => Some(url.as_str()),
            _ => self
                .doc
                .get("sprites")
                .and_then(Value::as_array)
                .and_then(|sprites| sprites.first())
                .and_then(|first| match first {
                    Value::String(url) => Some(url.as_str()),
                    Value::Object(entry) => entry.get("url").and_then(Value::as_str),
                    _ => None,
                }),
        };
        candidate.filter(|url| is_http_url(url))
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.doc
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.doc)
    }
}

/// `true` for `http://host...` and `https://host...`.
pub fn is_http_url(url: &str) -> bool {
    ["https://", "http://"]
        .iter()
        .find_map(|scheme| url.strip_prefix(scheme))
        .is_some_and(|rest| !rest.is_empty() && !rest.starts_with('/'))
}

/// Text of a string or number value. Objects, arrays, booleans and null have none.
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
