//! Per-icon sprite metadata.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Icon name → rectangle, in file order.
pub type IconIndex = IndexMap<String, Icon>;

/// Pixel rectangle of one icon inside an atlas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Icon {
    pub width: u32,
    pub height: u32,
    #[serde(rename = "pixelRatio", default, skip_serializing_if = "Option::is_none")]
    pub pixel_ratio: Option<f64>,
    pub x: u32,
    pub y: u32,
    /// Keys other than the five above (`sdf`, `stretchX`, …).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Icon {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { width, height, pixel_ratio: Some(1.0), x, y, extra: Map::new() }
    }

    /// Position inside a stacked atlas whose source starts `y_offset` rows down.
    ///
    /// Only the five core fields are carried over.
    pub fn rebased(&self, y_offset: u32) -> Self {
        Self {
            width: self.width,
            height: self.height,
            pixel_ratio: self.pixel_ratio,
            x: self.x,
            y: self.y.saturating_add(y_offset),
            extra: Map::new(),
        }
    }

    /// Rectangle of the same icon in an atlas scaled up by `factor`.
    pub fn scaled(&self, factor: u32) -> Self {
        Self {
            width: self.width.saturating_mul(factor),
            height: self.height.saturating_mul(factor),
            pixel_ratio: Some(self.pixel_ratio.unwrap_or(1.0) * f64::from(factor)),
            x: self.x.saturating_mul(factor),
            y: self.y.saturating_mul(factor),
            extra: self.extra.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_parse_keeps_extra_keys() {
        let icon: Icon = serde_json::from_value(json!({
            "width": 24, "height": 24, "x": 0, "y": 8, "pixelRatio": 1, "sdf": true
        }))
        .unwrap();
        assert_eq!(icon.y, 8);
        assert_eq!(icon.pixel_ratio, Some(1.0));
        assert_eq!(icon.extra["sdf"], json!(true));
    }

    #[test]
    fn test_rebased() {
        let mut icon = Icon::new(4, 2, 16, 16);
        icon.extra.insert("sdf".to_owned(), json!(true));
        let moved = icon.rebased(24);
        assert_eq!((moved.x, moved.y, moved.width, moved.height), (4, 26, 16, 16));
        assert_eq!(moved.pixel_ratio, Some(1.0));
        assert!(moved.extra.is_empty());
    }

    #[test]
    fn test_scaled_defaults_pixel_ratio() {
        let icon: Icon = serde_json::from_value(json!({ "width": 24, "height": 12, "x": 3, "y": 5 })).unwrap();
        let scaled = icon.scaled(2);
        assert_eq!((scaled.x, scaled.y, scaled.width, scaled.height), (6, 10, 48, 24));
        assert_eq!(scaled.pixel_ratio, Some(2.0));
    }

    #[test]
    fn test_missing_pixel_ratio_is_not_serialized() {
        let icon: Icon = serde_json::from_value(json!({ "width": 1, "height": 1, "x": 0, "y": 0 })).unwrap();
        assert_eq!(
            serde_json::to_value(icon.rebased(0)).unwrap(),
            json!({ "width": 1, "height": 1, "x": 0, "y": 0 })
        );
    }
}
