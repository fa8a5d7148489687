//! # Style Merger
//!
//! Combine several map style documents into one collision-free style.
//!
//! Each source style gets a namespace token ([`Prefix`]); every layer id,
//! source key, filter id and locale key it contributes is rewritten under that
//! token so that sources with identical ids can live side by side.
//!
//! ## Example
//!
//! ```
//! use serde_json::json;
//! use style_merger::{SourceStyle, StyleMerger};
//!
//! let weather = SourceStyle::from_value(json!({
//!     "id": "weather",
//!     "layers": [{ "id": "l1", "type": "fill", "source": "radar" }]
//! }))
//! .unwrap();
//! let location = SourceStyle::from_value(json!({
//!     "id": "location",
//!     "layers": [{ "id": "l2", "type": "symbol" }]
//! }))
//! .unwrap();
//!
//! let (mixed, prefixes) = StyleMerger::default().merge_with_prefixes(
//!     "demo",
//!     Some("Demo"),
//!     &[(weather, None), (location, None)],
//! );
//! assert_eq!(prefixes, ["weather", "location"]);
//! assert_eq!(mixed.layers[0]["id"], "weather_l1");
//! assert_eq!(mixed.layers[1]["id"], "location_l2");
//! ```

mod error;
mod merger;
mod mixed;
mod options;
mod prefix;
mod source;
mod text_font;

pub use error::{Error, Result};
pub use merger::{PrefixedStyle, StyleMerger, humanize};
pub use mixed::{GLYPHS_TEMPLATE, LOCALES, MixedMetadata, MixedStyle, STYLE_VERSION};
pub use options::{Options, PASSTHROUGH_METADATA};
pub use prefix::{Prefix, PrefixAssigner, assign_prefixes, sanitize};
pub use source::{SourceStyle, is_http_url};
pub use text_font::{StopFont, TextFont, font_references, layer_text_font};
