//! Drop atlases whose pixels and metadata duplicate an earlier one.

use std::collections::HashSet;

use log::{debug, warn};

use crate::SourceAtlas;

/// Keep the first atlas of every fingerprint group, in input order.
///
/// An atlas that cannot be fingerprinted is skipped.
pub fn dedup(atlases: Vec<SourceAtlas>) -> Vec<SourceAtlas> {
    let mut seen = HashSet::new();
    let mut unique = Vec::with_capacity(atlases.len());

    for source in atlases {
        let fingerprint = match source.atlas.fingerprint() {
            Ok(fp) => fp,
            Err(e) => {
                warn!("Skipping sprite {}: {e}", source.key);
                continue;
            }
        };
        if seen.insert(fingerprint) {
            unique.push(source);
        } else {
            debug!("Sprite {} duplicates an earlier atlas", source.key);
        }
    }

    unique
}

#[cfg(test)]
mod tests {
    use image::{Rgba, RgbaImage};

    use super::*;
    use crate::{Icon, SpriteAtlas};

    fn source(key: &str, shade: u8) -> SourceAtlas {
        let icons = [("pin".to_owned(), Icon::new(0, 0, 2, 2))].into_iter().collect();
        SourceAtlas::new(key, SpriteAtlas::new(RgbaImage::from_pixel(2, 2, Rgba([shade, 0, 0, 255])), icons))
    }

    #[test]
    fn test_keeps_first_of_each_group() {
        let kept = dedup(vec![source("1", 10), source("2", 20), source("3", 10), source("4", 20)]);
        let keys: Vec<_> = kept.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, ["1", "2"]);
    }

    #[test]
    fn test_idempotent() {
        let once = dedup(vec![source("a", 1), source("b", 1), source("c", 2)]);
        let twice = dedup(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_empty_input() {
        assert!(dedup(Vec::new()).is_empty());
    }
}
