//! JSON description files paired with images.
//!
//! Atlas (`.atlas`): `{ "name": {"x":0,"y":0,"width":16,"height":16}, ... }`,
//! or the short form `{ "name": [x, y, width, height] }`. Region order is the
//! file order.
//!
//! Font (`.font`):
//! `{ "size": 16, "unknown": {...}, "glyphs": { "A": {...}, ... } }`, where
//! every glyph is a rectangle with optional `offsetX`/`offsetY`.

use std::collections::HashMap;

use serde::Deserialize;

use super::error::AssetError;
use crate::platform::image::PixelRect;

/// Pixel rectangle in either object or array form.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
enum RectDescriptor {
    Object {
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    },
    Array([i32; 4]),
}

impl From<RectDescriptor> for PixelRect {
    fn from(desc: RectDescriptor) -> Self {
        match desc {
            RectDescriptor::Object { x, y, width, height } => PixelRect::new(x, y, width, height),
            RectDescriptor::Array([x, y, width, height]) => PixelRect::new(x, y, width, height),
        }
    }
}

/// Parsed atlas description: ordered `(name, rect)` pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct AtlasDescription {
    pub regions: Vec<(String, PixelRect)>,
}

impl AtlasDescription {
    /// Parse an atlas description. `path` is only used in error messages.
    pub fn from_json(path: &str, json: &str) -> Result<Self, AssetError> {
        let map: serde_json::Map<String, serde_json::Value> = serde_json::from_str(json)?;
        let mut regions = Vec::with_capacity(map.len());
        for (name, value) in map {
            let desc: RectDescriptor = serde_json::from_value(value)?;
            let rect = PixelRect::from(desc);
            if rect.is_empty() {
                return Err(AssetError::invalid(path, format!("region \"{name}\" has no area")));
            }
            if !rect.is_representable() {
                return Err(AssetError::invalid(path, format!("region \"{name}\" is out of range")));
            }
            regions.push((name, rect));
        }
        if regions.is_empty() {
            return Err(AssetError::invalid(path, "atlas has no regions"));
        }
        Ok(Self { regions })
    }

    /// Every region must lie inside an image of the given size.
    pub fn validate(&self, path: &str, width: u32, height: u32) -> Result<(), AssetError> {
        let bounds = PixelRect::new(0, 0, width as i32, height as i32);
        match self.regions.iter().find(|(_, rect)| !bounds.contains(rect)) {
            Some((name, _)) => Err(AssetError::invalid(
                path,
                format!("region \"{name}\" exceeds {width}x{height} image"),
            )),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GlyphDescriptor {
    x: i32,
    y: i32,
    width: i32,
    height: i32,
    #[serde(default)]
    offset_x: f32,
    #[serde(default)]
    offset_y: f32,
}

/// Metrics of one glyph as written in the description.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphMetrics {
    pub rect: PixelRect,
    pub offset_x: f32,
    pub offset_y: f32,
}

impl From<GlyphDescriptor> for GlyphMetrics {
    fn from(desc: GlyphDescriptor) -> Self {
        Self {
            rect: PixelRect::new(desc.x, desc.y, desc.width, desc.height),
            offset_x: desc.offset_x,
            offset_y: desc.offset_y,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawFontDescription {
    #[serde(default)]
    size: u32,
    unknown: GlyphDescriptor,
    #[serde(default)]
    glyphs: HashMap<String, GlyphDescriptor>,
}

/// Parsed font description.
#[derive(Debug, Clone, PartialEq)]
pub struct FontDescription {
    pub size: u32,
    pub unknown: GlyphMetrics,
    pub glyphs: HashMap<char, GlyphMetrics>,
}

impl FontDescription {
    pub fn from_json(path: &str, json: &str) -> Result<Self, AssetError> {
        let raw: RawFontDescription = serde_json::from_str(json)?;
        let mut glyphs = HashMap::with_capacity(raw.glyphs.len());
        for (key, desc) in raw.glyphs {
            let mut chars = key.chars();
            let (Some(c), None) = (chars.next(), chars.next()) else {
                return Err(AssetError::invalid(
                    path,
                    format!("glyph key \"{key}\" must be a single character"),
                ));
            };
            let metrics = GlyphMetrics::from(desc);
            if !metrics.rect.is_representable() {
                return Err(AssetError::invalid(path, format!("glyph '{c}' is out of range")));
            }
            glyphs.insert(c, metrics);
        }
        let unknown = GlyphMetrics::from(raw.unknown);
        if !unknown.rect.is_representable() {
            return Err(AssetError::invalid(path, "unknown glyph is out of range"));
        }
        Ok(Self {
            size: raw.size,
            unknown,
            glyphs,
        })
    }

    pub fn validate(&self, path: &str, width: u32, height: u32) -> Result<(), AssetError> {
        let bounds = PixelRect::new(0, 0, width as i32, height as i32);
        let outside = std::iter::once((None, &self.unknown))
            .chain(self.glyphs.iter().map(|(c, g)| (Some(*c), g)))
            .find(|(_, g)| !bounds.contains(&g.rect));
        match outside {
            Some((Some(c), _)) => Err(AssetError::invalid(path, format!("glyph '{c}' exceeds the image"))),
            Some((None, _)) => Err(AssetError::invalid(path, "unknown glyph exceeds the image")),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atlas_accepts_both_forms_in_order() {
        let json = r#"{
            "zeta": [0, 0, 16, 16],
            "alpha": {"x": 16, "y": 0, "width": 8, "height": 4}
        }"#;
        let atlas = AtlasDescription::from_json("sheet.atlas", json).unwrap();
        assert_eq!(
            atlas.regions,
            vec![
                ("zeta".to_string(), PixelRect::new(0, 0, 16, 16)),
                ("alpha".to_string(), PixelRect::new(16, 0, 8, 4)),
            ]
        );
    }

    #[test]
    fn atlas_rejects_malformed_region() {
        let json = r#"{"a": [0, 0, 16, 16], "b": [1, 2]}"#;
        assert!(matches!(
            AtlasDescription::from_json("sheet.atlas", json),
            Err(AssetError::Description(_))
        ));
    }

    #[test]
    fn atlas_rejects_empty_and_degenerate() {
        assert!(AtlasDescription::from_json("s", "{}").is_err());
        assert!(AtlasDescription::from_json("s", r#"{"a": [0, 0, 0, 4]}"#).is_err());
        assert!(AtlasDescription::from_json("s", "not json").is_err());
    }

    #[test]
    fn atlas_rejects_overflowing_region() {
        let json = r#"{"a": [2147483647, 0, 1, 1]}"#;
        assert!(matches!(
            AtlasDescription::from_json("sheet.atlas", json),
            Err(AssetError::InvalidDescription { .. })
        ));
        let atlas = AtlasDescription {
            regions: vec![("a".to_string(), PixelRect::new(i32::MAX, i32::MAX, i32::MAX, 1))],
        };
        assert!(atlas.validate("sheet.atlas", 32, 16).is_err());
    }

    #[test]
    fn font_rejects_overflowing_glyph() {
        let json = r#"{
            "unknown": {"x": 0, "y": 2147483647, "width": 1, "height": 1},
            "glyphs": {}
        }"#;
        assert!(FontDescription::from_json("f", json).is_err());
    }

    #[test]
    fn atlas_validation_checks_bounds() {
        let atlas = AtlasDescription::from_json("s", r#"{"a": [16, 0, 16, 16]}"#).unwrap();
        assert!(atlas.validate("s", 32, 16).is_ok());
        assert!(atlas.validate("s", 31, 16).is_err());
    }

    #[test]
    fn font_parses_glyphs_and_offsets() {
        let json = r#"{
            "size": 12,
            "unknown": {"x": 0, "y": 0, "width": 6, "height": 12},
            "glyphs": {
                "A": {"x": 6, "y": 0, "width": 7, "height": 12, "offsetY": -1}
            }
        }"#;
        let font = FontDescription::from_json("main.font", json).unwrap();
        assert_eq!(font.size, 12);
        let a = font.glyphs[&'A'];
        assert_eq!(a.rect, PixelRect::new(6, 0, 7, 12));
        assert_eq!(a.offset_y, -1.0);
        assert_eq!(a.offset_x, 0.0);
        assert!(font.validate("main.font", 16, 12).is_ok());
        assert!(font.validate("main.font", 12, 12).is_err());
    }

    #[test]
    fn font_requires_unknown_glyph() {
        let json = r#"{"glyphs": {"A": {"x": 0, "y": 0, "width": 1, "height": 1}}}"#;
        assert!(FontDescription::from_json("f", json).is_err());
    }

    #[test]
    fn font_rejects_multi_char_keys() {
        let json = r#"{
            "unknown": {"x": 0, "y": 0, "width": 1, "height": 1},
            "glyphs": {"AB": {"x": 0, "y": 0, "width": 1, "height": 1}}
        }"#;
        assert!(matches!(
            FontDescription::from_json("f", json),
            Err(AssetError::InvalidDescription { .. })
        ));
    }
}
