//! Game configuration read from `config.json` at the asset root.
//!
//! Every field is optional. Invalid values are logged and replaced with the
//! default; a broken config never stops the engine.

use std::collections::HashMap;
use std::str::FromStr;

use serde::Deserialize;

use super::sizes::RESOLUTIONS;
use crate::platform::files::{FileLocation, FileSystem};
use crate::renderer::vertex::Color;

/// Asset-root names the asset walker never loads.
pub const CONFIG_FILENAME: &str = "config.json";
pub const SCRIPTS_PATH: &str = "scripts";
pub const LOCALIZATION_PATH: &str = "strings";

pub const DEFAULT_RESOLUTION: &str = "HVGA";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    Portrait,
    #[default]
    Landscape,
}

impl FromStr for Orientation {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "portrait" => Ok(Self::Portrait),
            "landscape" => Ok(Self::Landscape),
            _ => Err(()),
        }
    }
}

/// How the content area is mapped onto the physical screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScaleMode {
    /// Grow the content area along the longer axis to fill the screen.
    Stretch,
    /// Keep the content area and letterbox it.
    #[default]
    Fit,
    /// Stretch on screens wider than the content, fit otherwise.
    Adaptive,
}

impl FromStr for ScaleMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stretch" => Ok(Self::Stretch),
            "fit" => Ok(Self::Fit),
            "adaptive" => Ok(Self::Adaptive),
            _ => Err(()),
        }
    }
}

/// Wire form: everything optional, enums as strings so unknown values can be
/// reported instead of failing the whole file.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawConfig {
    name: Option<String>,
    orientation: Option<String>,
    resolutions: Option<Vec<String>>,
    scale_mode: Option<String>,
    content_width: Option<f32>,
    content_height: Option<f32>,
    background_color: Option<Color>,
    #[serde(flatten)]
    custom: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub name: String,
    pub orientation: Orientation,
    /// Resolution buckets in preference order, all present in [`RESOLUTIONS`].
    pub resolutions: Vec<String>,
    pub scale_mode: ScaleMode,
    pub content_width: f32,
    pub content_height: f32,
    pub background_color: Color,
    /// Top-level objects not recognised above, by key.
    pub custom: HashMap<String, serde_json::Value>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: "luma".to_string(),
            orientation: Orientation::Landscape,
            resolutions: vec![DEFAULT_RESOLUTION.to_string()],
            scale_mode: ScaleMode::Fit,
            content_width: 480.0,
            content_height: 320.0,
            background_color: Color::BLACK,
            custom: HashMap::new(),
        }
    }
}

impl Config {
    /// Read `config.json` from the asset root, falling back to defaults.
    pub fn read(files: &dyn FileSystem) -> Self {
        if !files.is_file(CONFIG_FILENAME, FileLocation::Assets) {
            log::warn!("Config file \"{CONFIG_FILENAME}\" not found, using defaults");
            return Self::default();
        }
        match files.read_to_string(CONFIG_FILENAME, FileLocation::Assets) {
            Some(json) => Self::from_json(&json),
            None => {
                log::error!("Cannot read config file \"{CONFIG_FILENAME}\", using defaults");
                Self::default()
            }
        }
    }

    pub fn from_json(json: &str) -> Self {
        match serde_json::from_str::<RawConfig>(json) {
            Ok(raw) => Self::from_raw(raw),
            Err(err) => {
                log::error!("Error parsing config: {err}, using defaults");
                Self::default()
            }
        }
    }

    fn from_raw(raw: RawConfig) -> Self {
        let mut config = Self::default();

        if let Some(name) = raw.name {
            if name.is_empty() {
                log::error!("Config name is empty, using \"{}\"", config.name);
            } else {
                config.name = name;
            }
        }

        if let Some(orientation) = raw.orientation {
            match orientation.parse() {
                Ok(parsed) => config.orientation = parsed,
                Err(()) => log::error!("Incorrect orientation \"{orientation}\""),
            }
        }

        if let Some(resolutions) = raw.resolutions {
            let supported: Vec<String> = resolutions
                .into_iter()
                .filter(|name| {
                    let known = RESOLUTIONS.iter().any(|(bucket, _)| bucket == name);
                    if !known {
                        log::error!("Unsupported resolution \"{name}\"");
                    }
                    known
                })
                .collect();
            if !supported.is_empty() {
                config.resolutions = supported;
            }
        }

        if let Some(mode) = raw.scale_mode {
            match mode.parse() {
                Ok(parsed) => config.scale_mode = parsed,
                Err(()) => log::error!("Unsupported scale mode \"{mode}\""),
            }
        }

        for (field, value, slot) in [
            ("contentWidth", raw.content_width, &mut config.content_width),
            ("contentHeight", raw.content_height, &mut config.content_height),
        ] {
            match value {
                Some(v) if v.is_finite() && v > 0.0 => *slot = v,
                Some(v) => log::error!("Config field \"{field}\" must be positive, got {v}"),
                None => {}
            }
        }

        if let Some(color) = raw.background_color {
            config.background_color = color;
        }

        config.custom = raw
            .custom
            .into_iter()
            .filter(|(_, value)| value.is_object())
            .collect();
        config
    }

    /// Custom value `name` from the top-level object `namespace`.
    pub fn custom_value(&self, namespace: &str, name: &str) -> Option<&serde_json::Value> {
        self.custom.get(namespace)?.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::files::MemoryFileSystem;

    #[test]
    fn reads_all_fields() {
        let config = Config::from_json(
            r#"{
                "name": "demo",
                "orientation": "portrait",
                "resolutions": ["WVGA", "HD"],
                "scaleMode": "adaptive",
                "contentWidth": 320,
                "contentHeight": 480,
                "backgroundColor": [255, 255, 255],
                "game": {"lives": 3}
            }"#,
        );
        assert_eq!(config.name, "demo");
        assert_eq!(config.orientation, Orientation::Portrait);
        assert_eq!(config.resolutions, ["WVGA", "HD"]);
        assert_eq!(config.scale_mode, ScaleMode::Adaptive);
        assert_eq!((config.content_width, config.content_height), (320.0, 480.0));
        assert_eq!(config.background_color, Color::WHITE);
        assert_eq!(config.custom_value("game", "lives"), Some(&serde_json::json!(3)));
    }

    #[test]
    fn invalid_values_fall_back() {
        let config = Config::from_json(
            r#"{
                "orientation": "sideways",
                "resolutions": ["8K", "VGA"],
                "scaleMode": "zoom",
                "contentWidth": -5
            }"#,
        );
        let defaults = Config::default();
        assert_eq!(config.orientation, defaults.orientation);
        assert_eq!(config.resolutions, [DEFAULT_RESOLUTION]);
        assert_eq!(config.scale_mode, defaults.scale_mode);
        assert_eq!(config.content_width, defaults.content_width);
    }

    #[test]
    fn unknown_resolutions_are_dropped() {
        let config = Config::from_json(r#"{"resolutions": ["nope", "FullHD"]}"#);
        assert_eq!(config.resolutions, ["FullHD"]);
    }

    #[test]
    fn malformed_or_missing_file_gives_defaults() {
        assert_eq!(Config::from_json("{ not json"), Config::default());
        assert_eq!(Config::read(&MemoryFileSystem::new()), Config::default());

        let files = MemoryFileSystem::new().with_file(CONFIG_FILENAME, r#"{"scaleMode": "stretch"}"#);
        assert_eq!(Config::read(&files).scale_mode, ScaleMode::Stretch);
    }
}
