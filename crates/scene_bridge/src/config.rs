//! Configuration system
//!
//! Settings are plain serde types loadable from TOML or RON; the format is
//! picked by file extension.

use serde::{Deserialize, Serialize};

use crate::render::{ColorSpace, FrameDescriptor};

/// Configuration trait: load/save by file extension
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from a `.toml` or `.ron` file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        if !path.ends_with(".toml") && !path.ends_with(".ron") {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        }
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        }
    }

    /// Save configuration to a `.toml` or `.ron` file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };
        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),
}

/// Render-session settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Output width in pixels
    pub width: u32,
    /// Output height in pixels
    pub height: u32,
    /// Square tile edge length in pixels
    pub tile_size: u32,
    /// Per-pixel sample count
    pub samples: u32,
    /// Color space the renderer writes
    pub color_space: ColorSpace,
    /// Whether motion blur is sampled at all
    pub motion_blur: bool,
    /// Motion-blur time steps per object
    pub motion_steps: u32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            width: 64,
            height: 64,
            tile_size: 16,
            samples: 32,
            color_space: ColorSpace::LinearRgb,
            motion_blur: false,
            motion_steps: 1,
        }
    }
}

impl Config for RenderSettings {}

impl RenderSettings {
    /// Frame descriptor matching these settings (no camera bound yet)
    #[must_use]
    pub fn frame_descriptor(&self) -> FrameDescriptor {
        FrameDescriptor {
            width: self.width,
            height: self.height,
            tile_size: self.tile_size,
            color_space: self.color_space,
            camera: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_renderer_conventions() {
        let settings = RenderSettings::default();
        assert_eq!(settings.width, 64);
        assert_eq!(settings.height, 64);
        assert_eq!(settings.tile_size, 16);
        assert_eq!(settings.samples, 32);
        assert_eq!(settings.color_space, ColorSpace::LinearRgb);
        assert_eq!(settings.motion_steps, 1);
    }

    #[test]
    fn test_toml_round_trip() {
        let settings = RenderSettings {
            width: 800,
            height: 600,
            samples: 8,
            ..RenderSettings::default()
        };
        let text = toml::to_string_pretty(&settings).unwrap();
        let parsed: RenderSettings = toml::from_str(&text).unwrap();
        assert_eq!(parsed, settings);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let parsed: RenderSettings = toml::from_str("width = 320\nheight = 240\n").unwrap();
        assert_eq!(parsed.width, 320);
        assert_eq!(parsed.height, 240);
        assert_eq!(parsed.tile_size, 16);
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        assert!(matches!(
            RenderSettings::load_from_file("settings.yaml"),
            Err(ConfigError::UnsupportedFormat(_))
        ));
    }
}
