//! Renderer configuration
//!
//! Settings are read from a TOML file. Every field has a default so a config
//! file only needs the values it changes:
//!
//! ```toml
//! [window]
//! title = "Toon shadows"
//! vsync = true
//!
//! [shadow]
//! map_size = 4096
//!
//! [outline]
//! width = 0.03
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub window: WindowSettings,
    pub shadow: ShadowSettings,
    pub outline: OutlineSettings,
    pub material: MaterialSettings,
    pub post: PostSettings,
    pub camera: CameraSettings,
    /// Clear color of the offscreen target, linear RGBA
    pub clear_color: [f32; 4],
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            window: WindowSettings::default(),
            shadow: ShadowSettings::default(),
            outline: OutlineSettings::default(),
            material: MaterialSettings::default(),
            post: PostSettings::default(),
            camera: CameraSettings::default(),
            clear_color: [0.1, 0.1, 0.12, 1.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSettings {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            title: "lumen".to_string(),
            width: 1280,
            height: 720,
            vsync: true,
        }
    }
}

/// Shadow map resolution and the light's orthographic frustum
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowSettings {
    pub map_size: u32,
    /// Half extent of the square orthographic light frustum
    pub half_extent: f32,
    pub near: f32,
    pub far: f32,
    /// Point the light looks at when rendering the shadow map
    pub target: [f32; 3],
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            map_size: 2048,
            half_extent: 10.0,
            near: 1.0,
            far: 25.0,
            target: [0.0, 0.0, 0.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlineSettings {
    pub color: [f32; 4],
    /// Extrusion along the vertex normal, in object space units
    pub width: f32,
}

impl Default for OutlineSettings {
    fn default() -> Self {
        Self {
            color: [0.02, 0.02, 0.02, 1.0],
            width: 0.03,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialSettings {
    pub shininess: f32,
    /// Number of toon bands; 0 keeps smooth Phong shading
    pub toon_levels: u32,
}

impl Default for MaterialSettings {
    fn default() -> Self {
        Self {
            shininess: 32.0,
            toon_levels: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostSettings {
    pub exposure: f32,
    pub gamma: f32,
    pub tone_map: bool,
}

impl Default for PostSettings {
    fn default() -> Self {
        Self {
            exposure: 1.0,
            gamma: 2.2,
            tone_map: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    pub position: [f32; 3],
    pub speed: f32,
    pub sensitivity: f32,
    /// Vertical field of view in degrees
    pub fov: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            position: [0.0, 1.5, 6.0],
            speed: 2.5,
            sensitivity: 0.1,
            fov: 45.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

impl RenderSettings {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Loads `path`, falling back to defaults when it is missing or invalid
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            log::info!("no config at '{}', using defaults", path.display());
            return Self::default();
        }

        match Self::load(path) {
            Ok(settings) => {
                log::info!("loaded config from '{}'", path.display());
                settings
            }
            Err(e) => {
                log::error!("{e}; using default settings");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let settings = RenderSettings::from_toml_str(
            r#"
            [shadow]
            map_size = 4096

            [outline]
            width = 0.05
            "#,
        )
        .unwrap();

        assert_eq!(settings.shadow.map_size, 4096);
        assert_eq!(settings.outline.width, 0.05);
        assert_eq!(settings.shadow.near, ShadowSettings::default().near);
        assert_eq!(settings.window, WindowSettings::default());
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let result = RenderSettings::from_toml_str("[shadow]\nmap_size = \"big\"");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_file_falls_back() {
        let settings = RenderSettings::load_or_default("definitely/not/here.toml");
        assert_eq!(settings, RenderSettings::default());
    }
}
