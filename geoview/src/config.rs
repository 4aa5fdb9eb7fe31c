//! Viewer configuration
//!
//! Everything here is plain serde data. A configuration can be loaded from
//! JSON, and a mode switch merges [`ConfigOverrides`] over the active
//! configuration.

use crate::core::coordinates::Extent;
use crate::core::geodesy::GeographicPoint;
use crate::core::scene::AxisConvention;
use crate::error::ConfigError;
use crate::layers::LayerConfig;
use crate::presenter::PresenterMode;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Reference system used for projected coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceSystemConfig {
    /// Code such as `EPSG:32633`
    pub code: String,
    /// Explicit definition; when absent the code is resolved through the runtime
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
}

impl ReferenceSystemConfig {
    pub fn code(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            definition: None,
        }
    }

    pub fn with_definition(mut self, definition: impl Into<String>) -> Self {
        self.definition = Some(definition.into());
        self
    }

    /// Geographic WGS84, used by the immersive presenter when nothing is configured
    pub fn wgs84() -> Self {
        Self::code("EPSG:4326")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lighting {
    #[default]
    Default,
    Flat,
    Sun,
}

/// Options handed to the renderer of whichever presenter is active
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererOptions {
    /// Clear colour as linear RGBA
    pub background: [f32; 4],
    pub shadows: bool,
    pub lighting: Lighting,
}

impl Default for RendererOptions {
    fn default() -> Self {
        Self {
            background: [0.1, 0.1, 0.12, 1.0],
            shadows: false,
            lighting: Lighting::Default,
        }
    }
}

/// When the origin follows the camera
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RebaseConfig {
    pub enabled: bool,
    /// Camera distance from the origin (metres) that triggers a rebase
    pub threshold: f64,
}

impl Default for RebaseConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: 10_000.0,
        }
    }
}

/// Size of the render surface in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub mode: PresenterMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_system: Option<ReferenceSystemConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<GeographicPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extent: Option<Extent>,
    pub renderer: RendererOptions,
    pub axis_convention: AxisConvention,
    pub rebase: RebaseConfig,
    pub viewport: Viewport,
    pub layers: Vec<LayerConfig>,
}

impl ViewerConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        debug!(path = ?path, "Loading viewer config");
        let json = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&json)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Apply overrides on top of this configuration
    pub fn merged(&self, overrides: &ConfigOverrides) -> ViewerConfig {
        let mut merged = self.clone();
        if let Some(reference_system) = &overrides.reference_system {
            merged.reference_system = Some(reference_system.clone());
        }
        if let Some(origin) = overrides.origin {
            merged.origin = Some(origin);
        }
        if let Some(extent) = &overrides.extent {
            merged.extent = Some(extent.clone());
        }
        if let Some(renderer) = &overrides.renderer {
            merged.renderer = renderer.clone();
        }
        if let Some(axis_convention) = overrides.axis_convention {
            merged.axis_convention = axis_convention;
        }
        if let Some(rebase) = overrides.rebase {
            merged.rebase = rebase;
        }
        if let Some(layers) = &overrides.layers {
            merged.layers = layers.clone();
        }
        merged
    }

    /// Reference system in effect for a mode
    ///
    /// The immersive presenter works without one and falls back to WGS84.
    pub fn reference_system_for(&self, mode: PresenterMode) -> Option<ReferenceSystemConfig> {
        match (&self.reference_system, mode) {
            (Some(reference_system), _) => Some(reference_system.clone()),
            (None, PresenterMode::Immersive) => Some(ReferenceSystemConfig::wgs84()),
            (None, PresenterMode::Map) => None,
        }
    }

    /// Check that everything a mode needs is present and sane
    pub fn validate_for(&self, mode: PresenterMode) -> Result<(), ConfigError> {
        if let Some(origin) = &self.origin {
            if !origin.is_valid() {
                return Err(ConfigError::InvalidOrigin(origin.to_string()));
            }
        }
        if let Some(extent) = &self.extent {
            extent.validate()?;
        }
        if self.origin.is_none() && self.extent.is_none() {
            return Err(ConfigError::InvalidOrigin(
                "neither an origin nor an extent is configured".to_string(),
            ));
        }
        if !(self.rebase.threshold.is_finite() && self.rebase.threshold > 0.0) {
            return Err(ConfigError::Parse(format!(
                "rebase threshold must be positive, got {}",
                self.rebase.threshold
            )));
        }

        if mode == PresenterMode::Map {
            if self.reference_system.is_none() {
                return Err(ConfigError::MissingReferenceSystem);
            }
            if self.extent.is_none() {
                return Err(ConfigError::MissingExtent);
            }
        }
        Ok(())
    }
}

/// Per-switch configuration; `Some` fields replace the active values
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigOverrides {
    pub reference_system: Option<ReferenceSystemConfig>,
    pub origin: Option<GeographicPoint>,
    pub extent: Option<Extent>,
    pub renderer: Option<RendererOptions>,
    pub axis_convention: Option<AxisConvention>,
    pub rebase: Option<RebaseConfig>,
    pub layers: Option<Vec<LayerConfig>>,
}

impl ConfigOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reference_system(mut self, reference_system: ReferenceSystemConfig) -> Self {
        self.reference_system = Some(reference_system);
        self
    }

    pub fn extent(mut self, extent: Extent) -> Self {
        self.extent = Some(extent);
        self
    }

    pub fn origin(mut self, origin: GeographicPoint) -> Self {
        self.origin = Some(origin);
        self
    }

    pub fn renderer(mut self, renderer: RendererOptions) -> Self {
        self.renderer = Some(renderer);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn map_config() -> ViewerConfig {
        ViewerConfig {
            mode: PresenterMode::Map,
            reference_system: Some(ReferenceSystemConfig::code("EPSG:32633")),
            extent: Some(Extent::new(400_000.0, 420_000.0, 5_650_000.0, 5_660_000.0)),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = ViewerConfig::default();
        assert_eq!(config.mode, PresenterMode::Immersive);
        assert!(config.rebase.enabled);
        assert_eq!(config.rebase.threshold, 10_000.0);
        assert_eq!(config.axis_convention, AxisConvention::YUp);
    }

    #[test]
    fn test_map_mode_requires_reference_system_and_extent() {
        let mut config = map_config();
        assert!(config.validate_for(PresenterMode::Map).is_ok());

        config.extent = None;
        config.origin = Some(GeographicPoint::new(51.05, 13.74, 0.0));
        assert_eq!(config.validate_for(PresenterMode::Map), Err(ConfigError::MissingExtent));

        config.reference_system = None;
        assert_eq!(
            config.validate_for(PresenterMode::Map),
            Err(ConfigError::MissingReferenceSystem)
        );
        assert!(config.validate_for(PresenterMode::Immersive).is_ok());
    }

    #[test]
    fn test_immersive_falls_back_to_wgs84() {
        let config = ViewerConfig::default();
        assert_eq!(
            config.reference_system_for(PresenterMode::Immersive),
            Some(ReferenceSystemConfig::wgs84())
        );
        assert_eq!(config.reference_system_for(PresenterMode::Map), None);
    }

    #[test]
    fn test_overrides_replace_only_given_fields() {
        let base = map_config();
        let overrides = ConfigOverrides::new().renderer(RendererOptions {
            shadows: true,
            ..Default::default()
        });
        let merged = base.merged(&overrides);
        assert!(merged.renderer.shadows);
        assert_eq!(merged.reference_system, base.reference_system);
        assert_eq!(merged.extent, base.extent);
    }

    #[test]
    fn test_parse_json() {
        let config = ViewerConfig::from_json_str(
            r#"{
                "mode": "map",
                "reference_system": { "code": "EPSG:32633" },
                "origin": { "latitude": 51.05, "longitude": 13.74 },
                "extent": { "min_x": 400000, "max_x": 420000, "min_y": 5650000, "max_y": 5660000 },
                "renderer": { "shadows": true }
            }"#,
        )
        .unwrap();
        assert_eq!(config.mode, PresenterMode::Map);
        assert!(config.renderer.shadows);
        assert_eq!(config.renderer.lighting, Lighting::Default);
        assert_eq!(config.origin.unwrap().height, 0.0);
    }

    #[test]
    fn test_parse_error() {
        let result = ViewerConfig::from_json_str("{ not json");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_from_file() {
        let config = map_config();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(config.to_json().unwrap().as_bytes()).unwrap();

        let loaded = ViewerConfig::load_from_file(file.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file() {
        let result = ViewerConfig::load_from_file("/definitely/not/here.json");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
