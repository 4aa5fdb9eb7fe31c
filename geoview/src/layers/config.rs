//! Layer configuration: one typed payload per layer kind

use crate::core::coordinates::Extent;
use serde::{Deserialize, Serialize};
use std::fmt;

fn default_opacity() -> f32 {
    1.0
}

fn default_visible() -> bool {
    true
}

fn default_max_zoom() -> u8 {
    19
}

fn default_format() -> String {
    "image/png".to_string()
}

fn default_exaggeration() -> f64 {
    1.0
}

/// XYZ tile service, e.g. `https://tile.example.org/{z}/{x}/{y}.png`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterTilesConfig {
    pub name: String,
    pub url_template: String,
    #[serde(default)]
    pub min_zoom: u8,
    #[serde(default = "default_max_zoom")]
    pub max_zoom: u8,
    #[serde(default = "default_opacity")]
    pub opacity: f32,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default)]
    pub attribution: Option<String>,
}

/// OGC web map service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WmsConfig {
    pub name: String,
    pub url: String,
    pub layers: Vec<String>,
    #[serde(default = "default_format")]
    pub format: String,
    #[serde(default)]
    pub transparent: bool,
    #[serde(default = "default_opacity")]
    pub opacity: f32,
    #[serde(default = "default_visible")]
    pub visible: bool,
    /// Restrict requests to this extent (normalized like any other extent)
    #[serde(default)]
    pub extent: Option<Extent>,
}

/// Vector features drawn over the map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorConfig {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default = "default_opacity")]
    pub opacity: f32,
    #[serde(default = "default_visible")]
    pub visible: bool,
}

/// Terrain heights used to displace the map surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElevationConfig {
    pub name: String,
    pub url: String,
    #[serde(default = "default_exaggeration")]
    pub exaggeration: f64,
}

/// Closed set of layer kinds, tagged by `kind` in JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayerConfig {
    RasterTiles(RasterTilesConfig),
    Wms(WmsConfig),
    Vector(VectorConfig),
    Elevation(ElevationConfig),
}

impl LayerConfig {
    pub fn kind(&self) -> LayerKind {
        match self {
            LayerConfig::RasterTiles(_) => LayerKind::RasterTiles,
            LayerConfig::Wms(_) => LayerKind::Wms,
            LayerConfig::Vector(_) => LayerKind::Vector,
            LayerConfig::Elevation(_) => LayerKind::Elevation,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            LayerConfig::RasterTiles(c) => &c.name,
            LayerConfig::Wms(c) => &c.name,
            LayerConfig::Vector(c) => &c.name,
            LayerConfig::Elevation(c) => &c.name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    RasterTiles,
    Wms,
    Vector,
    Elevation,
}

impl LayerKind {
    pub const ALL: [LayerKind; 4] = [
        LayerKind::RasterTiles,
        LayerKind::Wms,
        LayerKind::Vector,
        LayerKind::Elevation,
    ];
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LayerKind::RasterTiles => "raster_tiles",
            LayerKind::Wms => "wms",
            LayerKind::Vector => "vector",
            LayerKind::Elevation => "elevation",
        };
        f.write_str(name)
    }
}
