//! Layer builders, dispatched by kind

use super::config::{
    ElevationConfig, LayerConfig, LayerKind, RasterTilesConfig, VectorConfig, WmsConfig,
};
use crate::core::coordinates::{normalize_extent, CoordinateAdapter, Extent};
use crate::error::{ConfigError, ViewerError};
use crate::runtime::Runtime;
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// Identifier assigned to a layer by the presenter that shows it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(pub u32);

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "layer:{}", self.0)
    }
}

/// Where a layer's data comes from, validated
#[derive(Debug, Clone, PartialEq)]
pub enum LayerSource {
    Tiles {
        url_template: String,
        min_zoom: u8,
        max_zoom: u8,
        attribution: Option<String>,
    },
    Wms {
        endpoint: String,
        layers: Vec<String>,
        format: String,
        transparent: bool,
    },
    Vector {
        url: String,
        style: Option<String>,
    },
    Elevation {
        url: String,
        exaggeration: f64,
    },
}

/// A layer ready to hand to a map engine
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub name: String,
    pub kind: LayerKind,
    pub source: LayerSource,
    pub opacity: f32,
    pub visible: bool,
    /// Extent in the active reference system, if restricted
    pub extent: Option<Extent>,
}

/// What a builder may consult
pub struct LayerContext<'a> {
    pub adapter: &'a CoordinateAdapter,
    pub runtime: &'a Runtime,
}

pub trait LayerBuilder: fmt::Debug {
    fn kind(&self) -> LayerKind;

    fn build(&self, config: &LayerConfig, context: &LayerContext<'_>) -> Result<Layer, ViewerError>;
}

fn invalid(name: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidLayer {
        name: name.to_string(),
        reason: reason.into(),
    }
}

fn check_common(name: &str, url: &str, opacity: f32) -> Result<(), ConfigError> {
    if name.trim().is_empty() {
        return Err(invalid(name, "layer name is empty"));
    }
    if url.trim().is_empty() {
        return Err(invalid(name, "url is empty"));
    }
    if !(0.0..=1.0).contains(&opacity) {
        return Err(invalid(name, format!("opacity {opacity} outside [0, 1]")));
    }
    Ok(())
}

fn mismatch(expected: LayerKind, config: &LayerConfig) -> ConfigError {
    invalid(
        config.name(),
        format!("{expected} builder given a {} layer", config.kind()),
    )
}

#[derive(Debug, Default)]
pub struct RasterTilesBuilder;

impl RasterTilesBuilder {
    fn check(config: &RasterTilesConfig) -> Result<(), ConfigError> {
        check_common(&config.name, &config.url_template, config.opacity)?;
        for placeholder in ["{z}", "{x}", "{y}"] {
            if !config.url_template.contains(placeholder) {
                return Err(invalid(
                    &config.name,
                    format!("url template lacks {placeholder}"),
                ));
            }
        }
        if config.min_zoom > config.max_zoom {
            return Err(invalid(
                &config.name,
                format!("min_zoom {} above max_zoom {}", config.min_zoom, config.max_zoom),
            ));
        }
        Ok(())
    }
}

impl LayerBuilder for RasterTilesBuilder {
    fn kind(&self) -> LayerKind {
        LayerKind::RasterTiles
    }

    fn build(&self, config: &LayerConfig, _context: &LayerContext<'_>) -> Result<Layer, ViewerError> {
        let LayerConfig::RasterTiles(config) = config else {
            return Err(mismatch(self.kind(), config).into());
        };
        Self::check(config)?;
        Ok(Layer {
            name: config.name.clone(),
            kind: self.kind(),
            source: LayerSource::Tiles {
                url_template: config.url_template.clone(),
                min_zoom: config.min_zoom,
                max_zoom: config.max_zoom,
                attribution: config.attribution.clone(),
            },
            opacity: config.opacity,
            visible: config.visible,
            extent: None,
        })
    }
}

#[derive(Debug, Default)]
pub struct WmsBuilder;

impl WmsBuilder {
    fn check(config: &WmsConfig) -> Result<(), ConfigError> {
        check_common(&config.name, &config.url, config.opacity)?;
        if config.layers.is_empty() || config.layers.iter().any(|l| l.trim().is_empty()) {
            return Err(invalid(&config.name, "no WMS layers requested"));
        }
        if !config.format.starts_with("image/") {
            return Err(invalid(
                &config.name,
                format!("format {} is not an image type", config.format),
            ));
        }
        Ok(())
    }
}

impl LayerBuilder for WmsBuilder {
    fn kind(&self) -> LayerKind {
        LayerKind::Wms
    }

    fn build(&self, config: &LayerConfig, context: &LayerContext<'_>) -> Result<Layer, ViewerError> {
        let LayerConfig::Wms(config) = config else {
            return Err(mismatch(self.kind(), config).into());
        };
        Self::check(config)?;
        let extent = config
            .extent
            .as_ref()
            .map(|extent| normalize_extent(extent, context.adapter, context.runtime))
            .transpose()?;
        Ok(Layer {
            name: config.name.clone(),
            kind: self.kind(),
            source: LayerSource::Wms {
                endpoint: config.url.clone(),
                layers: config.layers.clone(),
                format: config.format.clone(),
                transparent: config.transparent,
            },
            opacity: config.opacity,
            visible: config.visible,
            extent,
        })
    }
}

#[derive(Debug, Default)]
pub struct VectorBuilder;

impl LayerBuilder for VectorBuilder {
    fn kind(&self) -> LayerKind {
        LayerKind::Vector
    }

    fn build(&self, config: &LayerConfig, _context: &LayerContext<'_>) -> Result<Layer, ViewerError> {
        let LayerConfig::Vector(VectorConfig {
            name,
            url,
            style,
            opacity,
            visible,
        }) = config
        else {
            return Err(mismatch(self.kind(), config).into());
        };
        check_common(name, url, *opacity)?;
        Ok(Layer {
            name: name.clone(),
            kind: self.kind(),
            source: LayerSource::Vector {
                url: url.clone(),
                style: style.clone(),
            },
            opacity: *opacity,
            visible: *visible,
            extent: None,
        })
    }
}

#[derive(Debug, Default)]
pub struct ElevationBuilder;

impl LayerBuilder for ElevationBuilder {
    fn kind(&self) -> LayerKind {
        LayerKind::Elevation
    }

    fn build(&self, config: &LayerConfig, _context: &LayerContext<'_>) -> Result<Layer, ViewerError> {
        let LayerConfig::Elevation(ElevationConfig {
            name,
            url,
            exaggeration,
        }) = config
        else {
            return Err(mismatch(self.kind(), config).into());
        };
        check_common(name, url, 1.0)?;
        if !(exaggeration.is_finite() && *exaggeration > 0.0) {
            return Err(invalid(name, format!("exaggeration {exaggeration} must be positive")).into());
        }
        Ok(Layer {
            name: name.clone(),
            kind: self.kind(),
            source: LayerSource::Elevation {
                url: url.clone(),
                exaggeration: *exaggeration,
            },
            opacity: 1.0,
            visible: true,
            extent: None,
        })
    }
}

/// Builders keyed by the kind they handle
#[derive(Debug, Default)]
pub struct LayerRegistry {
    builders: BTreeMap<LayerKind, Box<dyn LayerBuilder>>,
}

impl LayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with a builder for every kind
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(RasterTilesBuilder);
        registry.register(WmsBuilder);
        registry.register(VectorBuilder);
        registry.register(ElevationBuilder);
        registry
    }

    /// Install a builder, replacing any previous one for its kind
    pub fn register(&mut self, builder: impl LayerBuilder + 'static) {
        let kind = builder.kind();
        debug!(%kind, "Registered layer builder");
        self.builders.insert(kind, Box::new(builder));
    }

    pub fn is_registered(&self, kind: LayerKind) -> bool {
        self.builders.contains_key(&kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = LayerKind> + '_ {
        self.builders.keys().copied()
    }

    pub fn build(&self, config: &LayerConfig, context: &LayerContext<'_>) -> Result<Layer, ViewerError> {
        let kind = config.kind();
        let builder = self
            .builders
            .get(&kind)
            .ok_or_else(|| ConfigError::UnknownLayerKind(kind.to_string()))?;
        builder.build(config, context)
    }
}
