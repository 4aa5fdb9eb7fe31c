//! Map layers
//!
//! Layer kinds form a closed set; each carries its own typed configuration
//! and is turned into a [`Layer`] by the builder registered for its kind.

mod config;
mod registry;

pub use config::{
    ElevationConfig, LayerConfig, LayerKind, RasterTilesConfig, VectorConfig, WmsConfig,
};
pub use registry::{
    ElevationBuilder, Layer, LayerBuilder, LayerContext, LayerId, LayerRegistry, LayerSource,
    RasterTilesBuilder, VectorBuilder, WmsBuilder,
};
