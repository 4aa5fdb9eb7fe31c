//! Map projections and the reference-system registry
//!
//! A [`ProjectionEngine`] turns a definition string into a [`Projection`].
//! The built-in engine understands transverse mercator (including UTM),
//! mercator and plain longitude/latitude. With the `proj-transforms` feature,
//! [`ProjProjectionEngine`] hands any definition to PROJ instead.

mod definition;
mod mercator;
#[cfg(feature = "proj-transforms")]
mod proj_engine;
mod registry;
mod resolver;
mod transverse_mercator;

pub use definition::{canonicalize, ProjectionDefinition, ProjectionKind};
pub use mercator::{Mercator, MercatorParams, MERCATOR_LATITUDE_LIMIT};
#[cfg(feature = "proj-transforms")]
pub use proj_engine::{ProjProjection, ProjProjectionEngine};
pub use registry::{normalize_code, well_known_definition, CrsRegistry, ReferenceSystem};
pub use resolver::{DefinitionResolver, NoRemoteResolver, StaticResolver};
pub use transverse_mercator::{TransverseMercator, TransverseMercatorParams};

use crate::core::geodesy::{Checked, DegeneracyReason, Ellipsoid, GeographicPoint};
use crate::error::ProjectionError;
use glam::DVec2;
use std::fmt;

/// Geographic ⇄ projected conversion for one reference system
///
/// Heights pass through unchanged and are not part of the projected pair.
pub trait Projection: fmt::Debug {
    /// Short PROJ name of the projection family
    fn name(&self) -> &'static str;

    fn ellipsoid(&self) -> Ellipsoid;

    /// Whether projected units are metres
    fn is_metric(&self) -> bool;

    fn forward(&self, point: &GeographicPoint) -> Checked<DVec2>;

    /// Inverse projection; the returned height is zero
    fn inverse(&self, projected: DVec2) -> Checked<GeographicPoint>;

    /// Angle in degrees from true north to grid north at a point
    fn grid_convergence(&self, point: &GeographicPoint) -> f64;
}

/// Identity "projection" for geographic reference systems
#[derive(Debug, Clone, Copy)]
pub struct LongLat {
    ellipsoid: Ellipsoid,
}

impl LongLat {
    pub fn new(ellipsoid: Ellipsoid) -> Self {
        Self { ellipsoid }
    }
}

impl Projection for LongLat {
    fn name(&self) -> &'static str {
        "longlat"
    }

    fn ellipsoid(&self) -> Ellipsoid {
        self.ellipsoid
    }

    fn is_metric(&self) -> bool {
        false
    }

    fn forward(&self, point: &GeographicPoint) -> Checked<DVec2> {
        let projected = DVec2::new(point.longitude, point.latitude);
        if projected.is_finite() {
            Checked::reliable(projected)
        } else {
            Checked::unreliable(projected, DegeneracyReason::NonFinite)
        }
    }

    fn inverse(&self, projected: DVec2) -> Checked<GeographicPoint> {
        let point = GeographicPoint::new(projected.y, projected.x, 0.0);
        if !projected.is_finite() {
            Checked::unreliable(point, DegeneracyReason::NonFinite)
        } else if !point.is_valid() {
            Checked::unreliable(point, DegeneracyReason::OutsideProjectionDomain)
        } else {
            Checked::reliable(point)
        }
    }

    fn grid_convergence(&self, _point: &GeographicPoint) -> f64 {
        0.0
    }
}

/// Factory for projections from definition strings
pub trait ProjectionEngine: fmt::Debug {
    fn create(&self, definition: &str) -> Result<Box<dyn Projection>, ProjectionError>;
}

/// Projection engine backed by the projections in this module
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinProjectionEngine;

impl ProjectionEngine for BuiltinProjectionEngine {
    fn create(&self, definition: &str) -> Result<Box<dyn Projection>, ProjectionError> {
        let parsed = ProjectionDefinition::parse(definition)?;
        Ok(match parsed.kind {
            ProjectionKind::LongLat => Box::new(LongLat::new(parsed.ellipsoid)),
            ProjectionKind::TransverseMercator(params) => {
                Box::new(TransverseMercator::new(params, parsed.ellipsoid))
            }
            ProjectionKind::Mercator(params) => Box::new(Mercator::new(params, parsed.ellipsoid)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_engine_creates_each_family() {
        let engine = BuiltinProjectionEngine;
        let utm = engine
            .create("+proj=utm +zone=33 +datum=WGS84 +units=m +no_defs")
            .unwrap();
        assert_eq!(utm.name(), "tmerc");
        assert!(utm.is_metric());

        let merc = engine.create(&well_known_definition("EPSG:3857").unwrap()).unwrap();
        assert_eq!(merc.name(), "merc");

        let longlat = engine.create("+proj=longlat +datum=WGS84").unwrap();
        assert!(!longlat.is_metric());
    }

    #[test]
    fn test_longlat_swaps_axes() {
        let projection = LongLat::new(Ellipsoid::WGS84);
        let projected = projection.forward(&GeographicPoint::new(51.0, 13.0, 5.0));
        assert_eq!(projected.value, DVec2::new(13.0, 51.0));
        let back = projection.inverse(projected.value);
        assert_eq!(back.value.latitude, 51.0);
    }

    #[test]
    fn test_engine_propagates_parse_errors() {
        let result = BuiltinProjectionEngine.create("+proj=utm");
        assert!(matches!(result, Err(ProjectionError::InvalidParameter { .. })));
    }
}
