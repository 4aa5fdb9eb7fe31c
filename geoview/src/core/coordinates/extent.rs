//! Rectangular extents and their normalization to the active reference system

use super::adapter::CoordinateAdapter;
use crate::core::geodesy::GeographicPoint;
use crate::core::projection::{normalize_code, Projection};
use crate::error::{ConfigError, ViewerError};
use crate::runtime::Runtime;
use glam::DVec2;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Edge subdivisions used when reprojecting an extent
const EDGE_SUBDIVISIONS: usize = 8;

/// Axis-aligned rectangle in some reference system
///
/// For geographic extents x is longitude and y is latitude, in degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
    /// Reference system the numbers are in; when absent it is inferred
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_system: Option<String>,
}

impl Extent {
    pub fn new(min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> Self {
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
            reference_system: None,
        }
    }

    pub fn with_reference_system(mut self, code: impl Into<String>) -> Self {
        self.reference_system = Some(code.into());
        self
    }

    /// Smallest extent containing all points; `None` for an empty input
    pub fn from_points(points: impl IntoIterator<Item = DVec2>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let (min, max) = points.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Some(Self::new(min.x, max.x, min.y, max.y))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let values = [self.min_x, self.max_x, self.min_y, self.max_y];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ConfigError::InvalidExtent("non-finite bound".to_string()));
        }
        if self.min_x > self.max_x || self.min_y > self.max_y {
            return Err(ConfigError::InvalidExtent(format!(
                "min exceeds max in [{}, {}] x [{}, {}]",
                self.min_x, self.max_x, self.min_y, self.max_y
            )));
        }
        Ok(())
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn min(&self) -> DVec2 {
        DVec2::new(self.min_x, self.min_y)
    }

    pub fn max(&self) -> DVec2 {
        DVec2::new(self.max_x, self.max_y)
    }

    pub fn center(&self) -> DVec2 {
        (self.min() + self.max()) * 0.5
    }

    pub fn contains(&self, point: DVec2) -> bool {
        point.x >= self.min_x && point.x <= self.max_x && point.y >= self.min_y && point.y <= self.max_y
    }

    pub fn intersects(&self, other: &Extent) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    /// Whether the numbers fit in longitude/latitude ranges
    pub fn looks_geographic(&self) -> bool {
        self.min_x >= -180.0 && self.max_x <= 180.0 && self.min_y >= -90.0 && self.max_y <= 90.0
    }

    /// Whether an untagged extent should be read as degrees under `projection`
    pub fn is_geographic(&self, projection: &dyn Projection) -> bool {
        !projection.is_metric() || self.looks_geographic()
    }

    /// Points along all four edges, corners included
    fn edge_samples(&self) -> Vec<DVec2> {
        let mut samples = Vec::with_capacity(EDGE_SUBDIVISIONS * 4);
        for i in 0..EDGE_SUBDIVISIONS {
            let t = i as f64 / EDGE_SUBDIVISIONS as f64;
            let x = self.min_x + t * self.width();
            let y = self.min_y + t * self.height();
            samples.push(DVec2::new(x, self.min_y));
            samples.push(DVec2::new(self.max_x, y));
            samples.push(DVec2::new(self.max_x - t * self.width(), self.max_y));
            samples.push(DVec2::new(self.min_x, self.max_y - t * self.height()));
        }
        samples
    }
}

/// Express an extent in the adapter's reference system
///
/// A tagged extent is reprojected from its own reference system. An untagged
/// extent whose numbers look like degrees is treated as geographic when the
/// active system is metric; anything else is passed through unchanged.
pub fn normalize_extent(
    extent: &Extent,
    adapter: &CoordinateAdapter,
    runtime: &Runtime,
) -> Result<Extent, ViewerError> {
    extent.validate()?;
    let target_code = adapter.code()?.to_string();
    let target = adapter.projection()?;

    let normalized = match &extent.reference_system {
        Some(code) if normalize_code(code) == target_code => extent.clone(),
        Some(code) => {
            let source = runtime.projection_for(code)?;
            if !source.is_metric() && !target.is_metric() {
                extent.clone()
            } else if !source.is_metric() {
                reproject(extent, |p| GeographicPoint::new(p.y, p.x, 0.0), target)?
            } else {
                reproject(extent, |p| source.inverse(p).value, target)?
            }
        }
        None if target.is_metric() && extent.looks_geographic() => {
            debug!(?extent, code = %target_code, "Extent looks geographic; converting");
            reproject(extent, |p| GeographicPoint::new(p.y, p.x, 0.0), target)?
        }
        None => extent.clone(),
    };

    Ok(normalized.with_reference_system(target_code))
}

fn reproject(
    extent: &Extent,
    to_geographic: impl Fn(DVec2) -> GeographicPoint,
    target: &dyn Projection,
) -> Result<Extent, ConfigError> {
    let mut unreliable = 0usize;
    let projected: Vec<DVec2> = extent
        .edge_samples()
        .into_iter()
        .map(|sample| {
            let converted = target.forward(&to_geographic(sample));
            if !converted.is_reliable() {
                unreliable += 1;
            }
            converted.value
        })
        .collect();

    if projected.iter().any(|p| !p.is_finite()) {
        return Err(ConfigError::InvalidExtent(
            "extent cannot be expressed in the active reference system".to_string(),
        ));
    }
    if unreliable > 0 {
        warn!(
            unreliable,
            samples = projected.len(),
            "Extent reaches outside the projection's accurate domain"
        );
    }

    Extent::from_points(projected)
        .ok_or_else(|| ConfigError::InvalidExtent("empty extent".to_string()))
}
