//! Projection engine backed by the PROJ library
//!
//! Covers every projection PROJ knows (somerc, lcc, ...), at the cost of a
//! C dependency on libproj. Geographic coordinates are always WGS84; PROJ
//! applies any datum shift carried by the definition.

use super::{Projection, ProjectionEngine};
use crate::core::geodesy::{Checked, DegeneracyReason, Ellipsoid, GeographicPoint};
use crate::error::ProjectionError;
use glam::DVec2;
use proj::Proj;
use std::fmt;
use tracing::{debug, trace};

const GEOGRAPHIC_CRS: &str = "EPSG:4326";

/// Latitude step (degrees) used to measure grid convergence
const CONVERGENCE_STEP_DEG: f64 = 1e-4;

/// Engine creating a PROJ transformer pair per definition
#[derive(Debug, Default, Clone, Copy)]
pub struct ProjProjectionEngine;

impl ProjectionEngine for ProjProjectionEngine {
    fn create(&self, definition: &str) -> Result<Box<dyn Projection>, ProjectionError> {
        let target = as_crs(definition);
        let forward = Proj::new_known_crs(GEOGRAPHIC_CRS, &target, None)
            .map_err(|e| ProjectionError::Backend(e.to_string()))?;
        let inverse = Proj::new_known_crs(&target, GEOGRAPHIC_CRS, None)
            .map_err(|e| ProjectionError::Backend(e.to_string()))?;

        debug!(definition, "PROJ transformer created");
        Ok(Box::new(ProjProjection {
            name: family(definition),
            metric: is_metric_definition(definition),
            definition: definition.trim().to_string(),
            forward,
            inverse,
        }))
    }
}

pub struct ProjProjection {
    name: &'static str,
    metric: bool,
    definition: String,
    forward: Proj,
    inverse: Proj,
}

impl fmt::Debug for ProjProjection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProjProjection")
            .field("name", &self.name)
            .field("definition", &self.definition)
            .finish_non_exhaustive()
    }
}

impl Projection for ProjProjection {
    fn name(&self) -> &'static str {
        self.name
    }

    fn ellipsoid(&self) -> Ellipsoid {
        Ellipsoid::WGS84
    }

    fn is_metric(&self) -> bool {
        self.metric
    }

    fn forward(&self, point: &GeographicPoint) -> Checked<DVec2> {
        // Transformers are normalized to (lon, lat) order
        match self.forward.convert((point.longitude, point.latitude)) {
            Ok((x, y)) if x.is_finite() && y.is_finite() => Checked::reliable(DVec2::new(x, y)),
            Ok((x, y)) => Checked::unreliable(DVec2::new(x, y), DegeneracyReason::NonFinite),
            Err(error) => {
                trace!(%error, point = %point, "PROJ forward failed");
                Checked::unreliable(DVec2::NAN, DegeneracyReason::OutsideProjectionDomain)
            }
        }
    }

    fn inverse(&self, projected: DVec2) -> Checked<GeographicPoint> {
        match self.inverse.convert((projected.x, projected.y)) {
            Ok((longitude, latitude)) => {
                let point = GeographicPoint::new(latitude, longitude, 0.0);
                if point.is_valid() {
                    Checked::reliable(point)
                } else {
                    Checked::unreliable(point, DegeneracyReason::OutsideProjectionDomain)
                }
            }
            Err(error) => {
                trace!(%error, x = projected.x, y = projected.y, "PROJ inverse failed");
                Checked::unreliable(
                    GeographicPoint::new(f64::NAN, f64::NAN, 0.0),
                    DegeneracyReason::OutsideProjectionDomain,
                )
            }
        }
    }

    fn grid_convergence(&self, point: &GeographicPoint) -> f64 {
        if !self.metric {
            return 0.0;
        }
        let north = GeographicPoint::new(point.latitude + CONVERGENCE_STEP_DEG, point.longitude, 0.0);
        let (here, there) = (self.forward(point), self.forward(&north));
        if !here.is_reliable() || !there.is_reliable() {
            return 0.0;
        }
        let step = there.value - here.value;
        (-step.x).atan2(step.y).to_degrees()
    }
}

/// PROJ only builds CRS-to-CRS transformers from strings marked as a CRS
fn as_crs(definition: &str) -> String {
    let definition = definition.trim();
    if definition.starts_with('+') && !definition.contains("+type=crs") {
        format!("{definition} +type=crs")
    } else {
        definition.to_string()
    }
}

fn proj_param(definition: &str, key: &str) -> Option<String> {
    definition.split_whitespace().find_map(|token| {
        let (name, value) = token.strip_prefix('+')?.split_once('=')?;
        (name == key).then(|| value.to_string())
    })
}

fn family(definition: &str) -> &'static str {
    match proj_param(definition, "proj").as_deref() {
        Some("utm" | "tmerc") => "tmerc",
        Some("merc") => "merc",
        Some("longlat" | "latlong" | "lonlat" | "latlon") => "longlat",
        Some("somerc") => "somerc",
        Some("lcc") => "lcc",
        Some("stere" | "sterea") => "stere",
        Some("laea") => "laea",
        _ => "proj",
    }
}

fn is_metric_definition(definition: &str) -> bool {
    let geographic = matches!(
        proj_param(definition, "proj").as_deref(),
        Some("longlat" | "latlong" | "lonlat" | "latlon")
    );
    let metres = proj_param(definition, "units").map_or(true, |units| units == "m");
    !geographic && metres
}
