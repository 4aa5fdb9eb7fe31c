//! PROJ-style definition strings
//!
//! Only the subset needed for metric map projections is understood:
//! `+proj=utm|tmerc|merc|longlat` with the usual ellipsoid and false-origin
//! parameters. Unknown flags (`+no_defs`, `+wktext`, `+towgs84=...`) are ignored.

use super::mercator::MercatorParams;
use super::transverse_mercator::TransverseMercatorParams;
use crate::core::geodesy::Ellipsoid;
use crate::error::ProjectionError;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Projection family with its parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProjectionKind {
    /// Plain geographic coordinates, x = longitude, y = latitude (degrees)
    LongLat,
    TransverseMercator(TransverseMercatorParams),
    Mercator(MercatorParams),
}

/// A parsed projection definition
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionDefinition {
    pub kind: ProjectionKind,
    pub ellipsoid: Ellipsoid,
    source: String,
}

impl ProjectionDefinition {
    /// Parse a `+key=value` definition string
    pub fn parse(definition: &str) -> Result<Self, ProjectionError> {
        let params = tokenize(definition);

        let proj = params
            .get("proj")
            .and_then(|value| value.as_deref())
            .ok_or(ProjectionError::MissingProjection)?;

        if let Some(Some(units)) = params.get("units") {
            if units != "m" {
                return Err(ProjectionError::UnsupportedUnits(units.clone()));
            }
        }

        let ellipsoid = parse_ellipsoid(&params)?;

        let kind = match proj {
            "longlat" | "latlong" | "lonlat" | "latlon" => ProjectionKind::LongLat,
            "utm" => {
                let zone = float_param(&params, "zone")?
                    .ok_or_else(|| ProjectionError::InvalidParameter {
                        key: "zone".to_string(),
                        value: String::new(),
                    })?;
                if zone.fract() != 0.0 || !(1.0..=60.0).contains(&zone) {
                    return Err(ProjectionError::InvalidZone(zone as i64));
                }
                let south = params.contains_key("south");
                ProjectionKind::TransverseMercator(TransverseMercatorParams::utm(zone as u8, south))
            }
            "tmerc" => ProjectionKind::TransverseMercator(TransverseMercatorParams {
                latitude_of_origin: float_param(&params, "lat_0")?.unwrap_or(0.0),
                central_meridian: float_param(&params, "lon_0")?.unwrap_or(0.0),
                scale_factor: scale_param(&params)?.unwrap_or(1.0),
                false_easting: float_param(&params, "x_0")?.unwrap_or(0.0),
                false_northing: float_param(&params, "y_0")?.unwrap_or(0.0),
            }),
            "merc" => ProjectionKind::Mercator(MercatorParams {
                central_meridian: float_param(&params, "lon_0")?.unwrap_or(0.0),
                latitude_of_true_scale: float_param(&params, "lat_ts")?.unwrap_or(0.0),
                scale_factor: scale_param(&params)?.unwrap_or(1.0),
                false_easting: float_param(&params, "x_0")?.unwrap_or(0.0),
                false_northing: float_param(&params, "y_0")?.unwrap_or(0.0),
            }),
            other => return Err(ProjectionError::UnsupportedProjection(other.to_string())),
        };

        Ok(Self {
            kind,
            ellipsoid,
            source: definition.trim().to_string(),
        })
    }

    /// The definition string this was parsed from
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether projected coordinates are in metres
    pub fn is_metric(&self) -> bool {
        !matches!(self.kind, ProjectionKind::LongLat)
    }
}

impl FromStr for ProjectionDefinition {
    type Err = ProjectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ProjectionDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Collapse whitespace so equivalent definitions compare equal
pub fn canonicalize(definition: &str) -> String {
    definition.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn tokenize(definition: &str) -> HashMap<String, Option<String>> {
    definition
        .split_whitespace()
        .filter_map(|token| {
            let token = token.strip_prefix('+')?;
            Some(match token.split_once('=') {
                Some((key, value)) => (key.to_string(), Some(value.to_string())),
                None => (token.to_string(), None),
            })
        })
        .collect()
}

fn float_param(
    params: &HashMap<String, Option<String>>,
    key: &str,
) -> Result<Option<f64>, ProjectionError> {
    match params.get(key) {
        None => Ok(None),
        Some(value) => {
            let raw = value.as_deref().unwrap_or_default();
            raw.parse::<f64>()
                .ok()
                .filter(|parsed| parsed.is_finite())
                .map(Some)
                .ok_or_else(|| ProjectionError::InvalidParameter {
                    key: key.to_string(),
                    value: raw.to_string(),
                })
        }
    }
}

fn scale_param(params: &HashMap<String, Option<String>>) -> Result<Option<f64>, ProjectionError> {
    match float_param(params, "k_0")? {
        Some(k) => Ok(Some(k)),
        None => float_param(params, "k"),
    }
}

fn parse_ellipsoid(params: &HashMap<String, Option<String>>) -> Result<Ellipsoid, ProjectionError> {
    if let Some(a) = float_param(params, "a")? {
        if let Some(b) = float_param(params, "b")? {
            return Ok(Ellipsoid::from_axes(a, b));
        }
        if let Some(rf) = float_param(params, "rf")? {
            return Ok(Ellipsoid::from_inverse_flattening(a, rf));
        }
        // +a alone describes a sphere
        return Ok(Ellipsoid::from_axes(a, a));
    }

    for key in ["ellps", "datum"] {
        if let Some(Some(name)) = params.get(key) {
            return Ellipsoid::by_name(name)
                .ok_or_else(|| ProjectionError::UnknownEllipsoid(name.clone()));
        }
    }

    Ok(Ellipsoid::WGS84)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_utm() {
        let definition =
            ProjectionDefinition::parse("+proj=utm +zone=33 +datum=WGS84 +units=m +no_defs")
                .unwrap();
        match definition.kind {
            ProjectionKind::TransverseMercator(params) => {
                assert_eq!(params.central_meridian, 15.0);
                assert_eq!(params.scale_factor, 0.9996);
                assert_eq!(params.false_northing, 0.0);
            }
            other => panic!("unexpected kind {other:?}"),
        }
        assert_eq!(definition.ellipsoid, Ellipsoid::WGS84);
        assert!(definition.is_metric());
    }

    #[test]
    fn test_parse_utm_south_grs80() {
        let definition =
            ProjectionDefinition::parse("+proj=utm +zone=56 +south +ellps=GRS80").unwrap();
        match definition.kind {
            ProjectionKind::TransverseMercator(params) => {
                assert_eq!(params.false_northing, 10_000_000.0);
                assert_eq!(params.central_meridian, 153.0);
            }
            other => panic!("unexpected kind {other:?}"),
        }
        assert_eq!(definition.ellipsoid, Ellipsoid::GRS80);
    }

    #[test]
    fn test_parse_web_mercator() {
        let definition = ProjectionDefinition::parse(
            "+proj=merc +a=6378137 +b=6378137 +lat_ts=0 +lon_0=0 +x_0=0 +y_0=0 +k=1 +units=m +nadgrids=@null +wktext +no_defs",
        )
        .unwrap();
        assert!(definition.ellipsoid.is_sphere());
        assert!(matches!(definition.kind, ProjectionKind::Mercator(_)));
    }

    #[test]
    fn test_parse_longlat_is_not_metric() {
        let definition = ProjectionDefinition::parse("+proj=longlat +datum=WGS84 +no_defs").unwrap();
        assert!(!definition.is_metric());
    }

    #[test]
    fn test_rejects_bad_definitions() {
        assert_eq!(
            ProjectionDefinition::parse("+zone=33"),
            Err(ProjectionError::MissingProjection)
        );
        assert_eq!(
            ProjectionDefinition::parse("+proj=utm +zone=61"),
            Err(ProjectionError::InvalidZone(61))
        );
        assert_eq!(
            ProjectionDefinition::parse("+proj=tmerc +units=us-ft"),
            Err(ProjectionError::UnsupportedUnits("us-ft".to_string()))
        );
        assert!(matches!(
            ProjectionDefinition::parse("+proj=lcc +lat_1=33"),
            Err(ProjectionError::UnsupportedProjection(_))
        ));
        assert!(matches!(
            ProjectionDefinition::parse("+proj=tmerc +lon_0=abc"),
            Err(ProjectionError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_canonicalize_whitespace() {
        assert_eq!(
            canonicalize("  +proj=utm   +zone=33\t+datum=WGS84 "),
            "+proj=utm +zone=33 +datum=WGS84"
        );
    }
}
