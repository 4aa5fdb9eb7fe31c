//! Normal-aspect Mercator, spherical or ellipsoidal

use super::transverse_mercator::normalize_longitude;
use super::Projection;
use crate::core::geodesy::{Checked, DegeneracyReason, Ellipsoid, GeographicPoint};
use glam::DVec2;
use std::f64::consts::FRAC_PI_2;

/// Latitude limit of square web-mercator tiles
pub const MERCATOR_LATITUDE_LIMIT: f64 = 85.051_128_779_806_59;

const INVERSE_TOLERANCE: f64 = 1e-12;
const INVERSE_MAX_STEPS: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MercatorParams {
    pub central_meridian: f64,
    pub latitude_of_true_scale: f64,
    pub scale_factor: f64,
    pub false_easting: f64,
    pub false_northing: f64,
}

#[derive(Debug, Clone)]
pub struct Mercator {
    params: MercatorParams,
    ellipsoid: Ellipsoid,
    eccentricity: f64,
    /// a · k, with k derived from the latitude of true scale when given
    scaled_radius: f64,
}

impl Mercator {
    pub fn new(params: MercatorParams, ellipsoid: Ellipsoid) -> Self {
        let e2 = ellipsoid.eccentricity_squared();
        let sin_ts = params.latitude_of_true_scale.to_radians().sin();
        let cos_ts = params.latitude_of_true_scale.to_radians().cos();
        let true_scale = cos_ts / (1.0 - e2 * sin_ts * sin_ts).sqrt();

        Self {
            params,
            ellipsoid,
            eccentricity: e2.sqrt(),
            scaled_radius: ellipsoid.semi_major_axis * params.scale_factor * true_scale,
        }
    }

    fn isometric_latitude(&self, phi: f64) -> f64 {
        let e = self.eccentricity;
        let e_sin = e * phi.sin();
        (std::f64::consts::FRAC_PI_4 + phi / 2.0).tan().ln()
            + e / 2.0 * ((1.0 - e_sin) / (1.0 + e_sin)).ln()
    }
}

impl Projection for Mercator {
    fn name(&self) -> &'static str {
        "merc"
    }

    fn ellipsoid(&self) -> Ellipsoid {
        self.ellipsoid
    }

    fn is_metric(&self) -> bool {
        true
    }

    fn forward(&self, point: &GeographicPoint) -> Checked<DVec2> {
        let delta_lon = normalize_longitude(point.longitude - self.params.central_meridian);
        let projected = DVec2::new(
            self.params.false_easting + self.scaled_radius * delta_lon.to_radians(),
            self.params.false_northing
                + self.scaled_radius * self.isometric_latitude(point.latitude.to_radians()),
        );

        if !projected.is_finite() {
            Checked::unreliable(projected, DegeneracyReason::NonFinite)
        } else if point.latitude.abs() > MERCATOR_LATITUDE_LIMIT {
            Checked::unreliable(projected, DegeneracyReason::OutsideProjectionDomain)
        } else {
            Checked::reliable(projected)
        }
    }

    fn inverse(&self, projected: DVec2) -> Checked<GeographicPoint> {
        let e = self.eccentricity;
        let t = (-(projected.y - self.params.false_northing) / self.scaled_radius).exp();

        let mut phi = FRAC_PI_2 - 2.0 * t.atan();
        let mut converged = e == 0.0;
        if !converged {
            for _ in 0..INVERSE_MAX_STEPS {
                let e_sin = e * phi.sin();
                let next =
                    FRAC_PI_2 - 2.0 * (t * ((1.0 - e_sin) / (1.0 + e_sin)).powf(e / 2.0)).atan();
                let delta = (next - phi).abs();
                phi = next;
                if delta < INVERSE_TOLERANCE {
                    converged = true;
                    break;
                }
            }
        }

        let lambda = (projected.x - self.params.false_easting) / self.scaled_radius;
        let point = GeographicPoint::new(
            phi.to_degrees(),
            normalize_longitude(self.params.central_meridian + lambda.to_degrees()),
            0.0,
        );

        if !point.latitude.is_finite() || !point.longitude.is_finite() {
            Checked::unreliable(point, DegeneracyReason::NonFinite)
        } else if !converged {
            Checked::unreliable(point, DegeneracyReason::NotConverged)
        } else if point.latitude.abs() > MERCATOR_LATITUDE_LIMIT {
            Checked::unreliable(point, DegeneracyReason::OutsideProjectionDomain)
        } else {
            Checked::reliable(point)
        }
    }

    fn grid_convergence(&self, _point: &GeographicPoint) -> f64 {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn web_mercator() -> Mercator {
        Mercator::new(
            MercatorParams {
                central_meridian: 0.0,
                latitude_of_true_scale: 0.0,
                scale_factor: 1.0,
                false_easting: 0.0,
                false_northing: 0.0,
            },
            Ellipsoid::from_axes(6_378_137.0, 6_378_137.0),
        )
    }

    #[test]
    fn test_web_mercator_world_edge() {
        let projection = web_mercator();
        let edge = projection.forward(&GeographicPoint::new(MERCATOR_LATITUDE_LIMIT, 180.0, 0.0));
        assert!((edge.value.x - 20_037_508.342_789_244).abs() < 1e-3);
        assert!((edge.value.y - 20_037_508.342_789_244).abs() < 1e-3);
    }

    #[test]
    fn test_ellipsoidal_round_trip() {
        let projection = Mercator::new(
            MercatorParams {
                central_meridian: 10.0,
                latitude_of_true_scale: 0.0,
                scale_factor: 1.0,
                false_easting: 0.0,
                false_northing: 0.0,
            },
            Ellipsoid::WGS84,
        );
        let point = GeographicPoint::new(51.05, 13.74, 0.0);
        let back = projection.inverse(projection.forward(&point).value);
        assert!(back.is_reliable());
        assert!((back.value.latitude - point.latitude).abs() < 1e-10);
        assert!((back.value.longitude - point.longitude).abs() < 1e-10);
    }

    #[test]
    fn test_polar_latitude_is_flagged() {
        let projected = web_mercator().forward(&GeographicPoint::new(88.0, 0.0, 0.0));
        assert!(!projected.is_reliable());
    }
}
