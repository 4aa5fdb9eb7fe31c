//! Transverse Mercator using the 6th-order Krüger series
//!
//! Accurate to well below a millimetre within a few thousand kilometres of
//! the central meridian, which covers UTM zones with a wide margin.

use super::Projection;
use crate::core::geodesy::{Checked, DegeneracyReason, Ellipsoid, GeographicPoint};
use glam::DVec2;

/// Longitude distance from the central meridian (degrees) beyond which
/// results are flagged as outside the projection's domain
const DOMAIN_HALF_WIDTH_DEG: f64 = 40.0;
const INVERSE_TOLERANCE: f64 = 1e-12;
const INVERSE_MAX_STEPS: usize = 10;

/// Parameters of a Transverse Mercator projection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransverseMercatorParams {
    /// Latitude of origin in degrees
    pub latitude_of_origin: f64,
    /// Central meridian in degrees
    pub central_meridian: f64,
    /// Scale factor on the central meridian
    pub scale_factor: f64,
    /// False easting in metres
    pub false_easting: f64,
    /// False northing in metres
    pub false_northing: f64,
}

impl TransverseMercatorParams {
    /// Parameters of a UTM zone
    pub fn utm(zone: u8, south: bool) -> Self {
        Self {
            latitude_of_origin: 0.0,
            central_meridian: f64::from(zone) * 6.0 - 183.0,
            scale_factor: 0.9996,
            false_easting: 500_000.0,
            false_northing: if south { 10_000_000.0 } else { 0.0 },
        }
    }
}

/// Transverse Mercator projection on an ellipsoid
#[derive(Debug, Clone)]
pub struct TransverseMercator {
    params: TransverseMercatorParams,
    ellipsoid: Ellipsoid,
    eccentricity: f64,
    /// Rectifying radius A
    rectifying_radius: f64,
    alpha: [f64; 6],
    beta: [f64; 6],
    /// Conformal-sphere ξ of the latitude of origin
    xi_origin: f64,
}

impl TransverseMercator {
    pub fn new(params: TransverseMercatorParams, ellipsoid: Ellipsoid) -> Self {
        let n = ellipsoid.third_flattening();
        let n2 = n * n;
        let n3 = n2 * n;
        let n4 = n3 * n;
        let n5 = n4 * n;
        let n6 = n5 * n;

        let rectifying_radius =
            ellipsoid.semi_major_axis / (1.0 + n) * (1.0 + n2 / 4.0 + n4 / 64.0 + n6 / 256.0);

        #[rustfmt::skip]
        let alpha = [
            n / 2.0 - 2.0 * n2 / 3.0 + 5.0 * n3 / 16.0 + 41.0 * n4 / 180.0 - 127.0 * n5 / 288.0 + 7891.0 * n6 / 37800.0,
            13.0 * n2 / 48.0 - 3.0 * n3 / 5.0 + 557.0 * n4 / 1440.0 + 281.0 * n5 / 630.0 - 1_983_433.0 * n6 / 1_935_360.0,
            61.0 * n3 / 240.0 - 103.0 * n4 / 140.0 + 15061.0 * n5 / 26880.0 + 167_603.0 * n6 / 181_440.0,
            49561.0 * n4 / 161_280.0 - 179.0 * n5 / 168.0 + 6_601_661.0 * n6 / 7_257_600.0,
            34729.0 * n5 / 80640.0 - 3_418_889.0 * n6 / 1_995_840.0,
            212_378_941.0 * n6 / 319_334_400.0,
        ];

        #[rustfmt::skip]
        let beta = [
            n / 2.0 - 2.0 * n2 / 3.0 + 37.0 * n3 / 96.0 - n4 / 360.0 - 81.0 * n5 / 512.0 + 96199.0 * n6 / 604_800.0,
            n2 / 48.0 + n3 / 15.0 - 437.0 * n4 / 1440.0 + 46.0 * n5 / 105.0 - 1_118_711.0 * n6 / 3_870_720.0,
            17.0 * n3 / 480.0 - 37.0 * n4 / 840.0 - 209.0 * n5 / 4480.0 + 5569.0 * n6 / 90720.0,
            4397.0 * n4 / 161_280.0 - 11.0 * n5 / 504.0 - 830_251.0 * n6 / 7_257_600.0,
            4583.0 * n5 / 161_280.0 - 108_847.0 * n6 / 3_991_680.0,
            20_648_693.0 * n6 / 638_668_800.0,
        ];

        let mut projection = Self {
            params,
            ellipsoid,
            eccentricity: ellipsoid.eccentricity_squared().sqrt(),
            rectifying_radius,
            alpha,
            beta,
            xi_origin: 0.0,
        };
        projection.xi_origin = projection
            .gauss_kruger(params.latitude_of_origin.to_radians(), 0.0)
            .x;
        projection
    }

    pub fn params(&self) -> &TransverseMercatorParams {
        &self.params
    }

    /// τ' = tan of the conformal latitude for τ = tan φ
    fn conformal_tau(&self, tau: f64) -> f64 {
        let e = self.eccentricity;
        let sigma = (e * (e * tau / (1.0 + tau * tau).sqrt()).atanh()).sinh();
        tau * (1.0 + sigma * sigma).sqrt() - sigma * (1.0 + tau * tau).sqrt()
    }

    /// Returns (ξ, η) on the unit rectifying sphere
    fn gauss_kruger(&self, phi: f64, lambda: f64) -> DVec2 {
        let tau_prime = self.conformal_tau(phi.tan());
        let cos_lambda = lambda.cos();

        let xi_prime = tau_prime.atan2(cos_lambda);
        let eta_prime =
            (lambda.sin() / (tau_prime * tau_prime + cos_lambda * cos_lambda).sqrt()).asinh();

        let mut xi = xi_prime;
        let mut eta = eta_prime;
        for (index, alpha) in self.alpha.iter().enumerate() {
            let k = 2.0 * (index + 1) as f64;
            xi += alpha * (k * xi_prime).sin() * (k * eta_prime).cosh();
            eta += alpha * (k * xi_prime).cos() * (k * eta_prime).sinh();
        }
        DVec2::new(xi, eta)
    }
}

impl Projection for TransverseMercator {
    fn name(&self) -> &'static str {
        "tmerc"
    }

    fn ellipsoid(&self) -> Ellipsoid {
        self.ellipsoid
    }

    fn is_metric(&self) -> bool {
        true
    }

    fn forward(&self, point: &GeographicPoint) -> Checked<DVec2> {
        let delta_lon = normalize_longitude(point.longitude - self.params.central_meridian);
        let phi = point.latitude.to_radians();
        let lambda = delta_lon.to_radians();

        let k = self.params.scale_factor * self.rectifying_radius;
        let xi_eta = self.gauss_kruger(phi, lambda);
        let projected = DVec2::new(
            self.params.false_easting + k * xi_eta.y,
            self.params.false_northing + k * (xi_eta.x - self.xi_origin),
        );

        if !projected.is_finite() {
            Checked::unreliable(projected, DegeneracyReason::NonFinite)
        } else if delta_lon.abs() > DOMAIN_HALF_WIDTH_DEG {
            Checked::unreliable(projected, DegeneracyReason::OutsideProjectionDomain)
        } else {
            Checked::reliable(projected)
        }
    }

    fn inverse(&self, projected: DVec2) -> Checked<GeographicPoint> {
        let k = self.params.scale_factor * self.rectifying_radius;
        let eta = (projected.x - self.params.false_easting) / k;
        let xi = (projected.y - self.params.false_northing) / k + self.xi_origin;

        let mut xi_prime = xi;
        let mut eta_prime = eta;
        for (index, beta) in self.beta.iter().enumerate() {
            let j = 2.0 * (index + 1) as f64;
            xi_prime -= beta * (j * xi).sin() * (j * eta).cosh();
            eta_prime -= beta * (j * xi).cos() * (j * eta).sinh();
        }

        let sinh_eta = eta_prime.sinh();
        let (sin_xi, cos_xi) = xi_prime.sin_cos();
        let tau_prime = sin_xi / (sinh_eta * sinh_eta + cos_xi * cos_xi).sqrt();

        // Newton iteration for τ from τ'
        let e2 = self.ellipsoid.eccentricity_squared();
        let mut tau = tau_prime;
        let mut converged = false;
        for _ in 0..INVERSE_MAX_STEPS {
            let tau_i_prime = self.conformal_tau(tau);
            let delta = (tau_prime - tau_i_prime) / (1.0 + tau_i_prime * tau_i_prime).sqrt()
                * (1.0 + (1.0 - e2) * tau * tau)
                / ((1.0 - e2) * (1.0 + tau * tau).sqrt());
            tau += delta;
            if delta.abs() < INVERSE_TOLERANCE {
                converged = true;
                break;
            }
        }

        let delta_lon = sinh_eta.atan2(cos_xi).to_degrees();
        let point = GeographicPoint::new(
            tau.atan().to_degrees(),
            normalize_longitude(self.params.central_meridian + delta_lon),
            0.0,
        );

        if !point.latitude.is_finite() || !point.longitude.is_finite() {
            Checked::unreliable(point, DegeneracyReason::NonFinite)
        } else if !converged {
            Checked::unreliable(point, DegeneracyReason::NotConverged)
        } else if delta_lon.abs() > DOMAIN_HALF_WIDTH_DEG {
            Checked::unreliable(point, DegeneracyReason::OutsideProjectionDomain)
        } else {
            Checked::reliable(point)
        }
    }

    fn grid_convergence(&self, point: &GeographicPoint) -> f64 {
        let delta_lon = normalize_longitude(point.longitude - self.params.central_meridian);
        (delta_lon.to_radians().tan() * point.latitude.to_radians().sin())
            .atan()
            .to_degrees()
    }
}

/// Wrap a longitude difference into [-180, 180]
pub(crate) fn normalize_longitude(longitude: f64) -> f64 {
    if (-180.0..=180.0).contains(&longitude) {
        longitude
    } else {
        (longitude + 180.0).rem_euclid(360.0) - 180.0
    }
}
