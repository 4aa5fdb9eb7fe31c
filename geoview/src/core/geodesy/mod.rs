//! Geodetic math kernel
//!
//! Pure, stateless conversions between geographic coordinates, Earth-centered
//! Earth-fixed (ECEF) cartesian coordinates and local East-North-Up (ENU)
//! tangent planes. Geographic ⇄ projected conversions are not done here; they
//! go through an injected [`crate::core::projection::Projection`].
//!
//! The primary correctness oracle is the round trip
//! `ecef_to_geodetic(geodetic_to_ecef(p)) == p` for non-polar inputs.

mod ellipsoid;
mod types;

pub use ellipsoid::Ellipsoid;
pub use types::{Checked, DegeneracyReason, GeographicPoint, Reliability};

use glam::{DMat3, DVec3};

/// Latitude (degrees) beyond which the geodetic inversion is flagged unreliable
pub const POLAR_LATITUDE_LIMIT: f64 = 89.9;

const MAX_REFINEMENT_STEPS: usize = 8;
const LATITUDE_TOLERANCE_RAD: f64 = 1e-14;

impl Ellipsoid {
    /// Geographic → ECEF using the closed-form ellipsoidal formula
    pub fn geodetic_to_ecef(&self, point: &GeographicPoint) -> DVec3 {
        let lat = point.latitude.to_radians();
        let lon = point.longitude.to_radians();
        let (sin_lat, cos_lat) = lat.sin_cos();
        let (sin_lon, cos_lon) = lon.sin_cos();

        let n = self.prime_vertical_radius(lat);
        let h = point.height;

        DVec3::new(
            (n + h) * cos_lat * cos_lon,
            (n + h) * cos_lat * sin_lon,
            (n * (1.0 - self.eccentricity_squared()) + h) * sin_lat,
        )
    }

    /// ECEF → geographic
    ///
    /// Bowring's parametric-latitude estimate followed by fixed-point
    /// refinement. Results within 0.1° of a pole are flagged unreliable;
    /// the poles themselves are not special-cased beyond that.
    pub fn ecef_to_geodetic(&self, ecef: DVec3) -> Checked<GeographicPoint> {
        if !ecef.is_finite() {
            return Checked::unreliable(
                GeographicPoint::new(f64::NAN, f64::NAN, f64::NAN),
                DegeneracyReason::NonFinite,
            );
        }

        let a = self.semi_major_axis;
        let b = self.semi_minor_axis();
        let e2 = self.eccentricity_squared();
        let ep2 = self.second_eccentricity_squared();

        let p = ecef.x.hypot(ecef.y);
        let lon = ecef.y.atan2(ecef.x);

        // On the rotation axis longitude is undefined
        if p < 1e-9 {
            let latitude = if ecef.z >= 0.0 { 90.0 } else { -90.0 };
            return Checked::unreliable(
                GeographicPoint::new(latitude, lon.to_degrees(), ecef.z.abs() - b),
                DegeneracyReason::NearPole,
            );
        }

        let theta = (ecef.z * a).atan2(p * b);
        let (sin_theta, cos_theta) = theta.sin_cos();
        let mut lat = (ecef.z + ep2 * b * sin_theta.powi(3))
            .atan2(p - e2 * a * cos_theta.powi(3));

        let mut converged = false;
        for _ in 0..MAX_REFINEMENT_STEPS {
            let n = self.prime_vertical_radius(lat);
            let next = (ecef.z + e2 * n * lat.sin()).atan2(p);
            let delta = (next - lat).abs();
            lat = next;
            if delta < LATITUDE_TOLERANCE_RAD {
                converged = true;
                break;
            }
        }

        let (sin_lat, cos_lat) = lat.sin_cos();
        let height = p * cos_lat + ecef.z * sin_lat
            - a * (1.0 - e2 * sin_lat * sin_lat).sqrt();

        let point = GeographicPoint::new(lat.to_degrees(), lon.to_degrees(), height);
        if !point.latitude.is_finite() || !point.height.is_finite() {
            Checked::unreliable(point, DegeneracyReason::NonFinite)
        } else if point.latitude.abs() > POLAR_LATITUDE_LIMIT {
            Checked::unreliable(point, DegeneracyReason::NearPole)
        } else if !converged {
            Checked::unreliable(point, DegeneracyReason::NotConverged)
        } else {
            Checked::reliable(point)
        }
    }
}

/// Geographic → ECEF on WGS84
pub fn geodetic_to_ecef(point: &GeographicPoint) -> DVec3 {
    Ellipsoid::WGS84.geodetic_to_ecef(point)
}

/// ECEF → geographic on WGS84
pub fn ecef_to_geodetic(ecef: DVec3) -> Checked<GeographicPoint> {
    Ellipsoid::WGS84.ecef_to_geodetic(ecef)
}

/// Rotation taking ENU vectors at the given origin into ECEF vectors
///
/// Columns are the east, north and up unit vectors expressed in ECEF.
pub fn enu_to_ecef_rotation(origin_latitude: f64, origin_longitude: f64) -> DMat3 {
    let (sin_lat, cos_lat) = origin_latitude.to_radians().sin_cos();
    let (sin_lon, cos_lon) = origin_longitude.to_radians().sin_cos();

    let east = DVec3::new(-sin_lon, cos_lon, 0.0);
    let north = DVec3::new(-sin_lat * cos_lon, -sin_lat * sin_lon, cos_lat);
    let up = DVec3::new(cos_lat * cos_lon, cos_lat * sin_lon, sin_lat);

    DMat3::from_cols(east, north, up)
}

/// ECEF → ENU relative to an origin
///
/// The rotation is parameterized by the origin's latitude/longitude, not
/// the target point's.
pub fn ecef_to_enu(
    ecef: DVec3,
    origin_ecef: DVec3,
    origin_latitude: f64,
    origin_longitude: f64,
) -> DVec3 {
    enu_to_ecef_rotation(origin_latitude, origin_longitude).transpose() * (ecef - origin_ecef)
}

/// ENU → ECEF relative to an origin (transpose of [`ecef_to_enu`])
pub fn enu_to_ecef(
    enu: DVec3,
    origin_ecef: DVec3,
    origin_latitude: f64,
    origin_longitude: f64,
) -> DVec3 {
    origin_ecef + enu_to_ecef_rotation(origin_latitude, origin_longitude) * enu
}

/// Rotation mapping ENU vectors at `from` into ENU vectors at `to`
pub fn tangent_plane_rotation(from: &GeographicPoint, to: &GeographicPoint) -> DMat3 {
    enu_to_ecef_rotation(to.latitude, to.longitude).transpose()
        * enu_to_ecef_rotation(from.latitude, from.longitude)
}
