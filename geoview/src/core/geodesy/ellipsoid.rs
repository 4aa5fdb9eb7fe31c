//! Reference ellipsoids

use serde::{Deserialize, Serialize};

/// Reference ellipsoid defined by semi-major axis and flattening
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ellipsoid {
    /// Semi-major axis in metres
    pub semi_major_axis: f64,
    /// Flattening (a - b) / a
    pub flattening: f64,
}

impl Ellipsoid {
    /// WGS84 ellipsoid
    pub const WGS84: Ellipsoid = Ellipsoid {
        semi_major_axis: 6_378_137.0,
        flattening: 1.0 / 298.257_223_563,
    };

    /// GRS80 ellipsoid (ETRS89, NAD83)
    pub const GRS80: Ellipsoid = Ellipsoid {
        semi_major_axis: 6_378_137.0,
        flattening: 1.0 / 298.257_222_101,
    };

    /// Create an ellipsoid from semi-major axis and inverse flattening
    ///
    /// An inverse flattening of zero describes a sphere.
    pub fn from_inverse_flattening(semi_major_axis: f64, inverse_flattening: f64) -> Self {
        let flattening = if inverse_flattening == 0.0 {
            0.0
        } else {
            1.0 / inverse_flattening
        };
        Self {
            semi_major_axis,
            flattening,
        }
    }

    /// Create an ellipsoid from both semi-axes
    pub fn from_axes(semi_major_axis: f64, semi_minor_axis: f64) -> Self {
        Self {
            semi_major_axis,
            flattening: (semi_major_axis - semi_minor_axis) / semi_major_axis,
        }
    }

    /// Look up an ellipsoid by its PROJ name
    pub fn by_name(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "WGS84" => Some(Self::WGS84),
            "GRS80" | "ETRS89" | "NAD83" => Some(Self::GRS80),
            _ => None,
        }
    }

    /// Semi-minor axis b = a (1 - f)
    pub fn semi_minor_axis(&self) -> f64 {
        self.semi_major_axis * (1.0 - self.flattening)
    }

    /// First eccentricity squared e² = 2f - f²
    pub fn eccentricity_squared(&self) -> f64 {
        self.flattening * (2.0 - self.flattening)
    }

    /// Second eccentricity squared e'² = e² / (1 - e²)
    pub fn second_eccentricity_squared(&self) -> f64 {
        let e2 = self.eccentricity_squared();
        e2 / (1.0 - e2)
    }

    /// Third flattening n = f / (2 - f), used by the Krüger series
    pub fn third_flattening(&self) -> f64 {
        self.flattening / (2.0 - self.flattening)
    }

    /// Radius of curvature in the prime vertical at the given latitude (radians)
    pub fn prime_vertical_radius(&self, latitude_rad: f64) -> f64 {
        let sin_lat = latitude_rad.sin();
        self.semi_major_axis / (1.0 - self.eccentricity_squared() * sin_lat * sin_lat).sqrt()
    }

    pub fn is_sphere(&self) -> bool {
        self.flattening == 0.0
    }
}

impl Default for Ellipsoid {
    fn default() -> Self {
        Self::WGS84
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wgs84_derived_constants() {
        let wgs84 = Ellipsoid::WGS84;
        assert!((wgs84.semi_minor_axis() - 6_356_752.314_245).abs() < 1e-3);
        assert!((wgs84.eccentricity_squared() - 0.006_694_379_990_14).abs() < 1e-12);
    }

    #[test]
    fn test_sphere_from_axes() {
        let sphere = Ellipsoid::from_axes(6_378_137.0, 6_378_137.0);
        assert!(sphere.is_sphere());
        assert_eq!(sphere.eccentricity_squared(), 0.0);
    }

    #[test]
    fn test_lookup_by_name() {
        assert_eq!(Ellipsoid::by_name("wgs84"), Some(Ellipsoid::WGS84));
        assert_eq!(Ellipsoid::by_name("GRS80"), Some(Ellipsoid::GRS80));
        assert_eq!(Ellipsoid::by_name("bessel"), None);
    }
}
