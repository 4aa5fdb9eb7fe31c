//! Value types shared by the geodetic kernel and everything built on it

use serde::{Deserialize, Serialize};
use std::fmt;

/// A position on (or above) the reference ellipsoid
///
/// Latitude and longitude are in degrees, height in metres above the ellipsoid.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GeographicPoint {
    /// Geodetic latitude in degrees, positive north
    pub latitude: f64,
    /// Longitude in degrees, positive east
    pub longitude: f64,
    /// Ellipsoidal height in metres
    #[serde(default)]
    pub height: f64,
}

impl GeographicPoint {
    /// Create a new geographic point
    pub fn new(latitude: f64, longitude: f64, height: f64) -> Self {
        Self {
            latitude,
            longitude,
            height,
        }
    }

    /// Same horizontal position with a different height
    pub fn with_height(self, height: f64) -> Self {
        Self { height, ..self }
    }

    /// Whether the latitude/longitude are finite and inside their ranges
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.height.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl fmt::Display for GeographicPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({:.7}°, {:.7}°, {:.3} m)",
            self.latitude, self.longitude, self.height
        )
    }
}

/// Why a numeric result should not be trusted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DegeneracyReason {
    /// Latitude too close to a pole for the inversion to be stable
    NearPole,
    /// Iterative refinement did not converge
    NotConverged,
    /// Input or output contained NaN or infinity
    NonFinite,
    /// Point lies outside the usable domain of the projection
    OutsideProjectionDomain,
    /// Projected system is not metric, so origin-relative offsets are meaningless
    NonMetricProjection,
}

impl fmt::Display for DegeneracyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::NearPole => "too close to a pole",
            Self::NotConverged => "did not converge",
            Self::NonFinite => "non-finite value",
            Self::OutsideProjectionDomain => "outside projection domain",
            Self::NonMetricProjection => "projection is not metric",
        };
        f.write_str(text)
    }
}

/// Trust marker attached to numeric results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Reliability {
    #[default]
    Reliable,
    Unreliable(DegeneracyReason),
}

impl Reliability {
    /// Keep the first unreliable marker of the two
    pub fn combine(self, other: Reliability) -> Reliability {
        match self {
            Reliability::Reliable => other,
            unreliable => unreliable,
        }
    }

    pub fn is_reliable(&self) -> bool {
        matches!(self, Reliability::Reliable)
    }
}

/// A value together with its reliability marker
///
/// Degenerate inputs (poles, points outside a projection's domain) still
/// produce a value, because approximate positions are often fine for
/// visualization; callers that care check [`Checked::is_reliable`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Checked<T> {
    pub value: T,
    pub reliability: Reliability,
}

impl<T> Checked<T> {
    pub fn reliable(value: T) -> Self {
        Self {
            value,
            reliability: Reliability::Reliable,
        }
    }

    pub fn unreliable(value: T, reason: DegeneracyReason) -> Self {
        Self {
            value,
            reliability: Reliability::Unreliable(reason),
        }
    }

    pub fn is_reliable(&self) -> bool {
        self.reliability.is_reliable()
    }

    /// Transform the value, keeping the marker
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Checked<U> {
        Checked {
            value: f(self.value),
            reliability: self.reliability,
        }
    }

    /// Chain another checked computation; the first unreliable marker wins
    pub fn and_then<U>(self, f: impl FnOnce(T) -> Checked<U>) -> Checked<U> {
        let next = f(self.value);
        Checked {
            value: next.value,
            reliability: self.reliability.combine(next.reliability),
        }
    }

    /// Downgrade to unreliable unless already marked
    pub fn flag(self, reason: DegeneracyReason) -> Self {
        Self {
            value: self.value,
            reliability: self.reliability.combine(Reliability::Unreliable(reason)),
        }
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geographic_point_validity() {
        assert!(GeographicPoint::new(51.05, 13.74, 0.0).is_valid());
        assert!(!GeographicPoint::new(91.0, 0.0, 0.0).is_valid());
        assert!(!GeographicPoint::new(0.0, 181.0, 0.0).is_valid());
        assert!(!GeographicPoint::new(f64::NAN, 0.0, 0.0).is_valid());
    }

    #[test]
    fn test_checked_and_then_keeps_first_reason() {
        let first = Checked::unreliable(1.0, DegeneracyReason::NearPole);
        let chained =
            first.and_then(|v| Checked::unreliable(v * 2.0, DegeneracyReason::NotConverged));
        assert_eq!(chained.value, 2.0);
        assert_eq!(
            chained.reliability,
            Reliability::Unreliable(DegeneracyReason::NearPole)
        );
    }

    #[test]
    fn test_checked_map_preserves_reliability() {
        let checked = Checked::reliable(3).map(|v| v + 1);
        assert!(checked.is_reliable());
        assert_eq!(checked.into_inner(), 4);
    }

    #[test]
    fn test_deserialize_point_without_height() {
        let point: GeographicPoint =
            serde_json::from_str(r#"{"latitude": 51.0, "longitude": 13.0}"#).unwrap();
        assert_eq!(point.height, 0.0);
    }
}
