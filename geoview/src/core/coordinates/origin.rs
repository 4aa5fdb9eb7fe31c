//! The origin frame every origin-relative conversion is expressed against

use crate::core::geodesy::{
    enu_to_ecef_rotation, Checked, DegeneracyReason, Ellipsoid, GeographicPoint,
};
use crate::core::projection::Projection;
use crate::error::ConfigError;
use glam::{DMat3, DVec2, DVec3};

/// Origin of the renderer-local tangent plane
///
/// All representations of the origin are computed together in
/// [`OriginFrame::new`] and never updated piecemeal; a rebase builds a new
/// frame and swaps it in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OriginFrame {
    geographic: GeographicPoint,
    ecef: DVec3,
    projected: DVec2,
    /// ENU → ECEF rotation at the origin
    rotation: DMat3,
    ellipsoid: Ellipsoid,
}

impl OriginFrame {
    /// Compute the frame for a geographic origin under a projection
    pub fn new(geographic: GeographicPoint, projection: &dyn Projection) -> Result<Self, ConfigError> {
        if !geographic.is_valid() {
            return Err(ConfigError::InvalidOrigin(geographic.to_string()));
        }

        let ellipsoid = projection.ellipsoid();
        let projected = projection.forward(&geographic);
        if !projected.value.is_finite() {
            return Err(ConfigError::InvalidOrigin(format!(
                "{geographic} cannot be projected with {}",
                projection.name()
            )));
        }

        Ok(Self {
            geographic,
            ecef: ellipsoid.geodetic_to_ecef(&geographic),
            projected: projected.value,
            rotation: enu_to_ecef_rotation(geographic.latitude, geographic.longitude),
            ellipsoid,
        })
    }

    pub fn geographic(&self) -> GeographicPoint {
        self.geographic
    }

    pub fn ecef(&self) -> DVec3 {
        self.ecef
    }

    pub fn projected(&self) -> DVec2 {
        self.projected
    }

    pub fn height(&self) -> f64 {
        self.geographic.height
    }

    /// ENU → ECEF rotation at this origin
    pub fn rotation(&self) -> DMat3 {
        self.rotation
    }

    pub fn ellipsoid(&self) -> Ellipsoid {
        self.ellipsoid
    }

    pub fn ecef_to_enu(&self, ecef: DVec3) -> DVec3 {
        self.rotation.transpose() * (ecef - self.ecef)
    }

    pub fn enu_to_ecef(&self, enu: DVec3) -> DVec3 {
        self.ecef + self.rotation * enu
    }

    pub fn geographic_to_enu(&self, point: &GeographicPoint) -> Checked<DVec3> {
        let enu = self.ecef_to_enu(self.ellipsoid.geodetic_to_ecef(point));
        if enu.is_finite() {
            Checked::reliable(enu)
        } else {
            Checked::unreliable(enu, DegeneracyReason::NonFinite)
        }
    }

    pub fn enu_to_geographic(&self, enu: DVec3) -> Checked<GeographicPoint> {
        self.ellipsoid.ecef_to_geodetic(self.enu_to_ecef(enu))
    }

    /// Rotation taking ENU vectors of this frame into ENU vectors of `other`
    pub fn rotation_to(&self, other: &OriginFrame) -> DMat3 {
        other.rotation.transpose() * self.rotation
    }

    /// Straight-line distance between two origins in metres
    pub fn distance_to(&self, other: &OriginFrame) -> f64 {
        self.ecef.distance(other.ecef)
    }
}
