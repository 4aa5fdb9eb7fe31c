//! Components of display nodes

use crate::core::geodesy::GeographicPoint;
use glam::{DMat4, DQuat, DVec3};
use serde::{Deserialize, Serialize};

/// Local transform of a display node, in double precision
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Transform {
    pub translation: DVec3,
    pub rotation: DQuat,
    pub scale: DVec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        translation: DVec3::ZERO,
        rotation: DQuat::IDENTITY,
        scale: DVec3::ONE,
    };

    pub fn from_translation(translation: DVec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    pub fn from_translation_rotation(translation: DVec3, rotation: DQuat) -> Self {
        Self {
            translation,
            rotation,
            ..Self::IDENTITY
        }
    }

    pub fn with_scale(mut self, scale: DVec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn to_matrix(&self) -> DMat4 {
        DMat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

/// World-space transform, written by hierarchy propagation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlobalTransform {
    pub matrix: DMat4,
}

impl Default for GlobalTransform {
    fn default() -> Self {
        Self {
            matrix: DMat4::IDENTITY,
        }
    }
}

impl GlobalTransform {
    pub fn from_matrix(matrix: DMat4) -> Self {
        Self { matrix }
    }

    pub fn translation(&self) -> DVec3 {
        self.matrix.w_axis.truncate()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parent(pub hecs::Entity);

/// Children in attachment order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Children(pub Vec<hecs::Entity>);

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Name(pub String);

impl Name {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

/// Marks the node a presenter attaches entity content under
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentRoot;

/// Parent node placing tangent-plane content in a presenter scene
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OffsetWrapper {
    /// Geographic point the wrapped content is centered on
    pub anchor: GeographicPoint,
    pub content: hecs::Entity,
}

/// Local-space axis-aligned bounding box used for picking
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: DVec3,
    pub max: DVec3,
}

impl Bounds {
    pub fn new(min: DVec3, max: DVec3) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    /// Box of the given half extents centered on the local origin
    pub fn centered(half_extents: DVec3) -> Self {
        Self::new(-half_extents, half_extents)
    }

    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }

    pub fn half_extents(&self) -> DVec3 {
        (self.max - self.min) * 0.5
    }

    /// Axis-aligned box enclosing this box after transformation
    pub fn transformed(&self, matrix: &DMat4) -> Bounds {
        let center = matrix.transform_point3(self.center());
        let half = self.half_extents();
        let extent = matrix.x_axis.truncate().abs() * half.x
            + matrix.y_axis.truncate().abs() * half.y
            + matrix.z_axis.truncate().abs() * half.z;
        Bounds::new(center - extent, center + extent)
    }

    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds::new(self.min.min(other.min), self.max.max(other.max))
    }

    pub fn contains(&self, point: DVec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// Slab test; distance along the ray to the first intersection
    ///
    /// `inv_direction` is the component-wise reciprocal of the ray direction.
    /// A ray starting inside the box hits at distance zero.
    pub fn intersect_ray(&self, origin: DVec3, inv_direction: DVec3) -> Option<f64> {
        let t1 = (self.min - origin) * inv_direction;
        let t2 = (self.max - origin) * inv_direction;

        let t_min = t1.min(t2).max_element();
        let t_max = t1.max(t2).min_element();

        if t_max >= t_min.max(0.0) {
            Some(t_min.max(0.0))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_to_matrix() {
        let transform = Transform::from_translation(DVec3::new(1.0, 2.0, 3.0));
        assert_eq!(
            transform.to_matrix().w_axis.truncate(),
            DVec3::new(1.0, 2.0, 3.0)
        );
    }

    #[test]
    fn test_bounds_transformed_by_rotation() {
        let bounds = Bounds::centered(DVec3::new(2.0, 1.0, 1.0));
        let matrix = DMat4::from_rotation_z(std::f64::consts::FRAC_PI_2);
        let rotated = bounds.transformed(&matrix);
        assert!((rotated.max - DVec3::new(1.0, 2.0, 1.0)).length() < 1e-12);
    }

    #[test]
    fn test_ray_hits_box() {
        let bounds = Bounds::centered(DVec3::ONE);
        let origin = DVec3::new(0.0, 0.0, 10.0);
        let direction = DVec3::NEG_Z;
        let distance = bounds.intersect_ray(origin, direction.recip()).unwrap();
        assert!((distance - 9.0).abs() < 1e-12);
    }

    #[test]
    fn test_ray_misses_box() {
        let bounds = Bounds::centered(DVec3::ONE);
        let origin = DVec3::new(5.0, 0.0, 10.0);
        assert!(bounds.intersect_ray(origin, DVec3::NEG_Z.recip()).is_none());
    }

    #[test]
    fn test_ray_pointing_away_misses() {
        let bounds = Bounds::centered(DVec3::ONE);
        let origin = DVec3::new(0.0, 0.0, 10.0);
        assert!(bounds.intersect_ray(origin, DVec3::Z.recip()).is_none());
    }

    #[test]
    fn test_ray_from_inside_hits_at_zero() {
        let bounds = Bounds::centered(DVec3::ONE);
        assert_eq!(bounds.intersect_ray(DVec3::ZERO, DVec3::X.recip()), Some(0.0));
    }
}
