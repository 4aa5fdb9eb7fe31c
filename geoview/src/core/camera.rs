//! Camera and view/projection matrices
//!
//! Presenters own one primary camera whose pose is expressed in the
//! presenter's scene frame. Matrices use a right-handed convention with
//! depth in `[0, 1]`.

use crate::core::scene::Transform;
use glam::{DMat3, DMat4, DQuat, DVec3};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Camera {
    /// Vertical field of view in radians (perspective only)
    pub fov_y_radians: f64,
    /// Width divided by height
    pub aspect_ratio: f64,
    pub z_near: f64,
    pub z_far: f64,
    pub projection_mode: ProjectionMode,
    /// Pose in the scene frame; the camera looks along its local -Z
    pub transform: Transform,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum ProjectionMode {
    Perspective,
    /// Parallel projection showing `height` scene units vertically
    Orthographic { height: f64 },
}

impl Default for Camera {
    fn default() -> Self {
        Self::perspective(60.0, 16.0 / 9.0, 0.1, 100_000.0)
    }
}

impl Camera {
    pub fn perspective(fov_y_degrees: f64, aspect_ratio: f64, z_near: f64, z_far: f64) -> Self {
        Self {
            fov_y_radians: fov_y_degrees.to_radians(),
            aspect_ratio,
            z_near,
            z_far,
            projection_mode: ProjectionMode::Perspective,
            transform: Transform::IDENTITY,
        }
    }

    pub fn orthographic(height: f64, aspect_ratio: f64, z_near: f64, z_far: f64) -> Self {
        Self {
            fov_y_radians: 0.0,
            aspect_ratio,
            z_near,
            z_far,
            projection_mode: ProjectionMode::Orthographic { height },
            transform: Transform::IDENTITY,
        }
    }

    pub fn position(&self) -> DVec3 {
        self.transform.translation
    }

    pub fn forward(&self) -> DVec3 {
        self.transform.rotation * DVec3::NEG_Z
    }

    /// Place the camera at `eye` looking at `target`
    ///
    /// When the view direction is parallel to `up`, an arbitrary
    /// perpendicular is used as the right axis.
    pub fn look_at(&mut self, eye: DVec3, target: DVec3, up: DVec3) {
        let forward = (target - eye).normalize_or_zero();
        if forward == DVec3::ZERO {
            self.transform.translation = eye;
            return;
        }

        let mut right = forward.cross(up);
        if right.length_squared() < 1e-12 {
            right = forward.any_orthonormal_vector();
        }
        let right = right.normalize();
        let up = right.cross(forward);

        let rotation = DQuat::from_mat3(&DMat3::from_cols(right, up, -forward));
        self.transform = Transform::from_translation_rotation(eye, rotation);
    }

    pub fn projection_matrix(&self) -> DMat4 {
        match self.projection_mode {
            ProjectionMode::Perspective => DMat4::perspective_rh(
                self.fov_y_radians,
                self.aspect_ratio,
                self.z_near,
                self.z_far,
            ),
            ProjectionMode::Orthographic { height } => {
                let half_height = height * 0.5;
                let half_width = half_height * self.aspect_ratio;
                DMat4::orthographic_rh(
                    -half_width,
                    half_width,
                    -half_height,
                    half_height,
                    self.z_near,
                    self.z_far,
                )
            }
        }
    }

    /// Inverse of the camera pose
    pub fn view_matrix(&self) -> DMat4 {
        self.transform.to_matrix().inverse()
    }

    pub fn view_projection_matrix(&self) -> DMat4 {
        self.projection_matrix() * self.view_matrix()
    }

    pub fn set_aspect_ratio(&mut self, aspect_ratio: f64) {
        self.aspect_ratio = aspect_ratio;
    }

    /// Whether the parameters can produce an invertible view-projection
    pub fn is_degenerate(&self) -> bool {
        let depth_ok = self.z_near > 0.0 && self.z_far > self.z_near && self.z_far.is_finite();
        let aspect_ok = self.aspect_ratio.is_finite() && self.aspect_ratio > 0.0;
        let lens_ok = match self.projection_mode {
            ProjectionMode::Perspective => {
                self.fov_y_radians > 0.0 && self.fov_y_radians < std::f64::consts::PI
            }
            ProjectionMode::Orthographic { height } => height.is_finite() && height > 0.0,
        };
        let pose_ok = self.transform.translation.is_finite()
            && self.transform.rotation.is_finite()
            && self.transform.rotation.length_squared() > 0.0;
        !(depth_ok && aspect_ok && lens_ok && pose_ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perspective_projection() {
        let camera = Camera::perspective(60.0, 16.0 / 9.0, 0.1, 1000.0);
        let proj = camera.projection_matrix();
        assert_eq!(proj.w_axis.w, 0.0);
        assert!(!camera.is_degenerate());
    }

    #[test]
    fn test_orthographic_projection() {
        let camera = Camera::orthographic(10.0, 16.0 / 9.0, 0.1, 1000.0);
        assert_eq!(camera.projection_matrix().w_axis.w, 1.0);
    }

    #[test]
    fn test_view_matrix_translates_opposite() {
        let mut camera = Camera::default();
        camera.transform = Transform::from_translation(DVec3::new(0.0, 0.0, 5.0));
        assert_eq!(camera.view_matrix().w_axis.z, -5.0);
    }

    #[test]
    fn test_look_at_points_forward() {
        let mut camera = Camera::default();
        camera.look_at(DVec3::new(0.0, 10.0, 10.0), DVec3::ZERO, DVec3::Y);
        let expected = DVec3::new(0.0, -1.0, -1.0).normalize();
        assert!((camera.forward() - expected).length() < 1e-12);
    }

    #[test]
    fn test_look_straight_down() {
        let mut camera = Camera::default();
        camera.look_at(DVec3::new(0.0, 0.0, 100.0), DVec3::ZERO, DVec3::Z);
        assert!((camera.forward() - DVec3::NEG_Z).length() < 1e-12);
        assert!(!camera.is_degenerate());
    }

    #[test]
    fn test_degenerate_parameters() {
        let mut camera = Camera::default();
        camera.set_aspect_ratio(0.0);
        assert!(camera.is_degenerate());

        let camera = Camera::orthographic(0.0, 1.0, 0.1, 10.0);
        assert!(camera.is_degenerate());
    }
}
