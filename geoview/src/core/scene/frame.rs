//! Scene frames: how a presenter's scene coordinates relate to the origin
//!
//! Both frames are centered on the adapter origin. The tangent-plane frame
//! is the exact ENU plane in Y-up axes; the projected frame is Z-up with
//! axes along the projected grid, so its offsets from the origin equal
//! projected offsets (translation only).

use super::components::Transform;
use super::offset::AxisConvention;
use crate::core::coordinates::{CoordinateAdapter, OriginFrame};
use crate::core::geodesy::{Checked, GeographicPoint};
use crate::error::StateError;
use glam::{DMat3, DQuat, DVec3};
use serde::{Deserialize, Serialize};

/// Which frame a presenter's content root is expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentFrame {
    TangentPlane,
    Projected,
}

/// Conversions between a presenter's scene coordinates and the world
pub trait SceneFrame {
    fn kind(&self) -> ContentFrame;

    /// Rotation taking scene vectors into ENU vectors at the origin
    fn scene_to_enu(&self) -> DQuat;

    fn geographic_to_scene(
        &self,
        adapter: &CoordinateAdapter,
        point: &GeographicPoint,
    ) -> Result<Checked<DVec3>, StateError>;

    fn scene_to_geographic(
        &self,
        adapter: &CoordinateAdapter,
        scene: DVec3,
    ) -> Result<Checked<GeographicPoint>, StateError>;

    /// Projected `(easting, northing, height)` → scene
    fn projected_to_scene(
        &self,
        adapter: &CoordinateAdapter,
        projected: DVec3,
    ) -> Result<Checked<DVec3>, StateError>;

    /// Scene → projected `(easting, northing, height)`
    fn scene_to_projected(
        &self,
        adapter: &CoordinateAdapter,
        scene: DVec3,
    ) -> Result<Checked<DVec3>, StateError>;

    /// Transform of an offset wrapper for content centered on `anchor`
    fn anchor_transform(
        &self,
        adapter: &CoordinateAdapter,
        anchor: &GeographicPoint,
        convention: AxisConvention,
    ) -> Result<Transform, StateError>;

    /// Keep a natively placed node at the same world position across a rebase
    fn rebase_transform(
        &self,
        previous: &OriginFrame,
        current: &OriginFrame,
        transform: &Transform,
    ) -> Transform;
}

/// Exact local tangent plane at the origin, Y-up
#[derive(Debug, Clone, Copy, Default)]
pub struct TangentPlaneFrame;

impl TangentPlaneFrame {
    const SCENE_AXES: AxisConvention = AxisConvention::YUp;
}

impl SceneFrame for TangentPlaneFrame {
    fn kind(&self) -> ContentFrame {
        ContentFrame::TangentPlane
    }

    fn scene_to_enu(&self) -> DQuat {
        Self::SCENE_AXES.to_enu()
    }

    fn geographic_to_scene(
        &self,
        adapter: &CoordinateAdapter,
        point: &GeographicPoint,
    ) -> Result<Checked<DVec3>, StateError> {
        let from_enu = Self::SCENE_AXES.from_enu();
        Ok(adapter.geographic_to_enu(point)?.map(|enu| from_enu * enu))
    }

    fn scene_to_geographic(
        &self,
        adapter: &CoordinateAdapter,
        scene: DVec3,
    ) -> Result<Checked<GeographicPoint>, StateError> {
        adapter.enu_to_geographic(self.scene_to_enu() * scene)
    }

    fn projected_to_scene(
        &self,
        adapter: &CoordinateAdapter,
        projected: DVec3,
    ) -> Result<Checked<DVec3>, StateError> {
        let geographic = adapter.projected_to_geographic(projected.truncate())?;
        let point = geographic.value.with_height(projected.z);
        let scene = self.geographic_to_scene(adapter, &point)?;
        Ok(geographic.and_then(|_| scene))
    }

    fn scene_to_projected(
        &self,
        adapter: &CoordinateAdapter,
        scene: DVec3,
    ) -> Result<Checked<DVec3>, StateError> {
        let geographic = self.scene_to_geographic(adapter, scene)?;
        let projected = adapter.geographic_to_projected(&geographic.value)?;
        let height = geographic.value.height;
        Ok(geographic.and_then(|_| projected.map(|p| p.extend(height))))
    }

    fn anchor_transform(
        &self,
        adapter: &CoordinateAdapter,
        anchor: &GeographicPoint,
        convention: AxisConvention,
    ) -> Result<Transform, StateError> {
        let origin = adapter.origin()?;
        let translation = self.geographic_to_scene(adapter, anchor)?.value;

        // ENU at the anchor → ENU at the origin
        let tilt = origin.rotation().transpose()
            * crate::core::geodesy::enu_to_ecef_rotation(anchor.latitude, anchor.longitude);
        let rotation = Self::SCENE_AXES.from_enu()
            * DQuat::from_mat3(&tilt)
            * convention.to_enu();

        Ok(Transform::from_translation_rotation(translation, rotation.normalize()))
    }

    fn rebase_transform(
        &self,
        previous: &OriginFrame,
        current: &OriginFrame,
        transform: &Transform,
    ) -> Transform {
        let to_enu = self.scene_to_enu();
        let ecef = previous.enu_to_ecef(to_enu * transform.translation);
        let translation = to_enu.inverse() * current.ecef_to_enu(ecef);

        let tilt: DMat3 = previous.rotation_to(current);
        let rotation = to_enu.inverse() * DQuat::from_mat3(&tilt) * to_enu * transform.rotation;

        Transform {
            translation,
            rotation: rotation.normalize(),
            scale: transform.scale,
        }
    }
}

/// Projected grid offsets from the origin, Z-up
#[derive(Debug, Clone, Copy, Default)]
pub struct ProjectedFrame;

impl SceneFrame for ProjectedFrame {
    fn kind(&self) -> ContentFrame {
        ContentFrame::Projected
    }

    fn scene_to_enu(&self) -> DQuat {
        DQuat::IDENTITY
    }

    fn geographic_to_scene(
        &self,
        adapter: &CoordinateAdapter,
        point: &GeographicPoint,
    ) -> Result<Checked<DVec3>, StateError> {
        let projected = adapter.geographic_to_projected(point)?;
        let scene = adapter.projected_to_enu(projected.value.extend(point.height))?;
        Ok(projected.and_then(|_| scene))
    }

    fn scene_to_geographic(
        &self,
        adapter: &CoordinateAdapter,
        scene: DVec3,
    ) -> Result<Checked<GeographicPoint>, StateError> {
        let projected = adapter.enu_to_projected(scene)?;
        let geographic = adapter.projected_to_geographic(projected.value.truncate())?;
        let height = projected.value.z;
        Ok(projected.and_then(|_| geographic.map(|g| g.with_height(height))))
    }

    fn projected_to_scene(
        &self,
        adapter: &CoordinateAdapter,
        projected: DVec3,
    ) -> Result<Checked<DVec3>, StateError> {
        adapter.projected_to_enu(projected)
    }

    fn scene_to_projected(
        &self,
        adapter: &CoordinateAdapter,
        scene: DVec3,
    ) -> Result<Checked<DVec3>, StateError> {
        adapter.enu_to_projected(scene)
    }

    /// Grid convergence is ignored; content is only translated
    fn anchor_transform(
        &self,
        adapter: &CoordinateAdapter,
        anchor: &GeographicPoint,
        convention: AxisConvention,
    ) -> Result<Transform, StateError> {
        let translation = self.geographic_to_scene(adapter, anchor)?.value;
        Ok(Transform::from_translation_rotation(translation, convention.to_enu()))
    }

    fn rebase_transform(
        &self,
        previous: &OriginFrame,
        current: &OriginFrame,
        transform: &Transform,
    ) -> Transform {
        let shift = (previous.projected() - current.projected())
            .extend(previous.height() - current.height());
        Transform {
            translation: transform.translation + shift,
            ..*transform
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReferenceSystemConfig;
    use crate::runtime::Runtime;

    fn adapter(runtime: &Runtime) -> CoordinateAdapter {
        let mut adapter = CoordinateAdapter::new(
            ReferenceSystemConfig::code("EPSG:32633"),
            Some(GeographicPoint::new(51.05, 13.74, 0.0)),
            None,
        );
        pollster::block_on(adapter.initialize(runtime)).unwrap();
        adapter
    }

    fn ecef_distance(a: &GeographicPoint, b: &GeographicPoint) -> f64 {
        crate::core::geodesy::geodetic_to_ecef(a).distance(crate::core::geodesy::geodetic_to_ecef(b))
    }

    #[test]
    fn test_tangent_plane_up_is_scene_y() {
        let runtime = Runtime::headless();
        let adapter = adapter(&runtime);
        let above = GeographicPoint::new(51.05, 13.74, 100.0);
        let scene = TangentPlaneFrame.geographic_to_scene(&adapter, &above).unwrap().value;
        assert!((scene - DVec3::new(0.0, 100.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_projected_frame_matches_grid_offsets() {
        let runtime = Runtime::headless();
        let adapter = adapter(&runtime);
        let origin = adapter.origin().unwrap().projected();
        let scene = ProjectedFrame
            .projected_to_scene(&adapter, DVec3::new(origin.x + 250.0, origin.y - 40.0, 12.0))
            .unwrap()
            .value;
        assert_eq!(scene, DVec3::new(250.0, -40.0, 12.0));
    }

    #[test]
    fn test_frames_round_trip_geographic() {
        let runtime = Runtime::headless();
        let adapter = adapter(&runtime);
        let point = GeographicPoint::new(51.06, 13.76, 35.0);

        let frames: [&dyn SceneFrame; 2] = [&TangentPlaneFrame, &ProjectedFrame];
        for frame in frames {
            let scene = frame.geographic_to_scene(&adapter, &point).unwrap().value;
            let back = frame.scene_to_geographic(&adapter, scene).unwrap().value;
            assert!(ecef_distance(&point, &back) < 1e-3, "{:?}", frame.kind());
        }
    }

    #[test]
    fn test_anchor_transform_at_origin_is_axis_correction() {
        let runtime = Runtime::headless();
        let adapter = adapter(&runtime);
        let origin = adapter.origin().unwrap().geographic();

        let transform = TangentPlaneFrame
            .anchor_transform(&adapter, &origin, AxisConvention::YUp)
            .unwrap();
        assert!(transform.translation.length() < 1e-9);
        assert!(transform.rotation.abs_diff_eq(DQuat::IDENTITY, 1e-9));

        let transform = ProjectedFrame
            .anchor_transform(&adapter, &origin, AxisConvention::YUp)
            .unwrap();
        assert!(transform.rotation.abs_diff_eq(AxisConvention::YUp.to_enu(), 1e-12));
    }

    #[test]
    fn test_rebase_transform_keeps_world_position() {
        let runtime = Runtime::headless();
        let mut adapter = adapter(&runtime);
        let node = Transform::from_translation(DVec3::new(120.0, 3.0, -80.0));
        let before = TangentPlaneFrame
            .scene_to_geographic(&adapter, node.translation)
            .unwrap()
            .value;

        let previous = adapter
            .set_origin(GeographicPoint::new(51.06, 13.75, 0.0))
            .unwrap();
        let current = *adapter.origin().unwrap();
        let moved = TangentPlaneFrame.rebase_transform(&previous, &current, &node);
        let after = TangentPlaneFrame
            .scene_to_geographic(&adapter, moved.translation)
            .unwrap()
            .value;

        assert!(ecef_distance(&before, &after) < 0.01);
    }
}
