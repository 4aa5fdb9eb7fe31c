//! Hit testing in scene space
//!
//! A window position becomes a ray through the inverse view-projection; the
//! ray is tested against the world-space bounds of every node below the
//! content root. The reported handle is always the entity's own node: the
//! top-most content node below the root, skipping offset wrappers.

use crate::core::camera::Camera;
use crate::core::scene::{is_wrapper, Bounds, DisplayHandle, Entity, OffsetWrapper, SceneGraph};
use crate::error::FrameError;
use glam::{DVec2, DVec3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: DVec3,
    /// Unit length
    pub direction: DVec3,
}

impl Ray {
    pub fn new(origin: DVec3, direction: DVec3) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    pub fn at(&self, distance: f64) -> DVec3 {
        self.origin + self.direction * distance
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickHit {
    pub handle: DisplayHandle,
    /// The node whose bounds were hit; may sit below `handle`
    pub node: Entity,
    pub point: DVec3,
    pub distance: f64,
}

/// Ray through a window position, top-left origin, physical pixels
pub fn screen_ray(camera: &Camera, viewport: (u32, u32), position: DVec2) -> Result<Ray, FrameError> {
    let (width, height) = viewport;
    if width == 0 || height == 0 {
        return Err(FrameError::DegenerateCamera("viewport has zero size"));
    }
    if camera.is_degenerate() {
        return Err(FrameError::DegenerateCamera("camera parameters are degenerate"));
    }

    let ndc = DVec2::new(
        2.0 * position.x / width as f64 - 1.0,
        1.0 - 2.0 * position.y / height as f64,
    );
    let view_projection = camera.view_projection_matrix();
    if view_projection.determinant().abs() < f64::EPSILON {
        return Err(FrameError::DegenerateCamera("view-projection is not invertible"));
    }
    let inverse = view_projection.inverse();

    let near = inverse.project_point3(ndc.extend(0.0));
    let far = inverse.project_point3(ndc.extend(1.0));
    let direction = far - near;
    if !near.is_finite() || !direction.is_finite() || direction.length_squared() == 0.0 {
        return Err(FrameError::DegenerateCamera("pick ray is not finite"));
    }
    Ok(Ray::new(near, direction))
}

/// Nearest hit below `root`
pub fn pick(graph: &SceneGraph, root: Entity, ray: &Ray) -> Option<PickHit> {
    let inv_direction = ray.direction.recip();
    let mut nearest: Option<(Entity, f64)> = None;

    for node in graph.descendants(root) {
        let Some(bounds) = graph.get::<Bounds>(node).map(|b| *b) else {
            continue;
        };
        let Some(global) = graph.global_transform(node) else {
            continue;
        };
        let world = bounds.transformed(&global.matrix);
        let Some(distance) = world.intersect_ray(ray.origin, inv_direction) else {
            continue;
        };
        if nearest.map_or(true, |(_, best)| distance < best) {
            nearest = Some((node, distance));
        }
    }

    let (node, distance) = nearest?;
    let handle = entity_handle(graph, root, node)?;
    Some(PickHit {
        handle,
        node,
        point: ray.at(distance),
        distance,
    })
}

/// The entity node owning `node`, looking through an offset wrapper
pub fn entity_handle(graph: &SceneGraph, root: Entity, node: Entity) -> Option<DisplayHandle> {
    let top = graph.child_of_root_above(node, root)?;
    if is_wrapper(graph, top) {
        let content = graph.get::<OffsetWrapper>(top)?.content;
        Some(DisplayHandle::new(content))
    } else {
        Some(DisplayHandle::new(top))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geodesy::GeographicPoint;
    use crate::core::scene::{OffsetWrappers, Transform};

    fn camera_looking_down_z() -> Camera {
        let mut camera = Camera::perspective(60.0, 1.0, 0.1, 1000.0);
        camera.transform = Transform::from_translation(DVec3::new(0.0, 0.0, 10.0));
        camera
    }

    #[test]
    fn test_center_ray_points_forward() {
        let camera = camera_looking_down_z();
        let ray = screen_ray(&camera, (100, 100), DVec2::new(50.0, 50.0)).unwrap();
        assert!((ray.direction - DVec3::NEG_Z).length() < 1e-9);
        assert!(ray.origin.x.abs() < 1e-9 && ray.origin.y.abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_camera_is_an_error() {
        let mut camera = camera_looking_down_z();
        camera.set_aspect_ratio(0.0);
        assert!(screen_ray(&camera, (100, 100), DVec2::ZERO).is_err());
        assert!(screen_ray(&camera_looking_down_z(), (0, 100), DVec2::ZERO).is_err());
    }

    #[test]
    fn test_pick_resolves_top_content_node() {
        let mut graph = SceneGraph::new();
        let root = graph.create_root("root");
        let entity = graph.create_display_node("entity", Transform::IDENTITY, None);
        let part = graph.spawn_node("part", Transform::from_translation(DVec3::new(0.0, 0.0, 1.0)));
        graph.insert_one(part, Bounds::centered(DVec3::splat(0.5))).unwrap();
        graph.attach(part, entity.entity()).unwrap();
        graph.attach(entity.entity(), root).unwrap();
        graph.force_update_hierarchy();

        let ray = Ray::new(DVec3::new(0.0, 0.0, 10.0), DVec3::NEG_Z);
        let hit = pick(&graph, root, &ray).unwrap();
        assert_eq!(hit.handle, entity);
        assert_eq!(hit.node, part);
        assert!((hit.distance - 8.5).abs() < 1e-9);
    }

    #[test]
    fn test_pick_skips_wrapper() {
        let mut graph = SceneGraph::new();
        let root = graph.create_root("root");
        let content = graph.create_display_node(
            "content",
            Transform::IDENTITY,
            Some(Bounds::centered(DVec3::ONE)),
        );
        let mut wrappers = OffsetWrappers::new();
        wrappers
            .wrap(
                &mut graph,
                content.entity(),
                root,
                GeographicPoint::default(),
                Transform::from_translation(DVec3::new(5.0, 0.0, 0.0)),
            )
            .unwrap();
        graph.force_update_hierarchy();

        let ray = Ray::new(DVec3::new(5.0, 0.0, 10.0), DVec3::NEG_Z);
        assert_eq!(pick(&graph, root, &ray).unwrap().handle, content);

        let miss = Ray::new(DVec3::new(0.0, 0.0, 10.0), DVec3::NEG_Z);
        assert!(pick(&graph, root, &miss).is_none());
    }

    #[test]
    fn test_nearest_hit_wins() {
        let mut graph = SceneGraph::new();
        let root = graph.create_root("root");
        let far = graph.create_display_node("far", Transform::IDENTITY, Some(Bounds::centered(DVec3::ONE)));
        let near = graph.create_display_node(
            "near",
            Transform::from_translation(DVec3::new(0.0, 0.0, 5.0)),
            Some(Bounds::centered(DVec3::ONE)),
        );
        graph.attach(far.entity(), root).unwrap();
        graph.attach(near.entity(), root).unwrap();
        graph.force_update_hierarchy();

        let ray = Ray::new(DVec3::new(0.0, 0.0, 10.0), DVec3::NEG_Z);
        assert_eq!(pick(&graph, root, &ray).unwrap().handle, near);
    }
}
