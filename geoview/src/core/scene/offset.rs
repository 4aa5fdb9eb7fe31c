//! Offset wrappers: parent nodes that place tangent-plane content in a scene
//!
//! Content authored in a local tangent plane is centered on an anchor point.
//! The wrapper above it carries the anchor's position in the presenter's
//! scene frame plus the rotation that corrects the content's up axis, and is
//! recomputed whenever the origin moves. The content itself is never touched.

use super::components::{OffsetWrapper, Transform};
use super::graph::SceneGraph;
use super::DisplayHandle;
use crate::core::geodesy::GeographicPoint;
use crate::error::StateError;
use glam::DQuat;
use hecs::Entity;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::f64::consts::FRAC_PI_2;
use tracing::{debug, trace};

/// Up-axis convention of tangent-plane content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisConvention {
    /// x east, y up, z south (glTF style)
    #[default]
    YUp,
    /// x east, y north, z up (ENU)
    ZUp,
}

impl AxisConvention {
    /// Rotation taking content-local vectors into ENU vectors
    pub fn to_enu(self) -> DQuat {
        match self {
            AxisConvention::YUp => DQuat::from_rotation_x(FRAC_PI_2),
            AxisConvention::ZUp => DQuat::IDENTITY,
        }
    }

    /// Rotation taking ENU vectors into content-local vectors
    pub fn from_enu(self) -> DQuat {
        self.to_enu().inverse()
    }
}

/// Live wrappers, keyed by the content node they hold
#[derive(Debug, Default)]
pub struct OffsetWrappers {
    by_content: HashMap<Entity, Entity>,
}

impl OffsetWrappers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a wrapper between `parent` and `content`
    pub fn wrap(
        &mut self,
        graph: &mut SceneGraph,
        content: Entity,
        parent: Entity,
        anchor: GeographicPoint,
        transform: Transform,
    ) -> Result<Entity, StateError> {
        if self.by_content.contains_key(&content) {
            return Err(StateError::AlreadyAttached(DisplayHandle::new(content)));
        }

        let wrapper = graph.spawn_node("offset-wrapper", transform);
        graph.insert_one(wrapper, OffsetWrapper { anchor, content })?;
        if let Err(error) = graph
            .attach(wrapper, parent)
            .and_then(|_| graph.attach(content, wrapper))
        {
            graph.despawn_recursive(wrapper);
            return Err(error);
        }

        self.by_content.insert(content, wrapper);
        debug!(content = ?content, wrapper = ?wrapper, anchor = %anchor, "Wrapped content");
        Ok(wrapper)
    }

    /// Remove the wrapper above `content`, leaving `content` detached
    ///
    /// Returns the anchor the content was centered on.
    pub fn unwrap(&mut self, graph: &mut SceneGraph, content: Entity) -> Option<GeographicPoint> {
        let wrapper = self.by_content.remove(&content)?;
        let anchor = graph.get::<OffsetWrapper>(wrapper).map(|w| w.anchor);
        graph.detach(content);
        graph.despawn_recursive(wrapper);
        trace!(content = ?content, "Unwrapped content");
        anchor
    }

    /// New transform for every live wrapper, computed without touching the graph
    ///
    /// Fails as a whole if any placement fails.
    pub fn plan_origin_update(
        &self,
        graph: &SceneGraph,
        mut placement: impl FnMut(&GeographicPoint) -> Result<Transform, StateError>,
    ) -> Result<Vec<(Entity, Transform)>, StateError> {
        let mut plan = Vec::with_capacity(self.by_content.len());
        for &wrapper in self.by_content.values() {
            let Some(anchor) = graph.get::<OffsetWrapper>(wrapper).map(|w| w.anchor) else {
                continue;
            };
            plan.push((wrapper, placement(&anchor)?));
        }
        Ok(plan)
    }

    /// Recompute every wrapper's transform, e.g. after an origin rebase
    ///
    /// Either every wrapper moves or none does.
    pub fn update_origin(
        &self,
        graph: &mut SceneGraph,
        placement: impl FnMut(&GeographicPoint) -> Result<Transform, StateError>,
    ) -> Result<usize, StateError> {
        let plan = self.plan_origin_update(graph, placement)?;
        let count = plan.len();
        for (wrapper, transform) in plan {
            graph.set_transform(wrapper, transform)?;
        }
        debug!(count, "Offset wrappers updated");
        Ok(count)
    }

    pub fn anchor_of(&self, graph: &SceneGraph, content: Entity) -> Option<GeographicPoint> {
        let wrapper = self.by_content.get(&content)?;
        graph.get::<OffsetWrapper>(*wrapper).map(|w| w.anchor)
    }

    pub fn wrapper_of(&self, content: Entity) -> Option<Entity> {
        self.by_content.get(&content).copied()
    }

    pub fn is_wrapped(&self, content: Entity) -> bool {
        self.by_content.contains_key(&content)
    }

    pub fn len(&self) -> usize {
        self.by_content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_content.is_empty()
    }

    /// Forget all wrappers without touching the graph
    pub fn clear(&mut self) {
        self.by_content.clear();
    }
}

/// Whether a node is an offset wrapper
pub fn is_wrapper(graph: &SceneGraph, entity: Entity) -> bool {
    graph.get::<OffsetWrapper>(entity).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;

    #[test]
    fn test_y_up_maps_up_axis() {
        let up = AxisConvention::YUp.to_enu() * DVec3::Y;
        assert!((up - DVec3::Z).length() < 1e-12);
        let south = AxisConvention::YUp.to_enu() * DVec3::Z;
        assert!((south - DVec3::NEG_Y).length() < 1e-12);
        assert_eq!(AxisConvention::ZUp.to_enu(), DQuat::IDENTITY);
    }

    #[test]
    fn test_wrap_and_unwrap() {
        let mut graph = SceneGraph::new();
        let root = graph.create_root("root");
        let content = graph.spawn_node("content", Transform::IDENTITY);
        let anchor = GeographicPoint::new(51.05, 13.74, 0.0);

        let mut wrappers = OffsetWrappers::new();
        let wrapper = wrappers
            .wrap(&mut graph, content, root, anchor, Transform::from_translation(DVec3::X))
            .unwrap();

        assert_eq!(graph.parent_of(content), Some(wrapper));
        assert_eq!(graph.parent_of(wrapper), Some(root));
        assert!(is_wrapper(&graph, wrapper));
        assert_eq!(wrappers.anchor_of(&graph, content), Some(anchor));

        assert_eq!(wrappers.unwrap(&mut graph, content), Some(anchor));
        assert!(graph.contains(content));
        assert!(!graph.contains(wrapper));
        assert_eq!(graph.parent_of(content), None);
        assert!(graph.children_of(root).is_empty());
    }

    #[test]
    fn test_double_wrap_is_rejected() {
        let mut graph = SceneGraph::new();
        let root = graph.create_root("root");
        let content = graph.spawn_node("content", Transform::IDENTITY);
        let anchor = GeographicPoint::default();

        let mut wrappers = OffsetWrappers::new();
        wrappers
            .wrap(&mut graph, content, root, anchor, Transform::IDENTITY)
            .unwrap();
        assert!(wrappers
            .wrap(&mut graph, content, root, anchor, Transform::IDENTITY)
            .is_err());
    }

    #[test]
    fn test_update_origin_repositions_without_reparenting() {
        let mut graph = SceneGraph::new();
        let root = graph.create_root("root");
        let content = graph.spawn_node("content", Transform::IDENTITY);
        let mut wrappers = OffsetWrappers::new();
        let wrapper = wrappers
            .wrap(&mut graph, content, root, GeographicPoint::default(), Transform::IDENTITY)
            .unwrap();

        let updated = wrappers
            .update_origin(&mut graph, |_| Ok(Transform::from_translation(DVec3::Z)))
            .unwrap();
        assert_eq!(updated, 1);
        assert_eq!(graph.transform(wrapper).unwrap().translation, DVec3::Z);
        assert_eq!(graph.parent_of(content), Some(wrapper));
    }

    #[test]
    fn test_failed_placement_leaves_every_wrapper_untouched() {
        let mut graph = SceneGraph::new();
        let root = graph.create_root("root");
        let mut wrappers = OffsetWrappers::new();
        let mut placed = Vec::new();
        for name in ["first", "second", "third"] {
            let content = graph.spawn_node(name, Transform::IDENTITY);
            let wrapper = wrappers
                .wrap(
                    &mut graph,
                    content,
                    root,
                    GeographicPoint::default(),
                    Transform::from_translation(DVec3::X),
                )
                .unwrap();
            placed.push(wrapper);
        }

        let mut calls = 0;
        let result = wrappers.update_origin(&mut graph, |_| {
            calls += 1;
            if calls == 2 {
                Err(StateError::NotInitialized)
            } else {
                Ok(Transform::from_translation(DVec3::Z))
            }
        });

        assert_eq!(result, Err(StateError::NotInitialized));
        for wrapper in placed {
            assert_eq!(graph.transform(wrapper).unwrap().translation, DVec3::X);
        }
    }
}
