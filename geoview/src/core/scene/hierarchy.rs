//! World-transform propagation through the node hierarchy

use super::components::{Children, GlobalTransform, Parent, Transform};
use glam::DMat4;
use hecs::Entity;
use std::collections::HashSet;
use tracing::{error, trace, warn};

/// Recompute every [`GlobalTransform`] from local transforms, breadth first
///
/// Roots are nodes with a [`Transform`] and no [`Parent`]. Children are
/// visited in attachment order. A node reached twice indicates a cycle; it is
/// logged and skipped.
pub fn propagate_transforms(world: &mut hecs::World) {
    let mut visited = HashSet::with_capacity(world.len() as usize);
    let mut queue: Vec<(Entity, DMat4)> = Vec::new();
    let mut next_level = Vec::new();

    for (entity, transform) in world.query::<&Transform>().without::<&Parent>().iter() {
        queue.push((entity, transform.to_matrix()));
        visited.insert(entity);
    }

    trace!(root_count = queue.len(), "Starting hierarchy update");

    while !queue.is_empty() {
        let mut updates = Vec::with_capacity(queue.len());

        for (entity, world_matrix) in queue.drain(..) {
            updates.push((entity, world_matrix));

            let Ok(children) = world.get::<&Children>(entity) else {
                continue;
            };
            for &child in &children.0 {
                if !visited.insert(child) {
                    error!(
                        parent = ?entity,
                        child = ?child,
                        "Cyclic parent-child relationship detected"
                    );
                    continue;
                }
                let local = world
                    .get::<&Transform>(child)
                    .map(|t| t.to_matrix())
                    .unwrap_or(DMat4::IDENTITY);
                next_level.push((child, world_matrix * local));
            }
        }

        for (entity, matrix) in updates {
            match world.query_one_mut::<&mut GlobalTransform>(entity) {
                Ok(global) => global.matrix = matrix,
                Err(_) => {
                    if let Err(error) = world.insert_one(entity, GlobalTransform::from_matrix(matrix)) {
                        warn!(entity = ?entity, %error, "Failed to store world transform");
                    }
                }
            }
        }

        std::mem::swap(&mut queue, &mut next_level);
    }

    trace!(processed_count = visited.len(), "Hierarchy update completed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scene::SceneGraph;
    use glam::{DQuat, DVec3};

    #[test]
    fn test_child_inherits_parent_transform() {
        let mut graph = SceneGraph::new();
        let parent = graph.spawn_node("parent", Transform::from_translation(DVec3::new(10.0, 0.0, 0.0)));
        let child = graph.spawn_node("child", Transform::from_translation(DVec3::new(0.0, 5.0, 0.0)));
        graph.attach(child, parent).unwrap();

        graph.force_update_hierarchy();

        let global = graph.global_transform(child).unwrap();
        assert_eq!(global.translation(), DVec3::new(10.0, 5.0, 0.0));
    }

    #[test]
    fn test_rotation_applies_to_child_offset() {
        let mut graph = SceneGraph::new();
        let parent = graph.spawn_node(
            "parent",
            Transform::from_translation_rotation(
                DVec3::ZERO,
                DQuat::from_rotation_z(std::f64::consts::FRAC_PI_2),
            ),
        );
        let child = graph.spawn_node("child", Transform::from_translation(DVec3::X));
        graph.attach(child, parent).unwrap();

        graph.force_update_hierarchy();

        let position = graph.global_transform(child).unwrap().translation();
        assert!((position - DVec3::Y).length() < 1e-12);
    }

    #[test]
    fn test_deep_hierarchy() {
        let mut graph = SceneGraph::new();
        let mut parent = graph.spawn_node("level-0", Transform::from_translation(DVec3::X));
        let mut leaf = parent;
        for level in 1..10 {
            leaf = graph.spawn_node(format!("level-{level}"), Transform::from_translation(DVec3::X));
            graph.attach(leaf, parent).unwrap();
            parent = leaf;
        }

        graph.force_update_hierarchy();
        assert_eq!(
            graph.global_transform(leaf).unwrap().translation(),
            DVec3::new(10.0, 0.0, 0.0)
        );
    }
}
