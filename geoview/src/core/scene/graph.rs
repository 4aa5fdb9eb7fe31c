//! Display-node store shared by all presenters

use super::components::{Bounds, Children, ContentRoot, GlobalTransform, Name, Parent, Transform};
use super::hierarchy::propagate_transforms;
use super::DisplayHandle;
use crate::error::StateError;
use hecs::Entity;
use std::collections::VecDeque;
use tracing::{debug, trace, warn};

/// Wrapper around `hecs::World` holding every display node
///
/// Nodes survive presenter switches: a presenter only owns its content root,
/// entity content is detached from one root and attached to the next.
pub struct SceneGraph {
    world: hecs::World,
    frame: u64,
    last_propagated: Option<u64>,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    pub fn new() -> Self {
        Self {
            world: hecs::World::new(),
            frame: 0,
            last_propagated: None,
        }
    }

    /// Spawn a node with transform components and an empty child list
    pub fn spawn_node(&mut self, name: impl Into<String>, transform: Transform) -> Entity {
        self.world.spawn((
            Name::new(name),
            transform,
            GlobalTransform::default(),
            Children::default(),
        ))
    }

    /// Spawn a node meant to carry an entity's content
    pub fn create_display_node(
        &mut self,
        name: impl Into<String>,
        transform: Transform,
        bounds: Option<Bounds>,
    ) -> DisplayHandle {
        let entity = self.spawn_node(name, transform);
        if let Some(bounds) = bounds {
            if let Err(error) = self.world.insert_one(entity, bounds) {
                warn!(entity = ?entity, %error, "Failed to attach bounds");
            }
        }
        debug!(entity = ?entity, "Created display node");
        DisplayHandle::new(entity)
    }

    /// Spawn a presenter content root
    pub fn create_root(&mut self, name: impl Into<String>) -> Entity {
        let root = self.spawn_node(name, Transform::IDENTITY);
        if let Err(error) = self.world.insert_one(root, ContentRoot) {
            warn!(entity = ?root, %error, "Failed to mark content root");
        }
        root
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.world.contains(entity)
    }

    pub fn get<T: hecs::Component>(&self, entity: Entity) -> Option<hecs::Ref<'_, T>> {
        self.world.get::<&T>(entity).ok()
    }

    pub fn get_mut<T: hecs::Component>(&self, entity: Entity) -> Option<hecs::RefMut<'_, T>> {
        self.world.get::<&mut T>(entity).ok()
    }

    pub fn insert_one(&mut self, entity: Entity, component: impl hecs::Component) -> Result<(), StateError> {
        self.world
            .insert_one(entity, component)
            .map_err(|_| StateError::UnknownHandle(DisplayHandle::new(entity)))
    }

    pub fn remove_one<T: hecs::Component>(&mut self, entity: Entity) -> Option<T> {
        self.world.remove_one::<T>(entity).ok()
    }

    pub fn transform(&self, entity: Entity) -> Option<Transform> {
        self.get::<Transform>(entity).map(|t| *t)
    }

    pub fn set_transform(&mut self, entity: Entity, transform: Transform) -> Result<(), StateError> {
        match self.world.query_one_mut::<&mut Transform>(entity) {
            Ok(current) => {
                *current = transform;
                Ok(())
            }
            Err(_) => self.insert_one(entity, transform),
        }
    }

    pub fn global_transform(&self, entity: Entity) -> Option<GlobalTransform> {
        self.get::<GlobalTransform>(entity).map(|t| *t)
    }

    pub fn parent_of(&self, entity: Entity) -> Option<Entity> {
        self.get::<Parent>(entity).map(|p| p.0)
    }

    /// Children in attachment order
    pub fn children_of(&self, entity: Entity) -> Vec<Entity> {
        self.get::<Children>(entity)
            .map(|children| children.0.clone())
            .unwrap_or_default()
    }

    /// Make `child` the last child of `parent`, detaching it from any previous parent
    pub fn attach(&mut self, child: Entity, parent: Entity) -> Result<(), StateError> {
        for entity in [child, parent] {
            if !self.contains(entity) {
                return Err(StateError::UnknownHandle(DisplayHandle::new(entity)));
            }
        }
        if child == parent || self.is_ancestor(child, parent) {
            return Err(StateError::CyclicHierarchy(DisplayHandle::new(child)));
        }

        self.detach(child);
        self.insert_one(child, Parent(parent))?;
        match self.world.query_one_mut::<&mut Children>(parent) {
            Ok(children) => children.0.push(child),
            Err(_) => self.insert_one(parent, Children(vec![child]))?,
        }
        trace!(child = ?child, parent = ?parent, "Attached node");
        Ok(())
    }

    /// Remove `child` from its parent; returns the former parent
    pub fn detach(&mut self, child: Entity) -> Option<Entity> {
        let parent = self.world.remove_one::<Parent>(child).ok()?.0;
        if let Ok(children) = self.world.query_one_mut::<&mut Children>(parent) {
            children.0.retain(|&c| c != child);
        }
        trace!(child = ?child, parent = ?parent, "Detached node");
        Some(parent)
    }

    /// Whether `ancestor` is on the parent chain of `entity`
    pub fn is_ancestor(&self, ancestor: Entity, entity: Entity) -> bool {
        let mut current = self.parent_of(entity);
        let mut steps = 0usize;
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            steps += 1;
            if steps > self.world.len() as usize {
                return false;
            }
            current = self.parent_of(node);
        }
        false
    }

    /// All nodes below `entity`, breadth first
    pub fn descendants(&self, entity: Entity) -> Vec<Entity> {
        let mut result = Vec::new();
        let mut queue: VecDeque<Entity> = self.children_of(entity).into();
        while let Some(node) = queue.pop_front() {
            if result.contains(&node) {
                continue;
            }
            result.push(node);
            queue.extend(self.children_of(node));
        }
        result
    }

    /// Despawn a node and everything below it; returns the number removed
    pub fn despawn_recursive(&mut self, entity: Entity) -> usize {
        if !self.contains(entity) {
            return 0;
        }
        self.detach(entity);
        let mut doomed = self.descendants(entity);
        doomed.push(entity);
        for node in &doomed {
            if let Err(error) = self.world.despawn(*node) {
                trace!(entity = ?node, %error, "Node already gone");
            }
        }
        debug!(entity = ?entity, count = doomed.len(), "Despawned subtree");
        doomed.len()
    }

    /// The direct child of `root` on the path up from `entity`
    pub fn child_of_root_above(&self, entity: Entity, root: Entity) -> Option<Entity> {
        let mut current = entity;
        let mut steps = 0usize;
        loop {
            let parent = self.parent_of(current)?;
            if parent == root {
                return Some(current);
            }
            steps += 1;
            if steps > self.world.len() as usize {
                return None;
            }
            current = parent;
        }
    }

    pub fn len(&self) -> usize {
        self.world.len() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.world.is_empty()
    }

    /// Start a new frame; propagation runs at most once per frame
    pub fn advance_frame(&mut self) {
        self.frame += 1;
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Recompute world transforms unless already done this frame
    pub fn update_hierarchy(&mut self) {
        if self.last_propagated == Some(self.frame) {
            trace!(frame = self.frame, "Skipping hierarchy update - already updated this frame");
            return;
        }
        self.last_propagated = Some(self.frame);
        propagate_transforms(&mut self.world);
    }

    /// Recompute world transforms now, regardless of the frame gate
    pub fn force_update_hierarchy(&mut self) {
        self.last_propagated = Some(self.frame);
        propagate_transforms(&mut self.world);
    }

    pub fn inner(&self) -> &hecs::World {
        &self.world
    }

    pub fn inner_mut(&mut self) -> &mut hecs::World {
        &mut self.world
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;

    #[test]
    fn test_attach_keeps_order() {
        let mut graph = SceneGraph::new();
        let root = graph.create_root("root");
        let a = graph.spawn_node("a", Transform::IDENTITY);
        let b = graph.spawn_node("b", Transform::IDENTITY);
        graph.attach(a, root).unwrap();
        graph.attach(b, root).unwrap();
        assert_eq!(graph.children_of(root), vec![a, b]);
        assert_eq!(graph.parent_of(a), Some(root));
    }

    #[test]
    fn test_reattach_moves_node() {
        let mut graph = SceneGraph::new();
        let first = graph.create_root("first");
        let second = graph.create_root("second");
        let node = graph.spawn_node("node", Transform::IDENTITY);

        graph.attach(node, first).unwrap();
        graph.attach(node, second).unwrap();
        assert!(graph.children_of(first).is_empty());
        assert_eq!(graph.children_of(second), vec![node]);
    }

    #[test]
    fn test_detach_keeps_node_alive() {
        let mut graph = SceneGraph::new();
        let root = graph.create_root("root");
        let node = graph.spawn_node("node", Transform::IDENTITY);
        graph.attach(node, root).unwrap();

        assert_eq!(graph.detach(node), Some(root));
        assert!(graph.contains(node));
        assert!(graph.children_of(root).is_empty());
        assert_eq!(graph.detach(node), None);
    }

    #[test]
    fn test_cycle_is_rejected() {
        let mut graph = SceneGraph::new();
        let a = graph.spawn_node("a", Transform::IDENTITY);
        let b = graph.spawn_node("b", Transform::IDENTITY);
        graph.attach(b, a).unwrap();
        assert!(matches!(
            graph.attach(a, b),
            Err(StateError::CyclicHierarchy(_))
        ));
        assert!(matches!(
            graph.attach(a, a),
            Err(StateError::CyclicHierarchy(_))
        ));
    }

    #[test]
    fn test_despawn_recursive() {
        let mut graph = SceneGraph::new();
        let root = graph.create_root("root");
        let a = graph.spawn_node("a", Transform::IDENTITY);
        let b = graph.spawn_node("b", Transform::IDENTITY);
        graph.attach(a, root).unwrap();
        graph.attach(b, a).unwrap();

        assert_eq!(graph.despawn_recursive(a), 2);
        assert!(!graph.contains(a));
        assert!(!graph.contains(b));
        assert!(graph.children_of(root).is_empty());
    }

    #[test]
    fn test_child_of_root_above() {
        let mut graph = SceneGraph::new();
        let root = graph.create_root("root");
        let a = graph.spawn_node("a", Transform::IDENTITY);
        let b = graph.spawn_node("b", Transform::IDENTITY);
        graph.attach(a, root).unwrap();
        graph.attach(b, a).unwrap();

        assert_eq!(graph.child_of_root_above(b, root), Some(a));
        assert_eq!(graph.child_of_root_above(a, root), Some(a));
        assert_eq!(graph.child_of_root_above(root, root), None);
    }

    #[test]
    fn test_update_hierarchy_once_per_frame() {
        let mut graph = SceneGraph::new();
        let node = graph.spawn_node("node", Transform::from_translation(DVec3::X));
        graph.update_hierarchy();

        graph
            .set_transform(node, Transform::from_translation(DVec3::Y))
            .unwrap();
        graph.update_hierarchy();
        assert_eq!(graph.global_transform(node).unwrap().translation(), DVec3::X);

        graph.advance_frame();
        graph.update_hierarchy();
        assert_eq!(graph.global_transform(node).unwrap().translation(), DVec3::Y);
    }
}
