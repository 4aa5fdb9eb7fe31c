//! Display nodes shared by every presenter
//!
//! Nodes live in a [`SceneGraph`] that outlives individual presenters, which
//! is what lets a mode switch re-home content without recreating it.

pub mod components;
mod frame;
mod graph;
pub mod hierarchy;
mod offset;

pub use components::{
    Bounds, Children, ContentRoot, GlobalTransform, Name, OffsetWrapper, Parent, Transform,
};
pub use frame::{ContentFrame, ProjectedFrame, SceneFrame, TangentPlaneFrame};
pub use graph::SceneGraph;
pub use hierarchy::propagate_transforms;
pub use offset::{is_wrapper, AxisConvention, OffsetWrappers};

pub use hecs::Entity;

use std::fmt;

/// Stable identity of an entity's content in the display tree
///
/// The same handle is kept across mode switches; only its parent changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DisplayHandle(Entity);

impl DisplayHandle {
    pub fn new(entity: Entity) -> Self {
        Self(entity)
    }

    pub fn entity(&self) -> Entity {
        self.0
    }
}

impl fmt::Display for DisplayHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0.id())
    }
}
