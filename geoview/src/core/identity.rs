//! Entity identity: external entity ids and the display handles they own

use crate::core::scene::DisplayHandle;
use crate::error::StateError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// Identifier of an entity in the external entity store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity:{}", self.0)
    }
}

impl From<u64> for EntityId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// One-to-one mapping between entities and their display handles
///
/// The mapping is owned by the viewer, not by a presenter, so it is
/// untouched by mode switches.
#[derive(Debug, Default)]
pub struct IdentityMap {
    handles: HashMap<EntityId, DisplayHandle>,
    entities: HashMap<DisplayHandle, EntityId>,
}

impl IdentityMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Associate `entity` with `handle`; both sides must be unmapped
    pub fn register(&mut self, entity: EntityId, handle: DisplayHandle) -> Result<(), StateError> {
        if self.handles.contains_key(&entity) {
            return Err(StateError::EntityAlreadyMapped(entity));
        }
        if self.entities.contains_key(&handle) {
            return Err(StateError::AlreadyAttached(handle));
        }
        debug!(entity = %entity, handle = %handle, "Registering entity mapping");
        self.handles.insert(entity, handle);
        self.entities.insert(handle, entity);
        Ok(())
    }

    pub fn handle_of(&self, entity: EntityId) -> Option<DisplayHandle> {
        self.handles.get(&entity).copied()
    }

    pub fn entity_of(&self, handle: DisplayHandle) -> Option<EntityId> {
        self.entities.get(&handle).copied()
    }

    pub fn contains_entity(&self, entity: EntityId) -> bool {
        self.handles.contains_key(&entity)
    }

    /// Forget `entity`; returns the handle it owned
    pub fn remove(&mut self, entity: EntityId) -> Option<DisplayHandle> {
        let handle = self.handles.remove(&entity)?;
        self.entities.remove(&handle);
        debug!(entity = %entity, handle = %handle, "Removed entity mapping");
        Some(handle)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, DisplayHandle)> + '_ {
        self.handles.iter().map(|(&entity, &handle)| (entity, handle))
    }

    pub fn clear(&mut self) {
        self.handles.clear();
        self.entities.clear();
    }
}
