//! Host container and the render surface a presenter claims from it
//!
//! A container hands out at most one surface at a time. Presenters claim it
//! on initialize/start and release it on stop/dispose, so two presenters
//! never draw into the same container.

use crate::error::{ResourceError, StateError, ViewerError};
use std::cell::{Cell, RefCell};
use tracing::{debug, warn};

#[derive(Debug)]
pub struct Container {
    id: String,
    size: Cell<(u32, u32)>,
    owner: RefCell<Option<String>>,
    open: Cell<bool>,
}

impl Container {
    pub fn new(id: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            id: id.into(),
            size: Cell::new((width, height)),
            owner: RefCell::new(None),
            open: Cell::new(true),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn size(&self) -> (u32, u32) {
        self.size.get()
    }

    pub fn resize(&self, width: u32, height: u32) {
        self.size.set((width, height));
    }

    pub fn owner(&self) -> Option<String> {
        self.owner.borrow().clone()
    }

    /// Take exclusive ownership of the container's surface
    pub fn claim(&self, owner: &str) -> Result<RenderSurface, ViewerError> {
        if !self.open.get() {
            return Err(ResourceError::SurfaceUnavailable {
                container: self.id.clone(),
            }
            .into());
        }
        let mut current = self.owner.borrow_mut();
        if let Some(existing) = current.as_ref() {
            if existing != owner {
                return Err(StateError::SurfaceInUse {
                    owner: existing.clone(),
                }
                .into());
            }
        }
        *current = Some(owner.to_string());

        let (width, height) = self.size.get();
        debug!(container = %self.id, owner, width, height, "Render surface claimed");
        Ok(RenderSurface {
            container: self.id.clone(),
            owner: owner.to_string(),
            width,
            height,
        })
    }

    /// Give the surface back; returns false if `owner` did not hold it
    pub fn release(&self, owner: &str) -> bool {
        let mut current = self.owner.borrow_mut();
        if current.as_deref() == Some(owner) {
            *current = None;
            debug!(container = %self.id, owner, "Render surface released");
            true
        } else {
            false
        }
    }

    /// The host withdrew the container; further claims fail
    pub fn close(&self) {
        warn!(container = %self.id, "Container closed");
        self.open.set(false);
    }

    pub fn reopen(&self) {
        self.open.set(true);
    }

    pub fn is_open(&self) -> bool {
        self.open.get()
    }
}

/// Exclusive drawing target inside a container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderSurface {
    pub container: String,
    pub owner: String,
    pub width: u32,
    pub height: u32,
}

impl RenderSurface {
    pub fn aspect_ratio(&self) -> f64 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f64 / self.height as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_owner() {
        let container = Container::new("main", 800, 600);
        let surface = container.claim("immersive").unwrap();
        assert_eq!(surface.width, 800);
        assert!(container.claim("immersive").is_ok());

        let error = container.claim("map").unwrap_err();
        assert!(error.is_state(&StateError::SurfaceInUse {
            owner: "immersive".to_string()
        }));

        assert!(!container.release("map"));
        assert!(container.release("immersive"));
        assert!(container.claim("map").is_ok());
    }

    #[test]
    fn test_closed_container_refuses_claims() {
        let container = Container::new("main", 800, 600);
        container.close();
        assert!(matches!(
            container.claim("map"),
            Err(ViewerError::Resource(ResourceError::SurfaceUnavailable { .. }))
        ));
        container.reopen();
        assert!(container.claim("map").is_ok());
    }
}
