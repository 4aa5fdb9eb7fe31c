//! Host capabilities and the cached probe over them

use super::PresenterMode;
use crate::error::ResourceError;
use async_trait::async_trait;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use tracing::{debug, info, warn};

/// What the embedding host can provide
#[async_trait(?Send)]
pub trait HostEnvironment {
    fn name(&self) -> &str {
        "host"
    }

    /// Whether an immersive (stereo) session can be started
    async fn immersive_session_supported(&self) -> bool;

    /// Load the map engine on first use
    async fn load_map_engine(&self) -> Result<(), ResourceError>;
}

/// Host without a display where availability is configured up front
#[derive(Debug)]
pub struct HeadlessHost {
    immersive: Cell<bool>,
    map: Cell<bool>,
    probes: Cell<usize>,
}

impl Default for HeadlessHost {
    fn default() -> Self {
        Self {
            immersive: Cell::new(true),
            map: Cell::new(true),
            probes: Cell::new(0),
        }
    }
}

impl HeadlessHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_immersive(self, available: bool) -> Self {
        self.immersive.set(available);
        self
    }

    pub fn with_map(self, available: bool) -> Self {
        self.map.set(available);
        self
    }

    /// Takes effect for probes not yet cached
    pub fn set_map_available(&self, available: bool) {
        self.map.set(available);
    }

    pub fn set_immersive_available(&self, available: bool) {
        self.immersive.set(available);
    }

    /// How often the host was actually asked
    pub fn probe_count(&self) -> usize {
        self.probes.get()
    }
}

#[async_trait(?Send)]
impl HostEnvironment for HeadlessHost {
    fn name(&self) -> &str {
        "headless"
    }

    async fn immersive_session_supported(&self) -> bool {
        self.probes.set(self.probes.get() + 1);
        self.immersive.get()
    }

    async fn load_map_engine(&self) -> Result<(), ResourceError> {
        self.probes.set(self.probes.get() + 1);
        if self.map.get() {
            Ok(())
        } else {
            Err(ResourceError::Unavailable {
                backend: PresenterMode::Map,
                reason: "map engine is not installed".to_string(),
            })
        }
    }
}

/// Answers "can this mode run here?", asking the host at most once per mode
pub struct CapabilityProbe {
    host: Rc<dyn HostEnvironment>,
    cache: RefCell<HashMap<PresenterMode, Result<(), ResourceError>>>,
}

impl CapabilityProbe {
    pub fn new(host: Rc<dyn HostEnvironment>) -> Self {
        Self {
            host,
            cache: RefCell::new(HashMap::new()),
        }
    }

    /// `Ok` when `mode` can be constructed; the first answer is cached
    pub async fn probe(&self, mode: PresenterMode) -> Result<(), ResourceError> {
        if let Some(cached) = self.cache.borrow().get(&mode) {
            return cached.clone();
        }

        let result = match mode {
            PresenterMode::Immersive => {
                if self.host.immersive_session_supported().await {
                    Ok(())
                } else {
                    Err(ResourceError::Unavailable {
                        backend: mode,
                        reason: "host does not support immersive sessions".to_string(),
                    })
                }
            }
            PresenterMode::Map => self.host.load_map_engine().await,
        };

        match &result {
            Ok(()) => info!(%mode, host = self.host.name(), "Presenter back-end available"),
            Err(error) => warn!(%mode, host = self.host.name(), %error, "Presenter back-end unavailable"),
        }
        self.cache.borrow_mut().insert(mode, result.clone());
        result
    }

    /// Modes usable on this host
    pub async fn available_modes(&self) -> Vec<PresenterMode> {
        let mut modes = Vec::new();
        for mode in PresenterMode::ALL {
            if self.probe(mode).await.is_ok() {
                modes.push(mode);
            }
        }
        modes
    }

    /// Cached answer, without asking the host
    pub fn cached(&self, mode: PresenterMode) -> Option<bool> {
        self.cache.borrow().get(&mode).map(|r| r.is_ok())
    }

    pub fn reset(&self) {
        self.cache.borrow_mut().clear();
        debug!("Capability cache cleared");
    }
}

impl std::fmt::Debug for CapabilityProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityProbe")
            .field("host", &self.host.name())
            .field("cache", &self.cache)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_is_cached() {
        let host = Rc::new(HeadlessHost::new());
        let probe = CapabilityProbe::new(host.clone());

        pollster::block_on(probe.probe(PresenterMode::Map)).unwrap();
        pollster::block_on(probe.probe(PresenterMode::Map)).unwrap();
        assert_eq!(host.probe_count(), 1);
        assert_eq!(probe.cached(PresenterMode::Map), Some(true));
        assert_eq!(probe.cached(PresenterMode::Immersive), None);
    }

    #[test]
    fn test_unavailable_map_is_reported() {
        let host = Rc::new(HeadlessHost::new().with_map(false));
        let probe = CapabilityProbe::new(host.clone());

        let modes = pollster::block_on(probe.available_modes());
        assert_eq!(modes, vec![PresenterMode::Immersive]);
        assert!(matches!(
            pollster::block_on(probe.probe(PresenterMode::Map)),
            Err(ResourceError::Unavailable { backend: PresenterMode::Map, .. })
        ));
    }

    #[test]
    fn test_reset_asks_again() {
        let host = Rc::new(HeadlessHost::new().with_map(false));
        let probe = CapabilityProbe::new(host.clone());
        assert!(pollster::block_on(probe.probe(PresenterMode::Map)).is_err());

        host.set_map_available(true);
        assert!(pollster::block_on(probe.probe(PresenterMode::Map)).is_err());

        probe.reset();
        assert!(pollster::block_on(probe.probe(PresenterMode::Map)).is_ok());
    }
}
