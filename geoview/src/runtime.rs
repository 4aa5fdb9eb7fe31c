//! Process-wide registries, passed around explicitly
//!
//! The runtime owns what would otherwise be ambient global state: the
//! reference-system registry, the projection engine and definition resolver,
//! the cached capability probe and the layer builders. Tests create a fresh
//! runtime (or call [`Runtime::reset`]) instead of patching globals.

use crate::core::projection::{
    well_known_definition, BuiltinProjectionEngine, CrsRegistry, DefinitionResolver,
    NoRemoteResolver, Projection, ProjectionEngine,
};
use crate::error::ConfigError;
use crate::layers::LayerRegistry;
use crate::presenter::{CapabilityProbe, HeadlessHost, HostEnvironment};
use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;
use tracing::info;

pub struct Runtime {
    crs: RefCell<CrsRegistry>,
    projections: Box<dyn ProjectionEngine>,
    resolver: Box<dyn DefinitionResolver>,
    capabilities: CapabilityProbe,
    layers: RefCell<LayerRegistry>,
    host: Rc<dyn HostEnvironment>,
}

impl Runtime {
    pub fn new(host: Rc<dyn HostEnvironment>) -> Self {
        Self {
            crs: RefCell::new(CrsRegistry::new()),
            projections: Box::new(BuiltinProjectionEngine),
            resolver: Box::new(NoRemoteResolver),
            capabilities: CapabilityProbe::new(host.clone()),
            layers: RefCell::new(LayerRegistry::with_defaults()),
            host,
        }
    }

    /// Runtime for a host without a display, where every mode is available
    pub fn headless() -> Self {
        Self::new(Rc::new(HeadlessHost::default()))
    }

    pub fn with_resolver(mut self, resolver: impl DefinitionResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    pub fn with_projection_engine(mut self, engine: impl ProjectionEngine + 'static) -> Self {
        self.projections = Box::new(engine);
        self
    }

    /// Hand projection definitions to PROJ
    #[cfg(feature = "proj-transforms")]
    pub fn with_proj(self) -> Self {
        self.with_projection_engine(crate::core::projection::ProjProjectionEngine)
    }

    pub fn crs(&self) -> Ref<'_, CrsRegistry> {
        self.crs.borrow()
    }

    pub fn crs_mut(&self) -> RefMut<'_, CrsRegistry> {
        self.crs.borrow_mut()
    }

    pub fn projections(&self) -> &dyn ProjectionEngine {
        self.projections.as_ref()
    }

    pub fn resolver(&self) -> &dyn DefinitionResolver {
        self.resolver.as_ref()
    }

    pub fn capabilities(&self) -> &CapabilityProbe {
        &self.capabilities
    }

    pub fn host(&self) -> Rc<dyn HostEnvironment> {
        self.host.clone()
    }

    pub fn layers(&self) -> Ref<'_, LayerRegistry> {
        self.layers.borrow()
    }

    pub fn layers_mut(&self) -> RefMut<'_, LayerRegistry> {
        self.layers.borrow_mut()
    }

    /// Projection for a code known to the registry or derivable from it
    ///
    /// Synchronous; codes that need the asynchronous resolver must have been
    /// registered first (adapter initialization does that).
    pub fn projection_for(&self, code: &str) -> Result<Box<dyn Projection>, ConfigError> {
        let definition = match self.crs().get(code) {
            Some(system) => system.definition.clone(),
            None => well_known_definition(code)
                .ok_or_else(|| ConfigError::UnresolvedReferenceSystem(code.to_string()))?,
        };
        self.projections
            .create(&definition)
            .map_err(|source| ConfigError::InvalidDefinition {
                code: code.to_string(),
                source,
            })
    }

    /// Drop registrations and cached probes; layer builders return to defaults
    pub fn reset(&self) {
        self.crs.borrow_mut().clear();
        self.capabilities.reset();
        *self.layers.borrow_mut() = LayerRegistry::with_defaults();
        info!("Runtime reset");
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::headless()
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("crs", &self.crs)
            .field("projections", &self.projections)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projection_for_well_known_code() {
        let runtime = Runtime::headless();
        let projection = runtime.projection_for("EPSG:32633").unwrap();
        assert_eq!(projection.name(), "tmerc");
    }

    #[test]
    fn test_projection_for_unknown_code() {
        let runtime = Runtime::headless();
        assert!(matches!(
            runtime.projection_for("EPSG:2056"),
            Err(ConfigError::UnresolvedReferenceSystem(_))
        ));
    }

    #[test]
    fn test_reset_clears_registrations() {
        let runtime = Runtime::headless();
        runtime
            .crs_mut()
            .register("EPSG:2056", "+proj=tmerc +lat_0=46.95 +lon_0=7.44 +x_0=2600000 +y_0=1200000 +ellps=GRS80 +units=m")
            .unwrap();
        assert!(runtime.projection_for("EPSG:2056").is_ok());

        runtime.reset();
        assert!(runtime.crs().is_empty());
        assert!(runtime.projection_for("EPSG:2056").is_err());
    }

    #[cfg(feature = "proj-transforms")]
    #[test]
    fn test_proj_engine_drives_an_adapter_on_the_swiss_grid() {
        use crate::config::ReferenceSystemConfig;
        use crate::core::coordinates::CoordinateAdapter;
        use crate::core::geodesy::GeographicPoint;

        let runtime = Runtime::headless().with_proj();
        let config = ReferenceSystemConfig::code("EPSG:2056").with_definition(
            "+proj=somerc +lat_0=46.9524055555556 +lon_0=7.43958333333333 +k_0=1 \
             +x_0=2600000 +y_0=1200000 +ellps=bessel +towgs84=674.374,15.056,405.346,0,0,0,0 \
             +units=m +no_defs",
        );
        let mut adapter =
            CoordinateAdapter::new(config, Some(GeographicPoint::new(46.948, 7.4474, 540.0)), None);
        pollster::block_on(adapter.initialize(&runtime)).unwrap();

        assert_eq!(adapter.projection().unwrap().name(), "somerc");
        assert!(adapter.is_locally_cartesian());
        let projected = adapter.origin().unwrap().projected();
        assert!((projected.x - 2_600_600.0).abs() < 200.0);
        assert!(runtime.crs().contains("EPSG:2056"));
    }
}
