//! Stateful coordinate adapter
//!
//! Owns the active projection and the [`OriginFrame`], and exposes every
//! origin-relative conversion the presenters need. The origin can be
//! rebased at runtime; a bounded history of rebases is kept for debugging.

use super::extent::Extent;
use super::origin::OriginFrame;
use crate::config::{RebaseConfig, ReferenceSystemConfig};
use crate::core::geodesy::{Checked, DegeneracyReason, GeographicPoint};
use crate::core::projection::{normalize_code, well_known_definition, Projection};
use crate::error::{ConfigError, StateError, ViewerError};
use crate::runtime::Runtime;
use glam::{DVec2, DVec3};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Grid convergence (degrees) at the origin above which a warning is logged
pub const CONVERGENCE_WARNING_DEG: f64 = 2.0;

const HISTORY_LIMIT: usize = 100;
const HISTORY_DRAIN: usize = 50;

/// Record of one origin rebase
#[derive(Debug, Clone)]
pub struct OriginShift {
    pub at: Instant,
    pub previous: GeographicPoint,
    pub current: GeographicPoint,
    /// Straight-line distance between the two origins in metres
    pub distance: f64,
}

/// Snapshot of the adapter's state
#[derive(Debug, Clone)]
pub struct AdapterStats {
    pub reference_system: Option<String>,
    pub origin: Option<GeographicPoint>,
    pub locally_cartesian: bool,
    pub grid_convergence: Option<f64>,
    pub rebases_recorded: usize,
    pub rebase_enabled: bool,
    pub rebase_threshold: f64,
}

struct Active {
    code: String,
    projection: Box<dyn Projection>,
    frame: OriginFrame,
}

/// Origin-relative conversions between geographic, projected and
/// tangent-plane (ENU) coordinates
pub struct CoordinateAdapter {
    reference_system: ReferenceSystemConfig,
    initial_origin: Option<GeographicPoint>,
    initial_extent: Option<Extent>,
    rebase: RebaseConfig,
    active: Option<Active>,
    history: Vec<OriginShift>,
}

impl CoordinateAdapter {
    /// Create an uninitialized adapter
    ///
    /// When no origin is given, the center of `extent` becomes the origin.
    pub fn new(
        reference_system: ReferenceSystemConfig,
        origin: Option<GeographicPoint>,
        extent: Option<Extent>,
    ) -> Self {
        Self {
            reference_system,
            initial_origin: origin,
            initial_extent: extent,
            rebase: RebaseConfig::default(),
            active: None,
            history: Vec::new(),
        }
    }

    pub fn with_rebase(mut self, rebase: RebaseConfig) -> Self {
        self.rebase = rebase;
        self
    }

    /// Resolve the reference system and compute the initial origin frame
    ///
    /// Resolution order: the configured definition, the runtime registry,
    /// well-known EPSG codes, then the runtime's asynchronous resolver. The
    /// resolved definition is registered with the runtime. Re-initializing an
    /// already initialized adapter keeps the current origin.
    pub async fn initialize(&mut self, runtime: &Runtime) -> Result<(), ConfigError> {
        let definition = resolve_definition(&self.reference_system, runtime).await?;
        self.initialize_with(&definition, runtime)
    }

    /// Synchronous half of [`initialize`](Self::initialize), for a definition
    /// already obtained through [`resolve_definition`]
    pub fn initialize_with(&mut self, definition: &str, runtime: &Runtime) -> Result<(), ConfigError> {
        let code = normalize_code(&self.reference_system.code);
        let projection = runtime
            .projections()
            .create(definition)
            .map_err(|source| ConfigError::InvalidDefinition {
                code: code.clone(),
                source,
            })?;
        runtime.crs_mut().register(&code, definition)?;

        let origin = match &self.active {
            Some(active) => active.frame.geographic(),
            None => self.seed_origin(&code, projection.as_ref(), runtime)?,
        };
        let frame = OriginFrame::new(origin, projection.as_ref())?;

        info!(
            code = %code,
            projection = projection.name(),
            origin = %origin,
            "Coordinate adapter initialized"
        );
        warn_on_convergence(projection.as_ref(), &origin);

        self.active = Some(Active {
            code,
            projection,
            frame,
        });
        Ok(())
    }

    /// Replace the reference system; takes effect at the next [`initialize`](Self::initialize)
    pub fn set_reference_system(&mut self, reference_system: ReferenceSystemConfig) {
        self.reference_system = reference_system;
    }

    pub fn reference_system(&self) -> &ReferenceSystemConfig {
        &self.reference_system
    }

    /// Whether the active code differs from the configured one
    pub fn needs_reinitialize(&self) -> bool {
        match &self.active {
            Some(active) => active.code != normalize_code(&self.reference_system.code),
            None => true,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.active.is_some()
    }

    fn active(&self) -> Result<&Active, StateError> {
        self.active.as_ref().ok_or(StateError::NotInitialized)
    }

    pub fn code(&self) -> Result<&str, StateError> {
        Ok(&self.active()?.code)
    }

    pub fn origin(&self) -> Result<&OriginFrame, StateError> {
        Ok(&self.active()?.frame)
    }

    pub fn projection(&self) -> Result<&dyn Projection, StateError> {
        Ok(self.active()?.projection.as_ref())
    }

    /// Move the origin; returns the frame that was replaced
    pub fn set_origin(&mut self, origin: GeographicPoint) -> Result<OriginFrame, ViewerError> {
        let active = self.active.as_mut().ok_or(StateError::NotInitialized)?;
        let frame = OriginFrame::new(origin, active.projection.as_ref())?;
        let previous = std::mem::replace(&mut active.frame, frame);

        let distance = previous.distance_to(&frame);
        info!(
            previous = %previous.geographic(),
            current = %origin,
            distance_m = distance,
            "Origin rebased"
        );
        warn_on_convergence(active.projection.as_ref(), &origin);

        self.history.push(OriginShift {
            at: Instant::now(),
            previous: previous.geographic(),
            current: origin,
            distance,
        });
        if self.history.len() > HISTORY_LIMIT {
            self.history.drain(..HISTORY_DRAIN);
        }

        Ok(previous)
    }

    /// Put back a frame returned by [`set_origin`](Self::set_origin) and drop
    /// the history entry that move recorded
    pub fn restore_origin(&mut self, frame: OriginFrame) -> Result<(), StateError> {
        let active = self.active.as_mut().ok_or(StateError::NotInitialized)?;
        let abandoned = std::mem::replace(&mut active.frame, frame);
        if self
            .history
            .last()
            .is_some_and(|shift| shift.current == abandoned.geographic())
        {
            self.history.pop();
        }
        warn!(
            restored = %frame.geographic(),
            abandoned = %abandoned.geographic(),
            "Origin rebase rolled back"
        );
        Ok(())
    }

    pub fn geographic_to_enu(&self, point: &GeographicPoint) -> Result<Checked<DVec3>, StateError> {
        Ok(self.origin()?.geographic_to_enu(point))
    }

    pub fn enu_to_geographic(&self, enu: DVec3) -> Result<Checked<GeographicPoint>, StateError> {
        Ok(self.origin()?.enu_to_geographic(enu))
    }

    /// Origin independent
    pub fn geographic_to_projected(&self, point: &GeographicPoint) -> Result<Checked<DVec2>, StateError> {
        Ok(self.projection()?.forward(point))
    }

    /// Origin independent; the returned height is zero
    pub fn projected_to_geographic(&self, projected: DVec2) -> Result<Checked<GeographicPoint>, StateError> {
        Ok(self.projection()?.inverse(projected))
    }

    /// ENU → projected `(easting, northing, height)`
    ///
    /// Translation only: the tangent plane is assumed to coincide with the
    /// projected grid near the origin. Grid convergence and scale error are
    /// ignored; for non-metric systems the result is flagged unreliable.
    pub fn enu_to_projected(&self, enu: DVec3) -> Result<Checked<DVec3>, StateError> {
        let active = self.active()?;
        let origin = &active.frame;
        let projected = DVec3::new(
            origin.projected().x + enu.x,
            origin.projected().y + enu.y,
            origin.height() + enu.z,
        );
        Ok(flag_non_metric(active, projected))
    }

    /// Projected `(easting, northing, height)` → ENU, translation only
    pub fn projected_to_enu(&self, projected: DVec3) -> Result<Checked<DVec3>, StateError> {
        let active = self.active()?;
        let origin = &active.frame;
        let enu = DVec3::new(
            projected.x - origin.projected().x,
            projected.y - origin.projected().y,
            projected.z - origin.height(),
        );
        Ok(flag_non_metric(active, enu))
    }

    /// Whether ENU and projected offsets can be exchanged by translation
    pub fn is_locally_cartesian(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| active.projection.is_metric())
    }

    /// Grid convergence at the origin in degrees
    pub fn grid_convergence(&self) -> Result<f64, StateError> {
        let active = self.active()?;
        Ok(active.projection.grid_convergence(&active.frame.geographic()))
    }

    /// Whether the camera has moved far enough from the origin to rebase
    pub fn should_rebase(&self, distance_from_origin: f64) -> bool {
        self.rebase.enabled && self.is_initialized() && distance_from_origin > self.rebase.threshold
    }

    pub fn rebase_config(&self) -> RebaseConfig {
        self.rebase
    }

    pub fn set_rebase_config(&mut self, rebase: RebaseConfig) {
        debug!(enabled = rebase.enabled, threshold = rebase.threshold, "Rebase policy updated");
        self.rebase = rebase;
    }

    pub fn history(&self) -> &[OriginShift] {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn stats(&self) -> AdapterStats {
        AdapterStats {
            reference_system: self.active.as_ref().map(|active| active.code.clone()),
            origin: self.active.as_ref().map(|active| active.frame.geographic()),
            locally_cartesian: self.is_locally_cartesian(),
            grid_convergence: self.grid_convergence().ok(),
            rebases_recorded: self.history.len(),
            rebase_enabled: self.rebase.enabled,
            rebase_threshold: self.rebase.threshold,
        }
    }

    fn seed_origin(
        &self,
        code: &str,
        projection: &dyn Projection,
        runtime: &Runtime,
    ) -> Result<GeographicPoint, ConfigError> {
        if let Some(origin) = self.initial_origin {
            return Ok(origin);
        }
        let extent = self.initial_extent.as_ref().ok_or_else(|| {
            ConfigError::InvalidOrigin("neither an origin nor an extent is configured".to_string())
        })?;
        extent.validate()?;

        let center = extent.center();
        let origin = match &extent.reference_system {
            Some(tag) if normalize_code(tag) != code => {
                let source = runtime.projection_for(tag)?;
                if source.is_metric() {
                    source.inverse(center)
                } else {
                    Checked::reliable(GeographicPoint::new(center.y, center.x, 0.0))
                }
            }
            Some(_) => projection.inverse(center),
            None if extent.is_geographic(projection) => {
                Checked::reliable(GeographicPoint::new(center.y, center.x, 0.0))
            }
            None => projection.inverse(center),
        };

        if !origin.is_reliable() || !origin.value.is_valid() {
            return Err(ConfigError::InvalidOrigin(format!(
                "extent center ({}, {}) does not map to a usable origin ({:?})",
                center.x, center.y, origin.reliability
            )));
        }
        debug!(origin = %origin.value, "Origin derived from extent center");
        Ok(origin.value)
    }
}

impl std::fmt::Debug for CoordinateAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoordinateAdapter")
            .field("reference_system", &self.reference_system)
            .field("origin", &self.active.as_ref().map(|a| a.frame.geographic()))
            .field("rebase", &self.rebase)
            .finish()
    }
}

fn flag_non_metric(active: &Active, value: DVec3) -> Checked<DVec3> {
    let checked = if value.is_finite() {
        Checked::reliable(value)
    } else {
        Checked::unreliable(value, DegeneracyReason::NonFinite)
    };
    if active.projection.is_metric() {
        checked
    } else {
        checked.flag(DegeneracyReason::NonMetricProjection)
    }
}

fn warn_on_convergence(projection: &dyn Projection, origin: &GeographicPoint) {
    let convergence = projection.grid_convergence(origin);
    if convergence.abs() > CONVERGENCE_WARNING_DEG {
        warn!(
            convergence_deg = convergence,
            origin = %origin,
            "Grid convergence at origin is large; tangent-plane and projected axes diverge"
        );
    }
}

/// Find the definition string for a configured reference system
///
/// Resolution order: the configured definition, the runtime registry,
/// well-known EPSG codes, then the runtime's asynchronous resolver.
pub async fn resolve_definition(
    reference_system: &ReferenceSystemConfig,
    runtime: &Runtime,
) -> Result<String, ConfigError> {
    let code = normalize_code(&reference_system.code);

    if let Some(definition) = &reference_system.definition {
        return Ok(definition.clone());
    }
    if let Some(registered) = runtime.crs().get(&code) {
        return Ok(registered.definition.clone());
    }
    if let Some(definition) = well_known_definition(&code) {
        debug!(code = %code, "Using well-known definition");
        return Ok(definition);
    }

    match runtime.resolver().resolve(&code).await {
        Ok(Some(definition)) => Ok(definition),
        Ok(None) => Err(ConfigError::UnresolvedReferenceSystem(code)),
        Err(error) => {
            warn!(code = %code, error = %error, "Definition lookup failed");
            Err(ConfigError::UnresolvedReferenceSystem(code))
        }
    }
}
