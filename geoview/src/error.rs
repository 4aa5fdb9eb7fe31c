//! Error types
//!
//! Configuration, lifecycle and external-resource failures are separate
//! enums so callers can match on the concern; [`ViewerError`] unifies them
//! for the viewer-facing API. Numeric degeneracy is not an error, see
//! [`crate::core::geodesy::Checked`].

use crate::core::identity::EntityId;
use crate::core::scene::DisplayHandle;
use crate::presenter::{PresenterMode, PresenterState};

/// Failure to turn a definition string into a projection
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProjectionError {
    #[error("definition has no +proj parameter")]
    MissingProjection,

    #[error("unsupported projection '{0}'")]
    UnsupportedProjection(String),

    #[error("unsupported units '{0}', only metres are supported")]
    UnsupportedUnits(String),

    #[error("invalid value '{value}' for parameter +{key}")]
    InvalidParameter { key: String, value: String },

    #[error("unknown ellipsoid or datum '{0}'")]
    UnknownEllipsoid(String),

    #[error("UTM zone must be between 1 and 60, got {0}")]
    InvalidZone(i64),

    #[error("projection backend rejected the definition: {0}")]
    Backend(String),
}

/// Invalid or incomplete configuration
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("no reference system configured (required for map mode)")]
    MissingReferenceSystem,

    #[error("no initial extent configured (required for map mode)")]
    MissingExtent,

    #[error("reference system '{0}' could not be resolved")]
    UnresolvedReferenceSystem(String),

    #[error("reference system '{code}' is already registered with a different definition")]
    ConflictingDefinition {
        code: String,
        existing: String,
        requested: String,
    },

    #[error("invalid definition for '{code}': {source}")]
    InvalidDefinition {
        code: String,
        #[source]
        source: ProjectionError,
    },

    #[error("invalid extent: {0}")]
    InvalidExtent(String),

    #[error("invalid origin: {0}")]
    InvalidOrigin(String),

    #[error("invalid layer '{name}': {reason}")]
    InvalidLayer { name: String, reason: String },

    #[error("no builder registered for layer kind '{0}'")]
    UnknownLayerKind(String),

    #[error("failed to read config: {0}")]
    Io(String),

    #[error("failed to parse config: {0}")]
    Parse(String),
}

/// Operation attempted in the wrong lifecycle state
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StateError {
    #[error("cannot {operation} a presenter that is {state}")]
    InvalidTransition {
        operation: &'static str,
        state: PresenterState,
    },

    #[error("coordinate adapter used before initialization")]
    NotInitialized,

    #[error("presenter has been disposed")]
    Disposed,

    #[error("a mode switch is already in progress")]
    SwitchInProgress,

    #[error("no active presenter")]
    NoActivePresenter,

    #[error("render surface is already claimed by {owner}")]
    SurfaceInUse { owner: String },

    #[error("display handle {0} is not attached")]
    NotAttached(DisplayHandle),

    #[error("display handle {0} is already attached")]
    AlreadyAttached(DisplayHandle),

    #[error("unknown display handle {0}")]
    UnknownHandle(DisplayHandle),

    #[error("attaching {0} would create a cycle")]
    CyclicHierarchy(DisplayHandle),

    #[error("entity {0} already has a display handle")]
    EntityAlreadyMapped(EntityId),

    #[error("unknown entity {0}")]
    UnknownEntity(EntityId),
}

/// An external resource (back-end, definition service) failed
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResourceError {
    #[error(
        "{backend} back-end is unavailable: {reason}; \
         query CapabilityProbe::available_modes() before switching"
    )]
    Unavailable {
        backend: PresenterMode,
        reason: String,
    },

    #[error("failed to fetch definition for '{code}': {reason}")]
    DefinitionFetch { code: String, reason: String },

    #[error("container '{container}' cannot provide a render surface")]
    SurfaceUnavailable { container: String },
}

/// Per-frame failure; logged and the frame or event is skipped
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FrameError {
    #[error("degenerate camera: {0}")]
    DegenerateCamera(&'static str),

    #[error("render failed: {0}")]
    Render(String),
}

/// Umbrella error of the viewer-facing API
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ViewerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Resource(#[from] ResourceError),

    #[error("switch to {target} failed (previous presenter restored: {restored}): {source}")]
    SwitchFailed {
        target: PresenterMode,
        restored: bool,
        #[source]
        source: Box<ViewerError>,
    },
}

impl ViewerError {
    /// Whether this is a state error of the given shape
    pub fn is_state(&self, expected: &StateError) -> bool {
        matches!(self, ViewerError::State(actual) if actual == expected)
    }
}

pub type Result<T, E = ViewerError> = std::result::Result<T, E>;
