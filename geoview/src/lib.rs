//! Geospatial viewer core
//!
//! This crate keeps one shared scene of addressable entities and shows it
//! through interchangeable presenters (immersive and map). It provides the
//! geodetic and projection math, the origin-relative coordinate adapter,
//! the presenter lifecycle, and runtime mode switching that preserves
//! entity identity.

pub mod config;
pub mod core;
pub mod error;
pub mod input;
pub mod layers;
pub mod presenter;
pub mod runtime;
pub mod viewer;

// Re-export commonly used types
pub mod prelude {
    // Coordinates
    pub use crate::core::coordinates::{CoordinateAdapter, Extent, OriginFrame};
    pub use crate::core::geodesy::{Checked, GeographicPoint};

    // Scene types
    pub use crate::core::camera::{Camera, ProjectionMode};
    pub use crate::core::identity::EntityId;
    pub use crate::core::scene::{
        AxisConvention, Bounds, ContentFrame, DisplayHandle, SceneGraph, Transform,
    };

    // Config types
    pub use crate::config::{ConfigOverrides, ReferenceSystemConfig, ViewerConfig};

    // Presenter types
    pub use crate::presenter::{
        listener, AddOptions, Container, FitOptions, FlyToOptions, PointerEvent,
        PointerEventKind, Presenter, PresenterMode, PresenterState, SubscribeOptions,
    };

    // Viewer types
    pub use crate::viewer::{Viewer, ViewerBuilder};

    pub use crate::error::{Result, ViewerError};
    pub use crate::input::{PointerAction, PointerInput, PointerState};
    pub use crate::layers::LayerConfig;
    pub use crate::runtime::Runtime;

    // Math types
    pub use glam::{DQuat, DVec2, DVec3};

    pub use winit;
}

/// Initialize logging for the viewer
pub fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
