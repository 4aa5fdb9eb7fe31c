//! Origin-relative coordinate handling
//!
//! The renderer works in a local tangent plane (East-North-Up) centered on a
//! movable origin, which keeps scene coordinates small enough for f32 GPU
//! buffers. [`CoordinateAdapter`] owns that origin and converts between the
//! tangent plane, geographic coordinates and the projected reference system.

mod adapter;
mod extent;
mod origin;


pub use adapter::{
    resolve_definition, AdapterStats, CoordinateAdapter, OriginShift, CONVERGENCE_WARNING_DEG,
};
pub use extent::{normalize_extent, Extent};
pub use origin::OriginFrame;
