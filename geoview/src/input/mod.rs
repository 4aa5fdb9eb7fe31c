//! Device input normalization

mod pointer;

pub use pointer::{PointerAction, PointerInput, PointerState, CLICK_TOLERANCE_PX, LINE_HEIGHT_PX};
