//! Optional diagnostics hooks
//!
//! Registered when a presenter is constructed. Every hook has an empty
//! default so implementors only override what they watch.

use super::{FrameStats, PresenterMode, PresenterState};
use crate::core::scene::DisplayHandle;
use crate::presenter::picking::PickHit;

pub trait Instrumentation {
    fn on_state_change(&self, _mode: PresenterMode, _from: PresenterState, _to: PresenterState) {}

    /// Visibility decision for one entity node during a render
    fn on_visibility(&self, _mode: PresenterMode, _handle: DisplayHandle, _visible: bool) {}

    fn on_pick(&self, _mode: PresenterMode, _hit: Option<&PickHit>) {}

    fn on_frame(&self, _mode: PresenterMode, _stats: &FrameStats) {}
}

/// Counts hook calls; handy in tests and the demo
#[derive(Debug, Default)]
pub struct CountingInstrumentation {
    pub state_changes: std::cell::Cell<usize>,
    pub visibility_checks: std::cell::Cell<usize>,
    pub picks: std::cell::Cell<usize>,
    pub frames: std::cell::Cell<usize>,
}

impl Instrumentation for CountingInstrumentation {
    fn on_state_change(&self, _mode: PresenterMode, _from: PresenterState, _to: PresenterState) {
        self.state_changes.set(self.state_changes.get() + 1);
    }

    fn on_visibility(&self, _mode: PresenterMode, _handle: DisplayHandle, _visible: bool) {
        self.visibility_checks.set(self.visibility_checks.get() + 1);
    }

    fn on_pick(&self, _mode: PresenterMode, _hit: Option<&PickHit>) {
        self.picks.set(self.picks.get() + 1);
    }

    fn on_frame(&self, _mode: PresenterMode, _stats: &FrameStats) {
        self.frames.set(self.frames.get() + 1);
    }
}
