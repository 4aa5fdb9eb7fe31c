//! Pointer state tracking
//!
//! Turns raw winit device events into [`PointerInput`] records that
//! presenters hit-test and translate into pointer events.

use glam::DVec2;
use std::collections::HashMap;
use tracing::trace;
use winit::event::{ElementState, MouseButton, MouseScrollDelta};
use winit::keyboard::ModifiersState;

/// Pixels per scrolled line for line-based wheels
pub const LINE_HEIGHT_PX: f64 = 20.0;

/// Maximum travel between press and release for a click
pub const CLICK_TOLERANCE_PX: f64 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerAction {
    Moved,
    Pressed,
    Released,
    Wheel,
    Cancelled,
    Entered,
    Left,
}

/// One device event in window coordinates, with the state around it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerInput {
    pub action: PointerAction,
    /// Window position in physical pixels, origin top left
    pub position: DVec2,
    pub button: Option<MouseButton>,
    pub modifiers: ModifiersState,
    pub pointer_id: u64,
    /// Scroll amount in pixels (wheel only)
    pub scroll: DVec2,
    /// Release close enough to its press to count as a click
    pub is_click: bool,
}

impl PointerInput {
    pub fn new(action: PointerAction, position: DVec2) -> Self {
        Self {
            action,
            position,
            button: None,
            modifiers: ModifiersState::empty(),
            pointer_id: 0,
            scroll: DVec2::ZERO,
            is_click: false,
        }
    }

    pub fn with_button(mut self, button: MouseButton) -> Self {
        self.button = Some(button);
        self
    }

    pub fn with_modifiers(mut self, modifiers: ModifiersState) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_scroll(mut self, scroll: DVec2) -> Self {
        self.scroll = scroll;
        self
    }

    pub fn with_click(mut self, is_click: bool) -> Self {
        self.is_click = is_click;
        self
    }

    /// A left-button click at `position`
    pub fn click(position: DVec2) -> Self {
        Self::new(PointerAction::Released, position)
            .with_button(MouseButton::Left)
            .with_click(true)
    }
}

/// Tracks the pointer across device events
#[derive(Debug, Clone, Default)]
pub struct PointerState {
    position: DVec2,
    inside: bool,
    modifiers: ModifiersState,
    /// Pressed buttons and where they went down
    pressed: HashMap<MouseButton, DVec2>,
    pointer_id: u64,
}

impl PointerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> DVec2 {
        self.position
    }

    pub fn is_inside(&self) -> bool {
        self.inside
    }

    pub fn is_button_pressed(&self, button: MouseButton) -> bool {
        self.pressed.contains_key(&button)
    }

    pub fn set_modifiers(&mut self, modifiers: ModifiersState) {
        self.modifiers = modifiers;
    }

    fn input(&self, action: PointerAction) -> PointerInput {
        PointerInput {
            pointer_id: self.pointer_id,
            ..PointerInput::new(action, self.position).with_modifiers(self.modifiers)
        }
    }

    pub fn cursor_moved(&mut self, x: f64, y: f64) -> PointerInput {
        self.position = DVec2::new(x, y);
        self.inside = true;
        self.input(PointerAction::Moved)
    }

    pub fn cursor_entered(&mut self) -> PointerInput {
        self.inside = true;
        self.input(PointerAction::Entered)
    }

    /// Leaving the window forgets pressed buttons
    pub fn cursor_left(&mut self) -> PointerInput {
        self.inside = false;
        self.pressed.clear();
        self.input(PointerAction::Left)
    }

    pub fn mouse_button(&mut self, button: MouseButton, state: ElementState) -> PointerInput {
        match state {
            ElementState::Pressed => {
                self.pressed.insert(button, self.position);
                trace!(?button, "Pointer button pressed");
                self.input(PointerAction::Pressed).with_button(button)
            }
            ElementState::Released => {
                let is_click = self
                    .pressed
                    .remove(&button)
                    .is_some_and(|down| down.distance(self.position) <= CLICK_TOLERANCE_PX);
                trace!(?button, is_click, "Pointer button released");
                self.input(PointerAction::Released)
                    .with_button(button)
                    .with_click(is_click)
            }
        }
    }

    pub fn mouse_wheel(&mut self, delta: MouseScrollDelta) -> PointerInput {
        let scroll = match delta {
            MouseScrollDelta::LineDelta(x, y) => DVec2::new(x as f64, y as f64) * LINE_HEIGHT_PX,
            MouseScrollDelta::PixelDelta(position) => DVec2::new(position.x, position.y),
        };
        self.input(PointerAction::Wheel).with_scroll(scroll)
    }

    /// The platform took the pointer away (focus loss, touch cancel)
    pub fn cancel(&mut self) -> PointerInput {
        self.pressed.clear();
        self.input(PointerAction::Cancelled)
    }
}
