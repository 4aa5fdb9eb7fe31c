//! Normalized pointer events and their subscribers

use super::PresenterMode;
use crate::core::geodesy::GeographicPoint;
use crate::core::scene::DisplayHandle;
use crate::input::{PointerAction, PointerInput};
use glam::DVec3;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerEventKind {
    Select,
    Hover,
    PointerDown,
    PointerUp,
    PointerCancel,
    PointerEnter,
    PointerLeave,
    Wheel,
}

impl PointerEventKind {
    pub const ALL: [PointerEventKind; 8] = [
        PointerEventKind::Select,
        PointerEventKind::Hover,
        PointerEventKind::PointerDown,
        PointerEventKind::PointerUp,
        PointerEventKind::PointerCancel,
        PointerEventKind::PointerEnter,
        PointerEventKind::PointerLeave,
        PointerEventKind::Wheel,
    ];

    /// Click-like events are not emitted for a null pick unless asked for
    pub fn is_click_like(self) -> bool {
        matches!(
            self,
            PointerEventKind::Select | PointerEventKind::PointerDown | PointerEventKind::PointerUp
        )
    }

    /// Event kinds produced by one device event
    pub fn for_input(input: &PointerInput) -> Vec<PointerEventKind> {
        match input.action {
            PointerAction::Moved => vec![PointerEventKind::Hover],
            PointerAction::Pressed => vec![PointerEventKind::PointerDown],
            PointerAction::Released if input.is_click => {
                vec![PointerEventKind::PointerUp, PointerEventKind::Select]
            }
            PointerAction::Released => vec![PointerEventKind::PointerUp],
            PointerAction::Wheel => vec![PointerEventKind::Wheel],
            PointerAction::Cancelled => vec![PointerEventKind::PointerCancel],
            PointerAction::Entered => vec![PointerEventKind::PointerEnter],
            PointerAction::Left => vec![PointerEventKind::PointerLeave],
        }
    }
}

/// What a pointer event reports, identical across presenters
#[derive(Debug, Clone, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerEventKind,
    /// Hit point in the presenter's scene frame
    pub point: Option<DVec3>,
    pub geographic: Option<GeographicPoint>,
    /// Entity content that was hit, never a wrapper
    pub handle: Option<DisplayHandle>,
    /// Distance from the camera along the pick ray
    pub distance: Option<f64>,
    pub device: PointerInput,
    pub mode: PresenterMode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscribeOptions {
    pub kinds: HashSet<PointerEventKind>,
    /// Deliver click-like events that hit nothing
    pub emit_on_empty_pick: bool,
}

impl Default for SubscribeOptions {
    fn default() -> Self {
        Self::all()
    }
}

impl SubscribeOptions {
    pub fn all() -> Self {
        Self::only(PointerEventKind::ALL)
    }

    pub fn only(kinds: impl IntoIterator<Item = PointerEventKind>) -> Self {
        Self {
            kinds: kinds.into_iter().collect(),
            emit_on_empty_pick: false,
        }
    }

    pub fn emit_on_empty_pick(mut self, emit: bool) -> Self {
        self.emit_on_empty_pick = emit;
        self
    }

    pub fn accepts(&self, event: &PointerEvent) -> bool {
        self.kinds.contains(&event.kind)
            && (event.handle.is_some() || !event.kind.is_click_like() || self.emit_on_empty_pick)
    }
}

pub type PointerListener = Rc<RefCell<dyn FnMut(&PointerEvent)>>;

/// Wrap a closure as a listener
pub fn listener(callback: impl FnMut(&PointerEvent) + 'static) -> PointerListener {
    Rc::new(RefCell::new(callback))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

struct Subscriber {
    id: SubscriptionId,
    options: SubscribeOptions,
    listener: PointerListener,
}

/// Subscribers of one presenter
#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    subscribers: Vec<Subscriber>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, options: SubscribeOptions, listener: PointerListener) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.subscribers.push(Subscriber {
            id,
            options,
            listener,
        });
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|s| s.id != id);
        self.subscribers.len() != before
    }

    /// Deliver to every accepting subscriber; returns how many received it
    pub fn emit(&self, event: &PointerEvent) -> usize {
        let mut delivered = 0;
        for subscriber in &self.subscribers {
            if !subscriber.options.accepts(event) {
                continue;
            }
            // A listener that re-enters its own delivery is skipped
            match subscriber.listener.try_borrow_mut() {
                Ok(mut callback) => {
                    (&mut *callback)(event);
                    delivered += 1;
                }
                Err(_) => trace!(id = subscriber.id.0, "Listener busy; event skipped"),
            }
        }
        delivered
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    pub fn clear(&mut self) {
        self.subscribers.clear();
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
