//! Presenters: interchangeable back-ends that display the shared scene
//!
//! Every presenter follows the same lifecycle and exposes the same
//! capability surface, so the viewer can swap them at runtime. Shared
//! behavior lives in [`PresenterCore`]; the back-ends differ in scene frame,
//! camera, render policy and the operations only one of them supports.

mod capability;
mod common;
pub mod events;
mod factory;
mod immersive;
mod instrumentation;
mod lifecycle;
mod map;
pub mod navigation;
pub mod picking;
mod surface;

pub use capability::{CapabilityProbe, HeadlessHost, HostEnvironment};
pub use common::PresenterCore;
pub use events::{
    listener, EventBus, PointerEvent, PointerEventKind, PointerListener, SubscribeOptions,
    SubscriptionId,
};
pub use factory::PresenterFactory;
pub use immersive::ImmersivePresenter;
pub use instrumentation::{CountingInstrumentation, Instrumentation};
pub use lifecycle::{DisposeSignal, Lifecycle, PresenterState};
pub use map::MapPresenter;
pub use navigation::{FitOptions, FlyToOptions};
pub use picking::{PickHit, Ray};
pub use surface::{Container, RenderSurface};

use crate::config::{Lighting, ViewerConfig};
use crate::core::camera::Camera;
use crate::core::coordinates::{CoordinateAdapter, Extent, OriginFrame};
use crate::core::geodesy::{Checked, GeographicPoint};
use crate::core::scene::{ContentFrame, DisplayHandle, Entity, SceneGraph};
use crate::error::{FrameError, Result, StateError};
use crate::input::PointerInput;
use crate::layers::{Layer, LayerConfig, LayerId};
use crate::runtime::Runtime;
use async_trait::async_trait;
use glam::{DQuat, DVec2, DVec3};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenterMode {
    /// Stereo first-person view in a Y-up tangent-plane scene
    #[default]
    Immersive,
    /// Tiled 2.5D map in a Z-up projected scene
    Map,
}

impl PresenterMode {
    pub const ALL: [PresenterMode; 2] = [PresenterMode::Immersive, PresenterMode::Map];
}

impl fmt::Display for PresenterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PresenterMode::Immersive => f.write_str("immersive"),
            PresenterMode::Map => f.write_str("map"),
        }
    }
}

/// How a node is added under the content root
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AddOptions {
    /// Content is already positioned in the presenter's scene frame
    pub native_frame: bool,
    /// Center of tangent-plane content; the current origin when absent
    pub anchor: Option<GeographicPoint>,
}

impl AddOptions {
    pub fn native() -> Self {
        Self {
            native_frame: true,
            anchor: None,
        }
    }

    pub fn wrapped() -> Self {
        Self::default()
    }

    pub fn wrapped_at(anchor: GeographicPoint) -> Self {
        Self {
            native_frame: false,
            anchor: Some(anchor),
        }
    }
}

/// Presenter-independent record of where a detached node was
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    /// Tangent-plane content centered on `anchor`
    Wrapped { anchor: GeographicPoint },
    /// Natively placed node, its pose expressed in world terms
    Native {
        geographic: GeographicPoint,
        /// Rotation taking node-local vectors into ENU at the origin
        enu_rotation: DQuat,
    },
}

/// A node taken off a content root, in the order it was attached
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetachedNode {
    pub handle: DisplayHandle,
    pub placement: Placement,
}

/// Renderer description exposed to callers
#[derive(Debug, Clone, PartialEq)]
pub struct RendererInfo {
    pub backend: &'static str,
    /// Renders every frame rather than on damage
    pub continuous: bool,
    pub background: [f32; 4],
    pub shadows: bool,
    pub lighting: Lighting,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStats {
    pub mode: PresenterMode,
    pub frame: u64,
    /// False when an on-demand presenter had nothing to redraw
    pub rendered: bool,
    pub visible: usize,
    pub culled: usize,
    pub duration: Duration,
}

/// Frame pacing requested by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderLoop {
    pub target_fps: u32,
}

impl Default for RenderLoop {
    fn default() -> Self {
        Self { target_fps: 60 }
    }
}

impl RenderLoop {
    pub fn frame_budget(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.target_fps.max(1) as f64)
    }
}

/// Shared state every presenter works against
#[derive(Clone)]
pub struct PresenterContext {
    pub graph: Rc<RefCell<SceneGraph>>,
    pub adapter: Rc<RefCell<CoordinateAdapter>>,
    pub runtime: Rc<Runtime>,
    pub instrumentation: Option<Rc<dyn Instrumentation>>,
}

impl PresenterContext {
    pub fn new(
        graph: Rc<RefCell<SceneGraph>>,
        adapter: Rc<RefCell<CoordinateAdapter>>,
        runtime: Rc<Runtime>,
    ) -> Self {
        Self {
            graph,
            adapter,
            runtime,
            instrumentation: None,
        }
    }

    pub fn with_instrumentation(mut self, instrumentation: Rc<dyn Instrumentation>) -> Self {
        self.instrumentation = Some(instrumentation);
        self
    }
}

impl fmt::Debug for PresenterContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PresenterContext")
            .field("nodes", &self.graph.borrow().len())
            .field("adapter", &self.adapter)
            .field("instrumented", &self.instrumentation.is_some())
            .finish()
    }
}

/// Contract every back-end fulfils
///
/// Back-ends provide [`core`](Presenter::core) and the operations whose
/// meaning differs between them; everything else is shared.
#[async_trait(?Send)]
pub trait Presenter {
    fn core(&self) -> &PresenterCore;

    fn core_mut(&mut self) -> &mut PresenterCore;

    fn mode(&self) -> PresenterMode {
        self.core().mode()
    }

    fn state(&self) -> PresenterState {
        self.core().state()
    }

    /// Uninitialized → Ready; claims the container's surface
    async fn initialize(&mut self, container: Rc<Container>, config: &ViewerConfig) -> Result<()>;

    /// Ready → Running
    fn start(&mut self, render_loop: RenderLoop) -> Result<()> {
        self.core_mut().start(render_loop)
    }

    fn pause(&mut self) -> Result<(), StateError> {
        self.core_mut().pause()
    }

    fn resume(&mut self) -> Result<(), StateError> {
        self.core_mut().resume()
    }

    /// Running/Paused → Ready
    fn stop(&mut self) -> Result<(), StateError> {
        self.core_mut().stop()
    }

    /// Give up the render surface without changing state
    fn release_surface(&mut self) {
        self.core_mut().release_surface()
    }

    /// Any state → Disposed; attached content is detached, not destroyed
    fn dispose(&mut self) -> Result<(), StateError> {
        self.core_mut().dispose()
    }

    fn dispose_signal(&self) -> DisposeSignal {
        self.core().signal()
    }

    fn surface(&self) -> Option<&RenderSurface> {
        self.core().surface()
    }

    fn camera(&self) -> &Camera {
        self.core().camera()
    }

    fn camera_mut(&mut self) -> &mut Camera {
        self.core_mut().camera_mut()
    }

    fn renderer(&self) -> &RendererInfo {
        self.core().renderer()
    }

    fn content_root(&self) -> Result<Entity, StateError> {
        self.core().content_root()
    }

    fn content_frame(&self) -> ContentFrame {
        self.core().content_frame()
    }

    fn add_object(&mut self, handle: DisplayHandle, options: AddOptions) -> Result<()> {
        self.core_mut().add_object(handle, options)?;
        self.notify_change();
        Ok(())
    }

    fn remove_object(&mut self, handle: DisplayHandle) -> Result<DetachedNode> {
        let detached = self.core_mut().remove_object(handle)?;
        self.notify_change();
        Ok(detached)
    }

    /// Entity handles under the content root, in attachment order
    fn attached(&self) -> Vec<DisplayHandle> {
        self.core().attached()
    }

    /// Take every node off the content root, keeping them alive
    fn detach_all(&mut self) -> Result<Vec<DetachedNode>> {
        let detached = self.core_mut().detach_all()?;
        self.notify_change();
        Ok(detached)
    }

    /// Attach a node detached from any presenter, converting its placement
    fn reattach(&mut self, node: &DetachedNode) -> Result<()> {
        self.core_mut().reattach(node)?;
        self.notify_change();
        Ok(())
    }

    /// Tell the presenter the scene changed
    fn notify_change(&mut self);

    fn subscribe(&mut self, options: SubscribeOptions, listener: PointerListener) -> SubscriptionId {
        self.core_mut().subscribe(options, listener)
    }

    fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.core_mut().unsubscribe(id)
    }

    fn geographic_to_scene(&self, point: &GeographicPoint) -> Result<Checked<DVec3>> {
        self.core().geographic_to_scene(point)
    }

    fn scene_to_geographic(&self, scene: DVec3) -> Result<Checked<GeographicPoint>> {
        self.core().scene_to_geographic(scene)
    }

    fn projected_to_scene(&self, projected: DVec3) -> Result<Checked<DVec3>> {
        self.core().projected_to_scene(projected)
    }

    fn scene_to_projected(&self, scene: DVec3) -> Result<Checked<DVec3>> {
        self.core().scene_to_projected(scene)
    }

    fn fly_to(&mut self, target: &GeographicPoint, options: FlyToOptions) -> Result<()>;

    fn fit_to_extent(&mut self, extent: &Extent, options: FitOptions) -> Result<()>;

    /// Dispatch queued pointer input and advance camera flights
    fn pre_update(&mut self, dt: f64) -> Result<(), StateError> {
        let flying = self.core_mut().pre_update(dt)?;
        if flying {
            self.notify_change();
        }
        Ok(())
    }

    fn post_update(&mut self, dt: f64) -> Result<(), StateError> {
        self.core_mut().post_update(dt)
    }

    fn render(&mut self) -> Result<FrameStats, FrameError>;

    /// Queue device input; it is hit-tested in the next `pre_update`
    fn handle_pointer(&mut self, input: PointerInput) -> Result<(), StateError> {
        self.core_mut().handle_pointer(input)
    }

    /// Hit-test a scene-space ray against attached content
    fn pick(&self, ray: &Ray) -> Option<PickHit> {
        self.core().pick(ray)
    }

    /// Hit-test a window position against the current scene
    fn pick_at(&self, position: DVec2) -> Result<Option<PickHit>, FrameError> {
        self.core().pick_at(position)
    }

    /// Reposition content after the adapter origin moved from `previous`
    fn on_origin_changed(&mut self, previous: &OriginFrame) -> Result<()> {
        self.core_mut().on_origin_changed(previous)?;
        self.notify_change();
        Ok(())
    }

    /// Point on the origin's horizontal plane below the camera
    fn ground_point(&self) -> DVec3 {
        self.core().ground_point()
    }

    /// Camera distance from the origin along the ground, for auto-rebase
    fn ground_distance(&self) -> f64 {
        self.core().ground_distance()
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.core_mut().resize(width, height);
        self.notify_change();
    }

    /// Add a map layer; back-ends without layers warn and return `None`
    fn add_layer(&mut self, config: &LayerConfig) -> Result<Option<LayerId>>;

    fn layers(&self) -> Vec<(LayerId, Layer)> {
        Vec::new()
    }
}
