//! Behavior shared by every presenter back-end

use super::events::{EventBus, PointerEvent, PointerEventKind, PointerListener, SubscribeOptions, SubscriptionId};
use super::lifecycle::{DisposeSignal, Lifecycle, PresenterState};
use super::navigation::{CameraGoal, Navigator};
use super::picking::{self, PickHit, Ray};
use super::surface::{Container, RenderSurface};
use super::{
    AddOptions, DetachedNode, FrameStats, Placement, PresenterContext, PresenterMode,
    RenderLoop, RendererInfo,
};
use crate::config::ViewerConfig;
use crate::core::camera::Camera;
use crate::core::coordinates::{resolve_definition, CoordinateAdapter, OriginFrame};
use crate::core::geodesy::{Checked, GeographicPoint};
use crate::core::scene::{
    is_wrapper, AxisConvention, Bounds, ContentFrame, DisplayHandle, Entity, OffsetWrapper,
    OffsetWrappers, SceneFrame, SceneGraph, Transform,
};
use crate::error::{ConfigError, FrameError, Result, StateError};
use crate::input::{PointerAction, PointerInput};
use crate::runtime::Runtime;
use glam::{DMat4, DVec2, DVec3, DVec4};
use std::cell::{Ref, RefMut};
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Instant;
use tracing::{debug, info, trace, warn};

const LIVE: &[PresenterState] = &[
    PresenterState::Ready,
    PresenterState::Running,
    PresenterState::Paused,
];

/// Pointer input beyond this many queued events is dropped
const MAX_PENDING_INPUT: usize = 256;

pub struct PresenterCore {
    mode: PresenterMode,
    context: PresenterContext,
    lifecycle: Lifecycle,
    frame: Box<dyn SceneFrame>,
    container: Option<Rc<Container>>,
    surface: Option<RenderSurface>,
    root: Option<Entity>,
    wrappers: OffsetWrappers,
    axis_convention: AxisConvention,
    camera: Camera,
    renderer: RendererInfo,
    events: EventBus,
    navigator: Navigator,
    pending_input: VecDeque<PointerInput>,
    render_loop: RenderLoop,
    damaged: bool,
    frames_rendered: u64,
}

impl PresenterCore {
    pub fn new(
        mode: PresenterMode,
        context: PresenterContext,
        frame: Box<dyn SceneFrame>,
        camera: Camera,
        renderer: RendererInfo,
    ) -> Self {
        Self {
            mode,
            context,
            lifecycle: Lifecycle::new(),
            frame,
            container: None,
            surface: None,
            root: None,
            wrappers: OffsetWrappers::new(),
            axis_convention: AxisConvention::default(),
            camera,
            renderer,
            events: EventBus::new(),
            navigator: Navigator::new(),
            pending_input: VecDeque::new(),
            render_loop: RenderLoop::default(),
            damaged: true,
            frames_rendered: 0,
        }
    }

    pub fn mode(&self) -> PresenterMode {
        self.mode
    }

    pub fn state(&self) -> PresenterState {
        self.lifecycle.state()
    }

    pub fn signal(&self) -> DisposeSignal {
        self.lifecycle.signal()
    }

    pub fn context(&self) -> &PresenterContext {
        &self.context
    }

    pub fn graph(&self) -> Ref<'_, SceneGraph> {
        self.context.graph.borrow()
    }

    fn graph_mut(&self) -> RefMut<'_, SceneGraph> {
        self.context.graph.borrow_mut()
    }

    pub fn adapter(&self) -> Ref<'_, CoordinateAdapter> {
        self.context.adapter.borrow()
    }

    pub fn runtime(&self) -> &Runtime {
        &self.context.runtime
    }

    pub fn scene_frame(&self) -> &dyn SceneFrame {
        self.frame.as_ref()
    }

    pub fn content_frame(&self) -> ContentFrame {
        self.frame.kind()
    }

    pub fn axis_convention(&self) -> AxisConvention {
        self.axis_convention
    }

    pub fn surface(&self) -> Option<&RenderSurface> {
        self.surface.as_ref()
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn renderer(&self) -> &RendererInfo {
        &self.renderer
    }

    pub fn navigator_mut(&mut self) -> (&mut Navigator, &mut Camera) {
        (&mut self.navigator, &mut self.camera)
    }

    pub fn mark_damaged(&mut self) {
        self.damaged = true;
    }

    pub fn is_damaged(&self) -> bool {
        self.damaged
    }

    pub fn content_root(&self) -> Result<Entity, StateError> {
        self.lifecycle.require("use the content root of", LIVE)?;
        self.root.ok_or(StateError::InvalidTransition {
            operation: "use the content root of",
            state: self.state(),
        })
    }

    /// Window size the camera renders into
    pub fn viewport(&self) -> (u32, u32) {
        match (&self.surface, &self.container) {
            (Some(surface), _) => (surface.width, surface.height),
            (None, Some(container)) => container.size(),
            (None, None) => (0, 0),
        }
    }

    fn owner_name(&self) -> String {
        match self.root {
            Some(root) => format!("{}-presenter#{}", self.mode, root.id()),
            None => format!("{}-presenter", self.mode),
        }
    }

    fn notify_state(&self, from: PresenterState) {
        if let Some(instrumentation) = &self.context.instrumentation {
            instrumentation.on_state_change(self.mode, from, self.state());
        }
    }

    /// Shared part of initialize: validate, resolve, claim, build the root
    ///
    /// Work that awaits checks the dispose signal afterwards and stops
    /// without touching the presenter if it was raised.
    pub async fn prepare(&mut self, container: Rc<Container>, config: &ViewerConfig) -> Result<()> {
        self.lifecycle
            .require("initialize", &[PresenterState::Uninitialized])?;
        config.validate_for(self.mode)?;

        self.context.runtime.capabilities().probe(self.mode).await?;
        self.lifecycle.require_live()?;

        let reference_system = config
            .reference_system_for(self.mode)
            .ok_or(ConfigError::MissingReferenceSystem)?;
        let needs_reinitialize = {
            let mut adapter = self.context.adapter.borrow_mut();
            if adapter.reference_system() != &reference_system {
                adapter.set_reference_system(reference_system.clone());
            }
            adapter.set_rebase_config(config.rebase);
            adapter.needs_reinitialize()
        };
        if needs_reinitialize {
            let definition = resolve_definition(&reference_system, &self.context.runtime).await?;
            self.lifecycle.require_live()?;
            self.context
                .adapter
                .borrow_mut()
                .initialize_with(&definition, &self.context.runtime)?;
        }

        let root = self
            .graph_mut()
            .create_root(format!("{}-content-root", self.mode));
        self.root = Some(root);
        let surface = match container.claim(&self.owner_name()) {
            Ok(surface) => surface,
            Err(error) => {
                self.graph_mut().despawn_recursive(root);
                self.root = None;
                return Err(error);
            }
        };

        self.camera.set_aspect_ratio(surface.aspect_ratio());
        self.surface = Some(surface);
        self.container = Some(container);
        self.axis_convention = config.axis_convention;
        self.renderer.background = config.renderer.background;
        self.renderer.shadows = config.renderer.shadows;
        self.renderer.lighting = config.renderer.lighting;

        let from = self.lifecycle.initialized()?;
        self.notify_state(from);
        info!(mode = %self.mode, frame = ?self.frame.kind(), "Presenter initialized");
        Ok(())
    }

    pub fn start(&mut self, render_loop: RenderLoop) -> Result<()> {
        self.lifecycle.require("start", &[PresenterState::Ready])?;
        if self.surface.is_none() {
            let container = self.container.clone().ok_or(StateError::InvalidTransition {
                operation: "start",
                state: self.state(),
            })?;
            let surface = container.claim(&self.owner_name())?;
            self.camera.set_aspect_ratio(surface.aspect_ratio());
            self.surface = Some(surface);
        }
        self.render_loop = render_loop;
        let from = self.lifecycle.start()?;
        self.damaged = true;
        self.notify_state(from);
        info!(mode = %self.mode, target_fps = render_loop.target_fps, "Presenter started");
        Ok(())
    }

    pub fn pause(&mut self) -> Result<(), StateError> {
        let from = self.lifecycle.pause()?;
        self.notify_state(from);
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), StateError> {
        let from = self.lifecycle.resume()?;
        self.damaged = true;
        self.notify_state(from);
        Ok(())
    }

    pub fn stop(&mut self) -> Result<(), StateError> {
        let from = self.lifecycle.stop()?;
        self.navigator.cancel();
        self.pending_input.clear();
        self.notify_state(from);
        info!(mode = %self.mode, "Presenter stopped");
        Ok(())
    }

    pub fn release_surface(&mut self) {
        let owner = self.owner_name();
        if self.surface.take().is_some() {
            if let Some(container) = &self.container {
                container.release(&owner);
            }
        }
    }

    pub fn dispose(&mut self) -> Result<(), StateError> {
        let from = self.lifecycle.dispose()?;
        self.teardown();
        self.notify_state(from);
        info!(mode = %self.mode, "Presenter disposed");
        Ok(())
    }

    /// Detach content, drop the root and give the surface back
    fn teardown(&mut self) {
        self.navigator.cancel();
        self.pending_input.clear();
        self.events.clear();

        if let Some(root) = self.root {
            match self.context.graph.try_borrow_mut() {
                Ok(mut graph) => {
                    let children = graph.children_of(root);
                    if !children.is_empty() {
                        warn!(
                            mode = %self.mode,
                            count = children.len(),
                            "Tearing down presenter with attached content; content is detached, not destroyed"
                        );
                    }
                    for child in children {
                        let wrapped = graph.get::<OffsetWrapper>(child).map(|w| w.content);
                        match wrapped {
                            Some(content) => {
                                self.wrappers.unwrap(&mut graph, content);
                            }
                            None => {
                                graph.detach(child);
                            }
                        }
                    }
                    graph.despawn_recursive(root);
                }
                Err(_) => warn!(mode = %self.mode, "Scene graph busy; content root left in place"),
            }
        }
        self.wrappers.clear();
        self.release_surface();
        self.root = None;
    }

    // Content

    pub fn add_object(&mut self, handle: DisplayHandle, options: AddOptions) -> Result<()> {
        let root = self.content_root()?;
        let entity = handle.entity();
        {
            let graph = self.graph();
            if !graph.contains(entity) {
                return Err(StateError::UnknownHandle(handle).into());
            }
            if graph.parent_of(entity).is_some() {
                return Err(StateError::AlreadyAttached(handle).into());
            }
        }

        if options.native_frame {
            self.graph_mut().attach(entity, root)?;
            debug!(mode = %self.mode, handle = %handle, "Attached native content");
            return Ok(());
        }

        let (anchor, transform) = {
            let adapter = self.adapter();
            let anchor = match options.anchor {
                Some(anchor) => anchor,
                None => adapter.origin()?.geographic(),
            };
            let transform = self
                .frame
                .anchor_transform(&adapter, &anchor, self.axis_convention)?;
            (anchor, transform)
        };
        let mut graph = self.context.graph.borrow_mut();
        self.wrappers
            .wrap(&mut graph, entity, root, anchor, transform)?;
        debug!(mode = %self.mode, handle = %handle, anchor = %anchor, "Attached wrapped content");
        Ok(())
    }

    /// Where `handle` sits, in presenter-independent terms
    pub fn placement_of(&self, handle: DisplayHandle) -> Result<Placement> {
        let root = self.content_root()?;
        let entity = handle.entity();
        let graph = self.graph();

        if let Some(anchor) = self.wrappers.anchor_of(&graph, entity) {
            return Ok(Placement::Wrapped { anchor });
        }
        if graph.parent_of(entity) != Some(root) {
            return Err(StateError::NotAttached(handle).into());
        }

        let transform = graph
            .transform(entity)
            .ok_or(StateError::UnknownHandle(handle))?;
        let adapter = self.adapter();
        let geographic = self
            .frame
            .scene_to_geographic(&adapter, transform.translation)?;
        if !geographic.is_reliable() {
            warn!(handle = %handle, "Native placement converted with reduced accuracy");
        }
        Ok(Placement::Native {
            geographic: geographic.value,
            enu_rotation: (self.frame.scene_to_enu() * transform.rotation).normalize(),
        })
    }

    pub fn remove_object(&mut self, handle: DisplayHandle) -> Result<DetachedNode> {
        let placement = self.placement_of(handle)?;
        let entity = handle.entity();
        let mut graph = self.context.graph.borrow_mut();
        match placement {
            Placement::Wrapped { .. } => {
                self.wrappers.unwrap(&mut graph, entity);
            }
            Placement::Native { .. } => {
                graph.detach(entity);
            }
        }
        debug!(mode = %self.mode, handle = %handle, "Removed content");
        Ok(DetachedNode { handle, placement })
    }

    pub fn attached(&self) -> Vec<DisplayHandle> {
        let Some(root) = self.root else {
            return Vec::new();
        };
        let graph = self.graph();
        graph
            .children_of(root)
            .into_iter()
            .map(|child| match graph.get::<OffsetWrapper>(child) {
                Some(wrapper) => DisplayHandle::new(wrapper.content),
                None => DisplayHandle::new(child),
            })
            .collect()
    }

    /// Placements are computed for every node before any is detached
    pub fn detach_all(&mut self) -> Result<Vec<DetachedNode>> {
        let handles = self.attached();
        let placements = handles
            .iter()
            .map(|&handle| self.placement_of(handle))
            .collect::<Result<Vec<_>>>()?;

        let mut graph = self.context.graph.borrow_mut();
        let mut detached = Vec::with_capacity(handles.len());
        for (handle, placement) in handles.into_iter().zip(placements) {
            match placement {
                Placement::Wrapped { .. } => {
                    self.wrappers.unwrap(&mut graph, handle.entity());
                }
                Placement::Native { .. } => {
                    graph.detach(handle.entity());
                }
            }
            detached.push(DetachedNode { handle, placement });
        }
        info!(mode = %self.mode, count = detached.len(), "Content root drained");
        Ok(detached)
    }

    pub fn reattach(&mut self, node: &DetachedNode) -> Result<()> {
        match node.placement {
            Placement::Wrapped { anchor } => {
                self.add_object(node.handle, AddOptions::wrapped_at(anchor))
            }
            Placement::Native {
                geographic,
                enu_rotation,
            } => {
                let translation = {
                    let adapter = self.adapter();
                    self.frame.geographic_to_scene(&adapter, &geographic)?.value
                };
                let rotation = (self.frame.scene_to_enu().inverse() * enu_rotation).normalize();
                {
                    let mut graph = self.graph_mut();
                    let scale = graph
                        .transform(node.handle.entity())
                        .ok_or(StateError::UnknownHandle(node.handle))?
                        .scale;
                    graph.set_transform(
                        node.handle.entity(),
                        Transform {
                            translation,
                            rotation,
                            scale,
                        },
                    )?;
                }
                self.add_object(node.handle, AddOptions::native())
            }
        }
    }

    // Coordinates

    pub fn geographic_to_scene(&self, point: &GeographicPoint) -> Result<Checked<DVec3>> {
        self.lifecycle.require_live()?;
        Ok(self.frame.geographic_to_scene(&self.adapter(), point)?)
    }

    pub fn scene_to_geographic(&self, scene: DVec3) -> Result<Checked<GeographicPoint>> {
        self.lifecycle.require_live()?;
        Ok(self.frame.scene_to_geographic(&self.adapter(), scene)?)
    }

    pub fn projected_to_scene(&self, projected: DVec3) -> Result<Checked<DVec3>> {
        self.lifecycle.require_live()?;
        Ok(self.frame.projected_to_scene(&self.adapter(), projected)?)
    }

    pub fn scene_to_projected(&self, scene: DVec3) -> Result<Checked<DVec3>> {
        self.lifecycle.require_live()?;
        Ok(self.frame.scene_to_projected(&self.adapter(), scene)?)
    }

    // Navigation

    pub fn fly(&mut self, goal: CameraGoal, duration: f64) -> Result<(), StateError> {
        self.lifecycle.require("fly the camera of", LIVE)?;
        self.navigator.fly(&mut self.camera, goal, duration);
        self.damaged = true;
        Ok(())
    }

    // Events

    pub fn subscribe(&mut self, options: SubscribeOptions, listener: PointerListener) -> SubscriptionId {
        self.events.subscribe(options, listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    pub fn handle_pointer(&mut self, input: PointerInput) -> Result<(), StateError> {
        self.lifecycle.require_live()?;
        if self.pending_input.len() >= MAX_PENDING_INPUT {
            warn!(mode = %self.mode, "Pointer input queue full; dropping oldest event");
            self.pending_input.pop_front();
        }
        self.pending_input.push_back(input);
        Ok(())
    }

    /// Nearest content hit by a scene-space ray
    pub fn pick(&self, ray: &Ray) -> Option<PickHit> {
        let root = self.root?;
        let hit = picking::pick(&self.graph(), root, ray);
        if let Some(instrumentation) = &self.context.instrumentation {
            instrumentation.on_pick(self.mode, hit.as_ref());
        }
        hit
    }

    pub fn pick_at(&self, position: DVec2) -> Result<Option<PickHit>, FrameError> {
        if self.root.is_none() {
            return Ok(None);
        }
        let ray = picking::screen_ray(&self.camera, self.viewport(), position)?;
        Ok(self.pick(&ray))
    }

    /// Camera position dropped onto the origin's horizontal plane
    pub fn ground_point(&self) -> DVec3 {
        let up = self.frame.scene_to_enu().inverse() * DVec3::Z;
        let position = self.camera.position();
        position - up * position.dot(up)
    }

    /// Horizontal distance of the camera from the origin in scene units
    pub fn ground_distance(&self) -> f64 {
        self.ground_point().length()
    }

    fn dispatch_input(&mut self, input: PointerInput) -> usize {
        let kinds = PointerEventKind::for_input(&input);
        let needs_pick = !matches!(
            input.action,
            PointerAction::Left | PointerAction::Cancelled
        );

        let hit = if needs_pick {
            match self.pick_at(input.position) {
                Ok(hit) => hit,
                Err(error) => {
                    warn!(mode = %self.mode, %error, "Pick failed; pointer event skipped");
                    return 0;
                }
            }
        } else {
            None
        };
        let geographic = hit.and_then(|hit| {
            self.frame
                .scene_to_geographic(&self.adapter(), hit.point)
                .ok()
                .map(|checked| checked.value)
        });

        let mut delivered = 0;
        for kind in kinds {
            let event = PointerEvent {
                kind,
                point: hit.map(|h| h.point),
                geographic,
                handle: hit.map(|h| h.handle),
                distance: hit.map(|h| h.distance),
                device: input,
                mode: self.mode,
            };
            delivered += self.events.emit(&event);
        }
        trace!(mode = %self.mode, action = ?input.action, delivered, "Pointer input dispatched");
        delivered
    }

    /// Returns whether a camera flight is running
    pub fn pre_update(&mut self, dt: f64) -> Result<bool, StateError> {
        self.lifecycle.require("update", LIVE)?;
        if self.state() != PresenterState::Running {
            return Ok(false);
        }
        let pending = std::mem::take(&mut self.pending_input);
        for input in pending {
            self.dispatch_input(input);
        }
        Ok(self.navigator.advance(&mut self.camera, dt))
    }

    pub fn post_update(&mut self, _dt: f64) -> Result<(), StateError> {
        self.lifecycle.require("update", LIVE)?;
        Ok(())
    }

    /// Draw the frame, or skip it when `on_demand` and nothing changed
    pub fn render_frame(&mut self, on_demand: bool) -> Result<FrameStats, FrameError> {
        let frame = self.graph().frame();
        let mut stats = FrameStats {
            mode: self.mode,
            frame,
            rendered: false,
            visible: 0,
            culled: 0,
            duration: Default::default(),
        };
        if self.state() != PresenterState::Running || (on_demand && !self.damaged) {
            return Ok(stats);
        }
        if self.camera.is_degenerate() {
            return Err(FrameError::DegenerateCamera("camera parameters are degenerate"));
        }
        let Some(root) = self.root else {
            return Err(FrameError::Render("presenter has no content root".to_string()));
        };

        let started = Instant::now();
        let view_projection = self.camera.view_projection_matrix();
        let handles = self.attached();
        {
            let graph = self.graph();
            for handle in handles {
                let visible = subtree_visible(&graph, root, handle, &view_projection);
                if visible {
                    stats.visible += 1;
                } else {
                    stats.culled += 1;
                }
                if let Some(instrumentation) = &self.context.instrumentation {
                    instrumentation.on_visibility(self.mode, handle, visible);
                }
            }
        }

        stats.rendered = true;
        stats.duration = started.elapsed();
        self.damaged = false;
        self.frames_rendered += 1;
        if stats.duration > self.render_loop.frame_budget() {
            debug!(mode = %self.mode, duration = ?stats.duration, "Frame over budget");
        }
        if let Some(instrumentation) = &self.context.instrumentation {
            instrumentation.on_frame(self.mode, &stats);
        }
        Ok(stats)
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    // Origin

    pub fn on_origin_changed(&mut self, previous: &OriginFrame) -> Result<()> {
        let root = self.content_root()?;
        let adapter = self.context.adapter.borrow();
        let current = *adapter.origin()?;
        let frame = self.frame.as_ref();
        let convention = self.axis_convention;

        let mut graph = self.context.graph.borrow_mut();
        // Plan every move before applying any, so a failure leaves the scene as it was
        let mut plan = self.wrappers.plan_origin_update(&graph, |anchor| {
            frame.anchor_transform(&adapter, anchor, convention)
        })?;
        let wrapped = plan.len();
        for child in graph.children_of(root) {
            if is_wrapper(&graph, child) {
                continue;
            }
            if let Some(transform) = graph.transform(child) {
                plan.push((child, frame.rebase_transform(previous, &current, &transform)));
            }
        }
        let native = plan.len() - wrapped;
        for (node, transform) in plan {
            graph.set_transform(node, transform)?;
        }
        drop(graph);

        let before = self.camera.transform.translation;
        self.camera.transform = frame.rebase_transform(previous, &current, &self.camera.transform);
        self.navigator
            .translate(self.camera.transform.translation - before);
        self.damaged = true;

        debug!(mode = %self.mode, wrapped, native, "Content repositioned for new origin");
        Ok(())
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        if let Some(surface) = self.surface.as_mut() {
            surface.width = width;
            surface.height = height;
        }
        self.camera
            .set_aspect_ratio(width as f64 / height as f64);
        self.damaged = true;
    }
}

/// Whether any bounded node of an entity can be seen
///
/// Entities without bounds are always drawn. A box is culled only when all
/// of its corners lie outside the same clip plane.
fn subtree_visible(graph: &SceneGraph, root: Entity, handle: DisplayHandle, view_projection: &DMat4) -> bool {
    let top = graph
        .child_of_root_above(handle.entity(), root)
        .unwrap_or(handle.entity());
    let mut nodes = vec![top];
    nodes.extend(graph.descendants(top));

    let mut any_bounds = false;
    for node in nodes {
        let (Some(bounds), Some(global)) = (
            graph.get::<Bounds>(node).map(|b| *b),
            graph.global_transform(node),
        ) else {
            continue;
        };
        any_bounds = true;
        if box_in_frustum(&bounds.transformed(&global.matrix), view_projection) {
            return true;
        }
    }
    !any_bounds
}

fn box_in_frustum(bounds: &Bounds, view_projection: &DMat4) -> bool {
    let corners: Vec<DVec4> = (0..8)
        .map(|i| {
            let corner = DVec3::new(
                if i & 1 == 0 { bounds.min.x } else { bounds.max.x },
                if i & 2 == 0 { bounds.min.y } else { bounds.max.y },
                if i & 4 == 0 { bounds.min.z } else { bounds.max.z },
            );
            *view_projection * corner.extend(1.0)
        })
        .collect();

    let outside = |test: fn(&DVec4) -> bool| corners.iter().all(test);
    !(outside(|c| c.x < -c.w)
        || outside(|c| c.x > c.w)
        || outside(|c| c.y < -c.w)
        || outside(|c| c.y > c.w)
        || outside(|c| c.z < 0.0)
        || outside(|c| c.z > c.w))
}

/// A presenter dropped without `dispose` (for example inside an abandoned
/// mode switch) still gives back its surface and content root
impl Drop for PresenterCore {
    fn drop(&mut self) {
        if self.root.is_some() || self.surface.is_some() {
            debug!(mode = %self.mode, "Presenter dropped while live; releasing its resources");
            self.lifecycle.signal().raise();
            self.teardown();
        }
    }
}

impl std::fmt::Debug for PresenterCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PresenterCore")
            .field("mode", &self.mode)
            .field("state", &self.state())
            .field("frame", &self.frame.kind())
            .field("root", &self.root)
            .field("wrappers", &self.wrappers.len())
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_in_frustum() {
        let mut camera = Camera::perspective(60.0, 1.0, 0.1, 100.0);
        camera.transform = Transform::from_translation(DVec3::new(0.0, 0.0, 10.0));
        let view_projection = camera.view_projection_matrix();

        let ahead = Bounds::centered(DVec3::ONE);
        assert!(box_in_frustum(&ahead, &view_projection));

        let behind = Bounds::new(DVec3::new(-1.0, -1.0, 20.0), DVec3::new(1.0, 1.0, 22.0));
        assert!(!box_in_frustum(&behind, &view_projection));

        let far_left = Bounds::new(DVec3::new(-500.0, -1.0, -1.0), DVec3::new(-400.0, 1.0, 1.0));
        assert!(!box_in_frustum(&far_left, &view_projection));
    }
}
