//! The viewer: one shared scene shown through a swappable presenter
//!
//! The viewer owns everything that must outlive a presenter (scene graph,
//! coordinate adapter, container, entity identities, pointer subscriptions)
//! and coordinates mode switches so content is re-homed rather than rebuilt.

use crate::config::{ConfigOverrides, ReferenceSystemConfig, ViewerConfig};
use crate::core::coordinates::{CoordinateAdapter, Extent};
use crate::core::geodesy::GeographicPoint;
use crate::core::identity::{EntityId, IdentityMap};
use crate::core::projection::{normalize_code, well_known_definition};
use crate::core::scene::{Bounds, DisplayHandle, SceneGraph, Transform};
use crate::error::{ConfigError, FrameError, Result, StateError, ViewerError};
use crate::input::PointerInput;
use crate::layers::{LayerConfig, LayerId};
use crate::presenter::{
    AddOptions, Container, DetachedNode, FitOptions, FlyToOptions, FrameStats, Instrumentation,
    PickHit, PointerListener, Presenter, PresenterContext, PresenterFactory, PresenterMode,
    PresenterState, RenderLoop, SubscribeOptions, SubscriptionId,
};
use crate::runtime::Runtime;
use glam::DVec2;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

type UpdateHook = Box<dyn FnMut(&mut SceneGraph, f64)>;

struct Subscription {
    id: SubscriptionId,
    options: SubscribeOptions,
    listener: PointerListener,
    /// Id of the registration with the active presenter
    presenter_id: Option<SubscriptionId>,
}

/// A switch that began but has not finished
#[derive(Debug, Clone)]
struct PendingSwitch {
    target: PresenterMode,
    previous_reference: ReferenceSystemConfig,
    previous_origin: Option<GeographicPoint>,
}

pub struct Viewer {
    config: ViewerConfig,
    runtime: Rc<Runtime>,
    graph: Rc<RefCell<SceneGraph>>,
    adapter: Rc<RefCell<CoordinateAdapter>>,
    container: Rc<Container>,
    instrumentation: Option<Rc<dyn Instrumentation>>,
    render_loop: RenderLoop,
    active: Option<Box<dyn Presenter>>,
    /// Nodes detached from a presenter and not yet re-homed
    parked: Vec<DetachedNode>,
    identity: IdentityMap,
    subscriptions: Vec<Subscription>,
    next_subscription: u64,
    update_hooks: Vec<UpdateHook>,
    pending_switch: Option<PendingSwitch>,
    disposed: bool,
}

impl Viewer {
    pub fn builder() -> ViewerBuilder {
        ViewerBuilder::new()
    }

    /// Create the shared state and bring up the configured presenter
    pub async fn launch(
        config: ViewerConfig,
        runtime: Rc<Runtime>,
        container: Rc<Container>,
        instrumentation: Option<Rc<dyn Instrumentation>>,
        render_loop: RenderLoop,
    ) -> Result<Self> {
        config.validate_for(config.mode)?;
        let reference_system = config
            .reference_system_for(config.mode)
            .ok_or(ConfigError::MissingReferenceSystem)?;
        let adapter = CoordinateAdapter::new(reference_system, config.origin, config.extent.clone())
            .with_rebase(config.rebase);

        let mut viewer = Self {
            config,
            runtime,
            graph: Rc::new(RefCell::new(SceneGraph::new())),
            adapter: Rc::new(RefCell::new(adapter)),
            container,
            instrumentation,
            render_loop,
            active: None,
            parked: Vec::new(),
            identity: IdentityMap::new(),
            subscriptions: Vec::new(),
            next_subscription: 0,
            update_hooks: Vec::new(),
            pending_switch: None,
            disposed: false,
        };

        let mode = viewer.config.mode;
        let config = viewer.config.clone();
        let mut presenter = viewer.bring_up(mode, &config).await?;
        presenter.start(render_loop)?;
        viewer.active = Some(presenter);

        info!(%mode, container = viewer.container.id(), "Viewer launched");
        Ok(viewer)
    }

    fn context(&self) -> PresenterContext {
        let context = PresenterContext::new(
            self.graph.clone(),
            self.adapter.clone(),
            self.runtime.clone(),
        );
        match &self.instrumentation {
            Some(instrumentation) => context.with_instrumentation(instrumentation.clone()),
            None => context,
        }
    }

    async fn bring_up(&self, mode: PresenterMode, config: &ViewerConfig) -> Result<Box<dyn Presenter>> {
        let mut presenter = PresenterFactory::create(mode, self.context()).await?;
        presenter.initialize(self.container.clone(), config).await?;
        Ok(presenter)
    }

    fn require_live(&self) -> Result<(), StateError> {
        if self.disposed {
            Err(StateError::Disposed)
        } else {
            Ok(())
        }
    }

    fn active_mut(&mut self) -> Result<&mut Box<dyn Presenter>, StateError> {
        self.require_live()?;
        self.active.as_mut().ok_or(StateError::NoActivePresenter)
    }

    // Mode switching

    /// Replace the active presenter, carrying every attached node across
    ///
    /// Atomic for the caller: on failure the previous presenter is running
    /// again with its content (`SwitchFailed { restored: true }`), or, when
    /// that is impossible, no presenter is active and the nodes are parked
    /// until the next successful switch (`restored: false`).
    pub async fn switch_mode(&mut self, mode: PresenterMode, overrides: ConfigOverrides) -> Result<()> {
        self.require_live()?;
        if self.pending_switch.is_some() {
            return Err(StateError::SwitchInProgress.into());
        }
        let target_config = ViewerConfig {
            mode,
            ..self.config.merged(&overrides)
        };
        target_config.validate_for(mode)?;

        let from = self.active_mode();
        let started = Instant::now();
        info!(from = ?from, to = %mode, "Switching presenter");

        if let Some(active) = self.active.as_mut() {
            let drained = active.detach_all()?;
            self.parked.extend(drained);
        }
        let adapter = self.adapter.borrow();
        self.pending_switch = Some(PendingSwitch {
            target: mode,
            previous_reference: adapter.reference_system().clone(),
            previous_origin: adapter.origin().ok().map(|origin| origin.geographic()),
        });
        drop(adapter);

        if let Some(active) = self.active.as_mut() {
            if matches!(active.state(), PresenterState::Running | PresenterState::Paused) {
                if let Err(error) = active.stop() {
                    warn!(%error, "Previous presenter did not stop cleanly");
                }
            }
            active.release_surface();
        }

        match self.complete_switch(mode, &target_config, &overrides).await {
            Ok(()) => {
                self.pending_switch = None;
                info!(
                    from = ?from,
                    to = %mode,
                    nodes = self.attached_handles().len(),
                    elapsed = ?started.elapsed(),
                    "Presenter switched"
                );
                Ok(())
            }
            Err(error) => Err(self.roll_back(mode, error)),
        }
    }

    async fn complete_switch(
        &mut self,
        mode: PresenterMode,
        config: &ViewerConfig,
        overrides: &ConfigOverrides,
    ) -> Result<()> {
        let mut presenter = self.bring_up(mode, config).await?;

        // Nothing below awaits
        if let Some(origin) = overrides.origin {
            let previous = self.adapter.borrow_mut().set_origin(origin)?;
            presenter.on_origin_changed(&previous)?;
        }

        let nodes = std::mem::take(&mut self.parked);
        let mut failure = None;
        for node in &nodes {
            if let Err(error) = presenter.reattach(node) {
                warn!(handle = %node.handle, %error, "Node could not be re-homed");
                failure = Some(error);
                break;
            }
        }
        if let Some(error) = failure {
            if let Err(dispose_error) = presenter.dispose() {
                warn!(error = %dispose_error, "Failed to dispose half-built presenter");
            }
            self.parked = nodes;
            return Err(error);
        }

        let presenter_ids: Vec<SubscriptionId> = self
            .subscriptions
            .iter()
            .map(|s| presenter.subscribe(s.options.clone(), s.listener.clone()))
            .collect();

        if let Err(error) = presenter.start(self.render_loop) {
            if let Err(dispose_error) = presenter.dispose() {
                warn!(error = %dispose_error, "Failed to dispose presenter that did not start");
            }
            self.parked = nodes;
            return Err(error);
        }

        for (subscription, id) in self.subscriptions.iter_mut().zip(presenter_ids) {
            subscription.presenter_id = Some(id);
        }
        if let Some(mut previous) = self.active.replace(presenter) {
            if let Err(error) = previous.dispose() {
                warn!(%error, "Previous presenter did not dispose cleanly");
            }
        }
        self.config = config.clone();
        Ok(())
    }

    fn roll_back(&mut self, target: PresenterMode, error: ViewerError) -> ViewerError {
        warn!(%target, %error, "Mode switch failed; restoring previous presenter");
        if let Some(pending) = self.pending_switch.take() {
            self.restore_adapter(&pending);
        }
        let restored = self.restore_previous();
        ViewerError::SwitchFailed {
            target,
            restored,
            source: Box::new(error),
        }
    }

    /// Put the adapter back on the reference system and origin it had
    /// before the switch began
    fn restore_adapter(&mut self, pending: &PendingSwitch) {
        {
            let mut adapter = self.adapter.borrow_mut();
            if adapter.reference_system() != &pending.previous_reference {
                adapter.set_reference_system(pending.previous_reference.clone());
            }
            if adapter.needs_reinitialize() {
                let code = normalize_code(&pending.previous_reference.code);
                let definition = pending
                    .previous_reference
                    .definition
                    .clone()
                    .or_else(|| self.runtime.crs().get(&code).map(|r| r.definition.clone()))
                    .or_else(|| well_known_definition(&code));
                match definition {
                    Some(definition) => {
                        if let Err(error) = adapter.initialize_with(&definition, &self.runtime) {
                            error!(%code, %error, "Could not restore the previous reference system");
                        }
                    }
                    None => error!(%code, "Previous reference system is no longer known"),
                }
            }
        }

        let Some(origin) = pending.previous_origin else {
            return;
        };
        let moved = self
            .adapter
            .borrow()
            .origin()
            .map(|current| current.geographic() != origin)
            .unwrap_or(false);
        if !moved {
            return;
        }
        let replaced = self.adapter.borrow_mut().set_origin(origin);
        match replaced {
            Ok(replaced) => {
                if let Some(active) = self.active.as_mut() {
                    if let Err(error) = active.on_origin_changed(&replaced) {
                        warn!(%error, "Previous presenter could not follow the restored origin");
                    }
                }
            }
            Err(error) => error!(%error, "Could not restore the previous origin"),
        }
    }

    /// Restart the previous presenter and give its content back
    fn restore_previous(&mut self) -> bool {
        let Some(active) = self.active.as_mut() else {
            warn!(parked = self.parked.len(), "No presenter to restore; content stays parked");
            return false;
        };

        let restarted = match active.state() {
            PresenterState::Ready => active.start(self.render_loop),
            PresenterState::Running | PresenterState::Paused => Ok(()),
            state => Err(StateError::InvalidTransition {
                operation: "restore",
                state,
            }
            .into()),
        };
        if let Err(error) = restarted {
            error!(
                %error,
                parked = self.parked.len(),
                "Previous presenter could not be restarted; no presenter is active"
            );
            if let Some(mut previous) = self.active.take() {
                if let Err(error) = previous.dispose() {
                    warn!(%error, "Failed to dispose previous presenter");
                }
            }
            for subscription in &mut self.subscriptions {
                subscription.presenter_id = None;
            }
            return false;
        }

        let nodes = std::mem::take(&mut self.parked);
        for node in nodes {
            if let Err(error) = active.reattach(&node) {
                warn!(handle = %node.handle, %error, "Could not restore node; keeping it parked");
                self.parked.push(node);
            }
        }
        info!(mode = %active.mode(), "Previous presenter restored");
        true
    }

    /// Finish the bookkeeping of a switch whose future was dropped
    ///
    /// The previous presenter is restarted with its content, exactly as if
    /// the switch had failed.
    pub fn recover_interrupted_switch(&mut self) -> Result<()> {
        self.require_live()?;
        let Some(pending) = self.pending_switch.take() else {
            debug!("No interrupted switch to recover");
            return Ok(());
        };
        warn!(target = %pending.target, "Recovering interrupted mode switch");
        self.restore_adapter(&pending);
        if self.restore_previous() {
            Ok(())
        } else {
            Err(ViewerError::SwitchFailed {
                target: pending.target,
                restored: false,
                source: Box::new(StateError::NoActivePresenter.into()),
            })
        }
    }

    pub fn is_switching(&self) -> bool {
        self.pending_switch.is_some()
    }

    // Frame loop

    /// Run one frame: rebase, input, hooks, hierarchy, render
    ///
    /// Returns the frame's stats, or `None` when nothing was drawn because
    /// no presenter is active or the frame failed.
    pub fn tick(&mut self, dt: f64) -> Result<Option<FrameStats>> {
        self.require_live()?;
        if self.active.is_none() {
            return Ok(None);
        }
        self.auto_rebase()?;
        self.graph.borrow_mut().advance_frame();

        let Some(presenter) = self.active.as_mut() else {
            return Ok(None);
        };
        presenter.pre_update(dt)?;
        {
            let mut graph = self.graph.borrow_mut();
            for hook in &mut self.update_hooks {
                hook(&mut *graph, dt);
            }
            graph.update_hierarchy();
        }
        presenter.post_update(dt)?;

        match presenter.render() {
            Ok(stats) => Ok(Some(stats)),
            Err(error) => {
                warn!(mode = %presenter.mode(), %error, "Frame skipped");
                Ok(None)
            }
        }
    }

    /// Follow the camera with the origin once it strays too far
    fn auto_rebase(&mut self) -> Result<()> {
        let Some(presenter) = self.active.as_ref() else {
            return Ok(());
        };
        if presenter.state() != PresenterState::Running {
            return Ok(());
        }
        let distance = presenter.ground_distance();
        if !self.adapter.borrow().should_rebase(distance) {
            return Ok(());
        }

        let ground = presenter.scene_to_geographic(presenter.ground_point())?;
        if !ground.is_reliable() {
            warn!(distance, "Camera ground point is unreliable; rebase skipped");
            return Ok(());
        }
        let height = self.adapter.borrow().origin()?.height();
        debug!(distance, "Camera left the rebase radius");
        self.set_origin(ground.value.with_height(height))
    }

    /// Move the origin between frames and reposition all content
    pub fn set_origin(&mut self, origin: GeographicPoint) -> Result<()> {
        self.require_live()?;
        let previous = self.adapter.borrow_mut().set_origin(origin)?;
        if let Some(presenter) = self.active.as_mut() {
            if let Err(error) = presenter.on_origin_changed(&previous) {
                self.adapter.borrow_mut().restore_origin(previous)?;
                return Err(error);
            }
        }
        Ok(())
    }

    pub fn add_update_hook(&mut self, hook: impl FnMut(&mut SceneGraph, f64) + 'static) {
        self.update_hooks.push(Box::new(hook));
    }

    // Entities

    /// Create a display node for `entity` and show it
    pub fn spawn_entity(
        &mut self,
        entity: EntityId,
        name: impl Into<String>,
        transform: Transform,
        bounds: Option<Bounds>,
        options: AddOptions,
    ) -> Result<DisplayHandle> {
        self.require_live()?;
        if self.identity.contains_entity(entity) {
            return Err(StateError::EntityAlreadyMapped(entity).into());
        }
        let handle = self
            .graph
            .borrow_mut()
            .create_display_node(name, transform, bounds);
        if let Err(error) = self.attach_entity(entity, handle, options) {
            self.graph.borrow_mut().despawn_recursive(handle.entity());
            return Err(error);
        }
        Ok(handle)
    }

    /// Show an existing node as `entity`'s content
    pub fn attach_entity(&mut self, entity: EntityId, handle: DisplayHandle, options: AddOptions) -> Result<()> {
        self.require_live()?;
        self.identity.register(entity, handle)?;
        let result = match self.active.as_mut() {
            Some(presenter) => presenter.add_object(handle, options),
            None => Err(StateError::NoActivePresenter.into()),
        };
        if let Err(error) = result {
            self.identity.remove(entity);
            return Err(error);
        }
        debug!(%entity, %handle, "Entity attached");
        Ok(())
    }

    /// Take an entity's content off the display
    ///
    /// The node stays alive and is handed back; the entity forgets it.
    pub fn detach_entity(&mut self, entity: EntityId) -> Result<DisplayHandle> {
        self.require_live()?;
        let handle = self
            .identity
            .handle_of(entity)
            .ok_or(StateError::UnknownEntity(entity))?;
        self.take_off_display(handle)?;
        self.identity.remove(entity);
        debug!(%entity, %handle, "Entity detached");
        Ok(handle)
    }

    /// Detach and delete an entity's display node
    pub fn destroy_entity(&mut self, entity: EntityId) -> Result<()> {
        self.require_live()?;
        let handle = self
            .identity
            .handle_of(entity)
            .ok_or(StateError::UnknownEntity(entity))?;
        match self.take_off_display(handle) {
            Ok(()) => {}
            Err(error) if error.is_state(&StateError::NotAttached(handle)) => {}
            Err(error) => return Err(error),
        }
        self.identity.remove(entity);
        let despawned = self.graph.borrow_mut().despawn_recursive(handle.entity());
        debug!(%entity, %handle, despawned, "Entity destroyed");
        Ok(())
    }

    fn take_off_display(&mut self, handle: DisplayHandle) -> Result<()> {
        if let Some(index) = self.parked.iter().position(|node| node.handle == handle) {
            self.parked.remove(index);
            return Ok(());
        }
        match self.active.as_mut() {
            Some(presenter) => presenter.remove_object(handle).map(|_| ()),
            None => Err(StateError::NotAttached(handle).into()),
        }
    }

    pub fn handle_of(&self, entity: EntityId) -> Option<DisplayHandle> {
        self.identity.handle_of(entity)
    }

    pub fn entity_of(&self, handle: DisplayHandle) -> Option<EntityId> {
        self.identity.entity_of(handle)
    }

    pub fn identity(&self) -> &IdentityMap {
        &self.identity
    }

    /// Handles under the active presenter's content root, in attachment order
    pub fn attached_handles(&self) -> Vec<DisplayHandle> {
        self.active
            .as_ref()
            .map(|presenter| presenter.attached())
            .unwrap_or_default()
    }

    /// Nodes waiting for a presenter after an unrecoverable switch failure
    pub fn parked(&self) -> &[DetachedNode] {
        &self.parked
    }

    // Pointer

    /// Register a listener that follows the viewer across mode switches
    pub fn subscribe(&mut self, options: SubscribeOptions, listener: PointerListener) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        let presenter_id = self
            .active
            .as_mut()
            .map(|presenter| presenter.subscribe(options.clone(), listener.clone()));
        self.subscriptions.push(Subscription {
            id,
            options,
            listener,
            presenter_id,
        });
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let Some(index) = self.subscriptions.iter().position(|s| s.id == id) else {
            return false;
        };
        let subscription = self.subscriptions.remove(index);
        if let (Some(presenter_id), Some(presenter)) = (subscription.presenter_id, self.active.as_mut()) {
            presenter.unsubscribe(presenter_id);
        }
        true
    }

    /// Queue device input for the next frame
    pub fn handle_pointer(&mut self, input: PointerInput) -> Result<()> {
        self.active_mut()?.handle_pointer(input)?;
        Ok(())
    }

    pub fn pick_at(&self, position: DVec2) -> Result<Option<PickHit>, FrameError> {
        match self.active.as_ref() {
            Some(presenter) => presenter.pick_at(position),
            None => Ok(None),
        }
    }

    // Navigation and presentation

    pub fn fly_to(&mut self, target: &GeographicPoint, options: FlyToOptions) -> Result<()> {
        self.active_mut()?.fly_to(target, options)
    }

    pub fn fit_to_extent(&mut self, extent: &Extent, options: FitOptions) -> Result<()> {
        self.active_mut()?.fit_to_extent(extent, options)
    }

    /// Add a map layer; it is rebuilt whenever the map presenter comes back
    pub fn add_layer(&mut self, config: LayerConfig) -> Result<Option<LayerId>> {
        let id = self.active_mut()?.add_layer(&config)?;
        if id.is_some() {
            self.config.layers.push(config);
        }
        Ok(id)
    }

    pub fn notify_change(&mut self) {
        if let Some(presenter) = self.active.as_mut() {
            presenter.notify_change();
        }
    }

    pub fn pause(&mut self) -> Result<()> {
        self.active_mut()?.pause()?;
        Ok(())
    }

    pub fn resume(&mut self) -> Result<()> {
        self.active_mut()?.resume()?;
        Ok(())
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        info!(width, height, "Viewer resized");
        self.container.resize(width, height);
        self.config.viewport.width = width;
        self.config.viewport.height = height;
        if let Some(presenter) = self.active.as_mut() {
            presenter.resize(width, height);
        }
    }

    /// Dispose the active presenter; display nodes stay in the scene graph
    pub fn dispose(&mut self) -> Result<()> {
        self.require_live()?;
        if let Some(mut presenter) = self.active.take() {
            if let Err(error) = presenter.dispose() {
                warn!(%error, "Presenter did not dispose cleanly");
            }
        }
        self.subscriptions.clear();
        self.update_hooks.clear();
        self.pending_switch = None;
        self.disposed = true;
        info!(entities = self.identity.len(), "Viewer disposed");
        Ok(())
    }

    // Accessors

    pub fn active_mode(&self) -> Option<PresenterMode> {
        self.active.as_ref().map(|presenter| presenter.mode())
    }

    pub fn presenter(&self) -> Option<&dyn Presenter> {
        self.active.as_deref()
    }

    pub fn presenter_mut(&mut self) -> Option<&mut (dyn Presenter + 'static)> {
        self.active.as_deref_mut()
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn runtime(&self) -> &Rc<Runtime> {
        &self.runtime
    }

    pub fn graph(&self) -> &Rc<RefCell<SceneGraph>> {
        &self.graph
    }

    pub fn adapter(&self) -> &Rc<RefCell<CoordinateAdapter>> {
        &self.adapter
    }

    pub fn container(&self) -> &Rc<Container> {
        &self.container
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl std::fmt::Debug for Viewer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Viewer")
            .field("mode", &self.active_mode())
            .field("entities", &self.identity.len())
            .field("parked", &self.parked.len())
            .field("subscriptions", &self.subscriptions.len())
            .field("switching", &self.pending_switch.is_some())
            .field("disposed", &self.disposed)
            .finish()
    }
}

/// Builder for [`Viewer`]
pub struct ViewerBuilder {
    config: ViewerConfig,
    runtime: Option<Rc<Runtime>>,
    container: Option<Rc<Container>>,
    instrumentation: Option<Rc<dyn Instrumentation>>,
    render_loop: RenderLoop,
}

impl ViewerBuilder {
    pub fn new() -> Self {
        Self {
            config: ViewerConfig::default(),
            runtime: None,
            container: None,
            instrumentation: None,
            render_loop: RenderLoop::default(),
        }
    }

    /// Start from a full configuration
    pub fn config(mut self, config: ViewerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn mode(mut self, mode: PresenterMode) -> Self {
        self.config.mode = mode;
        self
    }

    pub fn reference_system(mut self, reference_system: ReferenceSystemConfig) -> Self {
        self.config.reference_system = Some(reference_system);
        self
    }

    pub fn origin(mut self, origin: GeographicPoint) -> Self {
        self.config.origin = Some(origin);
        self
    }

    pub fn extent(mut self, extent: Extent) -> Self {
        self.config.extent = Some(extent);
        self
    }

    pub fn layer(mut self, layer: LayerConfig) -> Self {
        self.config.layers.push(layer);
        self
    }

    /// Size of the container created when none is given
    pub fn viewport(mut self, width: u32, height: u32) -> Self {
        self.config.viewport.width = width;
        self.config.viewport.height = height;
        self
    }

    pub fn container(mut self, container: Rc<Container>) -> Self {
        self.container = Some(container);
        self
    }

    pub fn runtime(mut self, runtime: Rc<Runtime>) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn instrumentation(mut self, instrumentation: Rc<dyn Instrumentation>) -> Self {
        self.instrumentation = Some(instrumentation);
        self
    }

    pub fn target_fps(mut self, target_fps: u32) -> Self {
        self.render_loop.target_fps = target_fps;
        self
    }

    pub async fn build(self) -> Result<Viewer> {
        let runtime = self
            .runtime
            .unwrap_or_else(|| Rc::new(Runtime::headless()));
        let container = self.container.unwrap_or_else(|| {
            Rc::new(Container::new(
                "viewer",
                self.config.viewport.width,
                self.config.viewport.height,
            ))
        });
        Viewer::launch(
            self.config,
            runtime,
            container,
            self.instrumentation,
            self.render_loop,
        )
        .await
    }
}

impl Default for ViewerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
