//! First-person stereo presenter over the exact tangent plane

use super::common::PresenterCore;
use super::navigation::{CameraGoal, FitOptions, FlyToOptions};
use super::surface::Container;
use super::{FrameStats, Presenter, PresenterContext, PresenterMode, RendererInfo};
use crate::config::{Lighting, ViewerConfig};
use crate::core::camera::Camera;
use crate::core::coordinates::Extent;
use crate::core::geodesy::GeographicPoint;
use crate::core::scene::TangentPlaneFrame;
use crate::error::{FrameError, Result};
use crate::layers::{LayerConfig, LayerId};
use async_trait::async_trait;
use glam::DVec3;
use std::rc::Rc;
use tracing::{debug, trace, warn};

/// Standing eye height above the origin in metres
pub const EYE_HEIGHT: f64 = 1.6;

/// Camera height above a fly-to target when none is requested
const DEFAULT_FLY_ALTITUDE: f64 = 100.0;

pub struct ImmersivePresenter {
    core: PresenterCore,
}

impl ImmersivePresenter {
    pub fn new(context: PresenterContext) -> Self {
        let mut camera = Camera::perspective(70.0, 16.0 / 9.0, 0.1, 100_000.0);
        place_at_eye_height(&mut camera);
        let renderer = RendererInfo {
            backend: "immersive-stereo",
            continuous: true,
            background: [0.0, 0.0, 0.0, 1.0],
            shadows: false,
            lighting: Lighting::default(),
        };
        Self {
            core: PresenterCore::new(
                PresenterMode::Immersive,
                context,
                Box::new(TangentPlaneFrame),
                camera,
                renderer,
            ),
        }
    }
}

/// Stand on the origin looking north (-Z in the Y-up scene)
fn place_at_eye_height(camera: &mut Camera) {
    let eye = DVec3::new(0.0, EYE_HEIGHT, 0.0);
    camera.look_at(eye, eye + DVec3::NEG_Z, DVec3::Y);
}

#[async_trait(?Send)]
impl Presenter for ImmersivePresenter {
    fn core(&self) -> &PresenterCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut PresenterCore {
        &mut self.core
    }

    async fn initialize(&mut self, container: Rc<Container>, config: &ViewerConfig) -> Result<()> {
        self.core.prepare(container, config).await?;
        place_at_eye_height(self.core.camera_mut());
        Ok(())
    }

    /// Renders continuously, so there is nothing to schedule
    fn notify_change(&mut self) {
        trace!("Immersive presenter notified of a scene change");
    }

    fn fly_to(&mut self, target: &GeographicPoint, options: FlyToOptions) -> Result<()> {
        let altitude = options.altitude.unwrap_or(DEFAULT_FLY_ALTITUDE);
        let target_scene = self.core.geographic_to_scene(target)?.value;

        // Back off to the south so the target stays ahead and below
        let eye = target_scene + DVec3::Y * altitude + DVec3::Z * altitude;
        let mut goal_camera = *self.core.camera();
        goal_camera.look_at(eye, target_scene, DVec3::Y);

        self.core.fly(
            CameraGoal {
                position: eye,
                rotation: goal_camera.transform.rotation,
                view_height: None,
            },
            options.duration,
        )?;
        debug!(target = %target, altitude, "Immersive flight started");
        Ok(())
    }

    fn fit_to_extent(&mut self, extent: &Extent, _options: FitOptions) -> Result<()> {
        warn!(?extent, "fit_to_extent is not supported by the immersive presenter; ignored");
        Ok(())
    }

    fn render(&mut self) -> Result<FrameStats, FrameError> {
        self.core.render_frame(false)
    }

    fn add_layer(&mut self, config: &LayerConfig) -> Result<Option<LayerId>> {
        warn!(
            layer = config.name(),
            kind = %config.kind(),
            "Map layers are not supported by the immersive presenter; ignored"
        );
        Ok(None)
    }
}

impl std::fmt::Debug for ImmersivePresenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImmersivePresenter")
            .field("core", &self.core)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::coordinates::CoordinateAdapter;
    use crate::core::scene::{Bounds, SceneGraph, Transform};
    use crate::presenter::{AddOptions, PresenterState, RenderLoop};
    use crate::runtime::Runtime;
    use std::cell::RefCell;

    fn presenter() -> (ImmersivePresenter, Rc<RefCell<SceneGraph>>, Rc<Container>) {
        let graph = Rc::new(RefCell::new(SceneGraph::new()));
        let origin = GeographicPoint::new(51.05, 13.74, 0.0);
        let adapter = Rc::new(RefCell::new(CoordinateAdapter::new(
            crate::config::ReferenceSystemConfig::wgs84(),
            Some(origin),
            None,
        )));
        let context = PresenterContext::new(graph.clone(), adapter, Rc::new(Runtime::headless()));
        let container = Rc::new(Container::new("view", 800, 600));
        (ImmersivePresenter::new(context), graph, container)
    }

    fn config() -> ViewerConfig {
        ViewerConfig {
            origin: Some(GeographicPoint::new(51.05, 13.74, 0.0)),
            ..Default::default()
        }
    }

    #[test]
    fn test_initialize_places_camera() {
        let (mut presenter, _, container) = presenter();
        pollster::block_on(presenter.initialize(container.clone(), &config())).unwrap();

        assert_eq!(presenter.state(), PresenterState::Ready);
        assert!((presenter.camera().position().y - EYE_HEIGHT).abs() < 1e-9);
        assert!(presenter.camera().forward().z < -0.99);
        assert!(container.owner().is_some());
    }

    #[test]
    fn test_renders_every_frame() {
        let (mut presenter, graph, container) = presenter();
        pollster::block_on(presenter.initialize(container, &config())).unwrap();
        presenter.start(RenderLoop::default()).unwrap();

        let handle = graph.borrow_mut().create_display_node(
            "crate",
            Transform::from_translation(DVec3::new(0.0, 0.0, -10.0)),
            Some(Bounds::centered(DVec3::ONE)),
        );
        presenter.add_object(handle, AddOptions::native()).unwrap();
        graph.borrow_mut().update_hierarchy();

        let first = presenter.render().unwrap();
        let second = presenter.render().unwrap();
        assert!(first.rendered && second.rendered);
        assert_eq!(first.visible, 1);
    }

    #[test]
    fn test_layers_are_ignored() {
        let (mut presenter, _, container) = presenter();
        pollster::block_on(presenter.initialize(container, &config())).unwrap();
        let layer = LayerConfig::Vector(crate::layers::VectorConfig {
            name: "roads".to_string(),
            url: "https://example.invalid/roads.geojson".to_string(),
            style: None,
            opacity: 1.0,
            visible: true,
        });
        assert_eq!(presenter.add_layer(&layer).unwrap(), None);
        assert!(presenter.layers().is_empty());
    }
}
