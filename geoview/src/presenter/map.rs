//! Tiled 2.5D map presenter over the projected grid
//!
//! The scene is Z-up with x east and y north along the grid, offset from
//! the origin's projected position. The camera looks straight down with a
//! parallel projection and frames are drawn only when something changed.

use super::common::PresenterCore;
use super::navigation::{CameraGoal, FitOptions, FlyToOptions};
use super::surface::Container;
use super::{FrameStats, Presenter, PresenterContext, PresenterMode, RendererInfo};
use crate::config::{Lighting, ViewerConfig};
use crate::core::camera::Camera;
use crate::core::coordinates::{normalize_extent, Extent};
use crate::core::geodesy::GeographicPoint;
use crate::core::scene::ProjectedFrame;
use crate::error::{ConfigError, FrameError, Result};
use crate::layers::{Layer, LayerConfig, LayerContext, LayerId};
use async_trait::async_trait;
use glam::{DQuat, DVec3};
use std::rc::Rc;
use tracing::{debug, info, trace, warn};

/// Height of the camera above the ground plane; a parallel projection
/// only needs it to keep the scene between the clip planes
const CAMERA_ALTITUDE: f64 = 10_000.0;

/// Visible margin around a fitted extent
const FIT_PADDING: f64 = 1.1;

const DEFAULT_FLY_ALTITUDE: f64 = 1_000.0;

/// Half the vertical field of view an altitude is translated with
const VIRTUAL_HALF_FOV_DEG: f64 = 30.0;

pub struct MapPresenter {
    core: PresenterCore,
    layers: Vec<(LayerId, Layer)>,
    next_layer: u32,
    home: Option<Extent>,
}

impl MapPresenter {
    pub fn new(context: PresenterContext) -> Self {
        let mut camera = Camera::orthographic(1_000.0, 16.0 / 9.0, 0.1, 1_000_000.0);
        camera.transform.translation = DVec3::new(0.0, 0.0, CAMERA_ALTITUDE);
        let renderer = RendererInfo {
            backend: "map-tiles",
            continuous: false,
            background: [1.0, 1.0, 1.0, 1.0],
            shadows: false,
            lighting: Lighting::Flat,
        };
        Self {
            core: PresenterCore::new(
                PresenterMode::Map,
                context,
                Box::new(ProjectedFrame),
                camera,
                renderer,
            ),
            layers: Vec::new(),
            next_layer: 0,
            home: None,
        }
    }

    /// Initial extent in the active reference system
    pub fn home_extent(&self) -> Option<&Extent> {
        self.home.as_ref()
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers
            .iter()
            .find(|(layer_id, _)| *layer_id == id)
            .map(|(_, layer)| layer)
    }

    pub fn set_layer_visible(&mut self, id: LayerId, visible: bool) -> bool {
        let Some((_, layer)) = self.layers.iter_mut().find(|(layer_id, _)| *layer_id == id) else {
            return false;
        };
        layer.visible = visible;
        self.core.mark_damaged();
        true
    }

    fn build_layer(&mut self, config: &LayerConfig) -> Result<LayerId> {
        let layer = {
            let adapter = self.core.adapter();
            let context = LayerContext {
                adapter: &*adapter,
                runtime: self.core.runtime(),
            };
            self.core.runtime().layers().build(config, &context)?
        };
        let id = LayerId(self.next_layer);
        self.next_layer += 1;
        info!(layer = %id, name = %layer.name, kind = %layer.kind, "Map layer added");
        self.layers.push((id, layer));
        self.core.mark_damaged();
        Ok(id)
    }

    /// Camera goal framing `extent`, which is already in the active system
    fn goal_for(&self, extent: &Extent) -> Result<CameraGoal> {
        let min = self
            .core
            .projected_to_scene(extent.min().extend(0.0))?
            .value;
        let max = self
            .core
            .projected_to_scene(extent.max().extend(0.0))?
            .value;
        let center = (min + max) * 0.5;
        let size = (max - min).abs();
        let aspect = self.core.camera().aspect_ratio.max(f64::EPSILON);

        Ok(CameraGoal {
            position: DVec3::new(center.x, center.y, CAMERA_ALTITUDE),
            rotation: DQuat::IDENTITY,
            view_height: Some(size.y.max(size.x / aspect).max(1.0) * FIT_PADDING),
        })
    }
}

#[async_trait(?Send)]
impl Presenter for MapPresenter {
    fn core(&self) -> &PresenterCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut PresenterCore {
        &mut self.core
    }

    async fn initialize(&mut self, container: Rc<Container>, config: &ViewerConfig) -> Result<()> {
        self.core.prepare(container, config).await?;

        let extent = config.extent.as_ref().ok_or(ConfigError::MissingExtent)?;
        let home = {
            let adapter = self.core.adapter();
            normalize_extent(extent, &adapter, self.core.runtime())?
        };
        let goal = self.goal_for(&home)?;
        self.core.fly(goal, 0.0)?;
        debug!(extent = ?home, "Map camera framed on initial extent");
        self.home = Some(home);

        for layer in &config.layers {
            self.build_layer(layer)?;
        }
        Ok(())
    }

    fn notify_change(&mut self) {
        trace!("Map presenter damaged");
        self.core.mark_damaged();
    }

    fn fly_to(&mut self, target: &GeographicPoint, options: FlyToOptions) -> Result<()> {
        let altitude = options.altitude.unwrap_or(DEFAULT_FLY_ALTITUDE);
        let target_scene = self.core.geographic_to_scene(target)?.value;
        let view_height = 2.0 * altitude * VIRTUAL_HALF_FOV_DEG.to_radians().tan();

        self.core.fly(
            CameraGoal {
                position: DVec3::new(target_scene.x, target_scene.y, CAMERA_ALTITUDE),
                rotation: DQuat::IDENTITY,
                view_height: Some(view_height),
            },
            options.duration,
        )?;
        debug!(target = %target, altitude, view_height, "Map flight started");
        Ok(())
    }

    fn fit_to_extent(&mut self, extent: &Extent, options: FitOptions) -> Result<()> {
        let normalized = {
            let adapter = self.core.adapter();
            normalize_extent(extent, &adapter, self.core.runtime())?
        };
        let goal = self.goal_for(&normalized)?;
        self.core.fly(goal, options.duration)?;
        debug!(extent = ?normalized, "Fitting map to extent");
        Ok(())
    }

    fn render(&mut self) -> Result<FrameStats, FrameError> {
        self.core.render_frame(true)
    }

    fn add_layer(&mut self, config: &LayerConfig) -> Result<Option<LayerId>> {
        if let Err(error) = self.core.content_root() {
            warn!(layer = config.name(), %error, "Layer rejected");
            return Err(error.into());
        }
        self.build_layer(config).map(Some)
    }

    fn layers(&self) -> Vec<(LayerId, Layer)> {
        self.layers.clone()
    }
}

impl std::fmt::Debug for MapPresenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapPresenter")
            .field("core", &self.core)
            .field("layers", &self.layers.len())
            .field("home", &self.home)
            .finish()
    }
}
