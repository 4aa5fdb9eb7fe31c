//! Headless viewer demo: one scene shown through both presenters

use geoview::core::scene::components::Name;
use geoview::core::scene::SceneGraph;
use geoview::prelude::*;
use std::path::Path;
use tracing::{info, warn};
use winit::event::{ElementState, MouseButton};

const FRAME_DT: f64 = 1.0 / 60.0;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    geoview::init_logging();
    info!("Starting geoview demo");

    let config = match std::env::args().nth(1) {
        Some(path) => ViewerConfig::load_from_file(Path::new(&path))?,
        None => default_config(),
    };
    let start_mode = config.mode;

    let mut viewer = pollster::block_on(Viewer::builder().config(config).build())?;
    create_demo_scene(&mut viewer)?;

    viewer.subscribe(
        SubscribeOptions::only([PointerEventKind::Select]),
        listener(|event| match (event.handle, event.geographic) {
            (Some(handle), Some(at)) => info!(mode = %event.mode, %handle, %at, "Selected"),
            (Some(handle), None) => info!(mode = %event.mode, %handle, "Selected"),
            _ => {}
        }),
    );
    viewer.add_update_hook(spin_beacon);

    run_frames(&mut viewer, 30)?;
    click_center(&mut viewer)?;

    let other = match start_mode {
        PresenterMode::Immersive => PresenterMode::Map,
        PresenterMode::Map => PresenterMode::Immersive,
    };
    for mode in [other, start_mode] {
        let overrides = map_overrides(viewer.config());
        match pollster::block_on(viewer.switch_mode(mode, overrides)) {
            Ok(()) => info!(%mode, entities = viewer.identity().len(), "Switched"),
            Err(error) => warn!(%mode, %error, "Switch failed"),
        }
        if let Some(origin) = viewer.config().origin {
            viewer.fly_to(&origin, FlyToOptions::instant())?;
        }
        run_frames(&mut viewer, 30)?;
        click_center(&mut viewer)?;
    }

    viewer.dispose()?;
    info!("Demo finished");
    Ok(())
}

/// Immersive view over Dresden when no config file is given
fn default_config() -> ViewerConfig {
    ViewerConfig {
        mode: PresenterMode::Immersive,
        origin: Some(GeographicPoint::new(51.0504, 13.7373, 0.0)),
        ..Default::default()
    }
}

/// Fill in what the map needs when the config came without it
fn map_overrides(config: &ViewerConfig) -> ConfigOverrides {
    let mut overrides = ConfigOverrides::new();
    if config.reference_system.is_none() {
        overrides = overrides.reference_system(ReferenceSystemConfig::code("EPSG:32633"));
    }
    if config.extent.is_none() {
        overrides = overrides.extent(
            Extent::new(405_000.0, 418_000.0, 5_652_000.0, 5_662_000.0)
                .with_reference_system("EPSG:32633"),
        );
    }
    overrides
}

fn create_demo_scene(viewer: &mut Viewer) -> Result<(), ViewerError> {
    // A tower straight ahead of the default camera
    viewer.spawn_entity(
        EntityId(1),
        "tower",
        Transform::from_translation(DVec3::new(0.0, 15.0, -40.0)),
        Some(Bounds::centered(DVec3::new(4.0, 15.0, 4.0))),
        AddOptions::wrapped(),
    )?;

    // A beacon anchored a few hundred metres away
    viewer.spawn_entity(
        EntityId(2),
        "beacon",
        Transform::IDENTITY,
        Some(Bounds::centered(DVec3::splat(2.0))),
        AddOptions::wrapped_at(GeographicPoint::new(51.0525, 13.7410, 0.0)),
    )?;

    // Ground marker placed directly in scene coordinates
    viewer.spawn_entity(
        EntityId(3),
        "marker",
        Transform::from_translation(DVec3::new(10.0, 0.0, -10.0)),
        Some(Bounds::centered(DVec3::new(1.0, 0.1, 1.0))),
        AddOptions::native(),
    )?;

    info!(entities = viewer.identity().len(), "Demo scene created");
    Ok(())
}

fn spin_beacon(graph: &mut SceneGraph, dt: f64) {
    let beacons: Vec<_> = graph
        .inner()
        .query::<&Name>()
        .iter()
        .filter(|(_, name)| name.0 == "beacon")
        .map(|(entity, _)| entity)
        .collect();
    for entity in beacons {
        if let Some(mut transform) = graph.transform(entity) {
            transform.rotation = DQuat::from_rotation_y(dt) * transform.rotation;
            let _ = graph.set_transform(entity, transform);
        }
    }
}

fn run_frames(viewer: &mut Viewer, frames: usize) -> Result<(), ViewerError> {
    let mut drawn = 0;
    for _ in 0..frames {
        if let Some(stats) = viewer.tick(FRAME_DT)? {
            if stats.rendered {
                drawn += 1;
            }
        }
    }
    info!(mode = ?viewer.active_mode(), frames, drawn, "Frames run");
    Ok(())
}

/// Press and release the left button in the middle of the container
fn click_center(viewer: &mut Viewer) -> Result<(), ViewerError> {
    let (width, height) = viewer.container().size();
    let mut pointer = PointerState::new();
    viewer.handle_pointer(pointer.cursor_entered())?;
    viewer.handle_pointer(pointer.cursor_moved(width as f64 / 2.0, height as f64 / 2.0))?;
    viewer.handle_pointer(pointer.mouse_button(MouseButton::Left, ElementState::Pressed))?;
    viewer.handle_pointer(pointer.mouse_button(MouseButton::Left, ElementState::Released))?;
    viewer.tick(FRAME_DT)?;

    match viewer.pick_at(DVec2::new(width as f64 / 2.0, height as f64 / 2.0)) {
        Ok(Some(hit)) => info!(
            handle = %hit.handle,
            entity = ?viewer.entity_of(hit.handle),
            distance = hit.distance,
            "Center pick"
        ),
        Ok(None) => info!("Center pick hit nothing"),
        Err(error) => warn!(%error, "Center pick failed"),
    }
    Ok(())
}
