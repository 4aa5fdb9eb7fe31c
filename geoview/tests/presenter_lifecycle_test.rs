//! Integration tests for the presenter lifecycle and config-driven launch

use geoview::error::StateError;
use geoview::layers::RasterTilesConfig;
use geoview::prelude::*;
use geoview::presenter::{PresenterContext, PresenterFactory, RenderLoop};
use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("geoview=debug")
        .with_test_writer()
        .try_init();
}

fn immersive_config() -> ViewerConfig {
    ViewerConfig {
        origin: Some(GeographicPoint::new(51.05, 13.74, 0.0)),
        ..Default::default()
    }
}

struct Harness {
    graph: Rc<RefCell<SceneGraph>>,
    context: PresenterContext,
    container: Rc<Container>,
}

fn harness() -> Harness {
    init_tracing();
    let graph = Rc::new(RefCell::new(SceneGraph::new()));
    let adapter = Rc::new(RefCell::new(CoordinateAdapter::new(
        ReferenceSystemConfig::wgs84(),
        immersive_config().origin,
        None,
    )));
    Harness {
        context: PresenterContext::new(graph.clone(), adapter, Rc::new(Runtime::headless())),
        graph,
        container: Rc::new(Container::new("stage", 640, 480)),
    }
}

fn immersive(harness: &Harness) -> Box<dyn Presenter> {
    pollster::block_on(PresenterFactory::create(
        PresenterMode::Immersive,
        harness.context.clone(),
    ))
    .unwrap()
}

#[test]
fn test_full_lifecycle() {
    let harness = harness();
    let mut presenter = immersive(&harness);
    assert_eq!(presenter.state(), PresenterState::Uninitialized);

    pollster::block_on(presenter.initialize(harness.container.clone(), &immersive_config())).unwrap();
    assert_eq!(presenter.state(), PresenterState::Ready);
    presenter.start(RenderLoop::default()).unwrap();
    assert_eq!(presenter.state(), PresenterState::Running);
    presenter.pause().unwrap();
    assert_eq!(presenter.state(), PresenterState::Paused);
    assert!(!presenter.render().unwrap().rendered);
    presenter.resume().unwrap();
    assert!(presenter.render().unwrap().rendered);
    presenter.stop().unwrap();
    assert_eq!(presenter.state(), PresenterState::Ready);

    presenter.dispose().unwrap();
    assert_eq!(presenter.state(), PresenterState::Disposed);
    assert!(presenter.dispose_signal().is_raised());
    assert_eq!(presenter.dispose(), Err(StateError::Disposed));
    assert!(presenter
        .start(RenderLoop::default())
        .unwrap_err()
        .is_state(&StateError::Disposed));
}

#[test]
fn test_uninitialized_presenter_rejects_work() {
    let harness = harness();
    let mut presenter = immersive(&harness);
    let handle = harness
        .graph
        .borrow_mut()
        .create_display_node("crate", Transform::IDENTITY, None);

    let error = presenter.start(RenderLoop::default()).unwrap_err();
    assert!(error.is_state(&StateError::InvalidTransition {
        operation: "start",
        state: PresenterState::Uninitialized,
    }));
    assert!(matches!(
        presenter.pause(),
        Err(StateError::InvalidTransition { .. })
    ));
    assert!(presenter.add_object(handle, AddOptions::native()).is_err());
    assert!(presenter.content_root().is_err());
    assert!(presenter
        .geographic_to_scene(&GeographicPoint::new(51.05, 13.74, 0.0))
        .is_err());
}

#[test]
fn test_dispose_releases_surface_and_keeps_content() {
    let harness = harness();
    let mut presenter = immersive(&harness);
    pollster::block_on(presenter.initialize(harness.container.clone(), &immersive_config())).unwrap();
    presenter.start(RenderLoop::default()).unwrap();

    let handle = harness.graph.borrow_mut().create_display_node(
        "statue",
        Transform::from_translation(DVec3::new(3.0, 0.0, -3.0)),
        None,
    );
    presenter.add_object(handle, AddOptions::wrapped()).unwrap();
    assert!(harness.container.owner().is_some());

    presenter.dispose().unwrap();
    assert_eq!(harness.container.owner(), None);
    let graph = harness.graph.borrow();
    assert!(graph.contains(handle.entity()));
    assert_eq!(graph.parent_of(handle.entity()), None);
    // Only the statue is left; root and wrapper are gone
    assert_eq!(graph.len(), 1);
}

#[test]
fn test_container_has_a_single_owner() {
    let harness = harness();
    let mut first = immersive(&harness);
    pollster::block_on(first.initialize(harness.container.clone(), &immersive_config())).unwrap();

    let mut second = immersive(&harness);
    let error = pollster::block_on(second.initialize(harness.container.clone(), &immersive_config()))
        .unwrap_err();
    assert!(matches!(
        error,
        geoview::error::ViewerError::State(StateError::SurfaceInUse { .. })
    ));
    assert_eq!(second.state(), PresenterState::Uninitialized);

    first.release_surface();
    pollster::block_on(second.initialize(harness.container.clone(), &immersive_config())).unwrap();
    assert!(first.start(RenderLoop::default()).is_err());
}

#[test]
fn test_dropped_presenter_cleans_up() {
    let harness = harness();
    {
        let mut presenter = immersive(&harness);
        pollster::block_on(presenter.initialize(harness.container.clone(), &immersive_config()))
            .unwrap();
        presenter.start(RenderLoop::default()).unwrap();
        assert_eq!(harness.graph.borrow().len(), 1);
    }
    assert_eq!(harness.container.owner(), None);
    assert!(harness.graph.borrow().is_empty());
}

const MAP_CONFIG: &str = r#"{
    "mode": "map",
    "reference_system": { "code": "EPSG:32633" },
    "extent": { "min_x": 400000, "max_x": 420000, "min_y": 5650000, "max_y": 5660000 },
    "viewport": { "width": 1000, "height": 500 },
    "layers": [
        { "kind": "raster_tiles", "name": "osm", "url_template": "https://tile.example.org/{z}/{x}/{y}.png" }
    ]
}"#;

#[test]
fn test_launch_from_config_file_and_keep_layers() {
    init_tracing();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(MAP_CONFIG.as_bytes()).unwrap();
    let config = ViewerConfig::load_from_file(file.path()).unwrap();

    let mut viewer = pollster::block_on(Viewer::builder().config(config).build()).unwrap();
    assert_eq!(viewer.active_mode(), Some(PresenterMode::Map));
    assert_eq!(viewer.container().size(), (1000, 500));
    assert_eq!(viewer.presenter().unwrap().layers().len(), 1);

    // The origin was seeded from the extent center
    let origin = viewer.adapter().borrow().origin().unwrap().projected();
    assert!((origin.x - 410_000.0).abs() < 1e-3);
    assert!((origin.y - 5_655_000.0).abs() < 1e-3);

    let added = viewer
        .add_layer(LayerConfig::RasterTiles(RasterTilesConfig {
            name: "hillshade".to_string(),
            url_template: "https://tile.example.org/hillshade/{z}/{x}/{y}.png".to_string(),
            min_zoom: 0,
            max_zoom: 16,
            opacity: 0.5,
            visible: true,
            attribution: None,
        }))
        .unwrap();
    assert!(added.is_some());

    pollster::block_on(viewer.switch_mode(PresenterMode::Immersive, ConfigOverrides::new())).unwrap();
    assert!(viewer.presenter().unwrap().layers().is_empty());
    pollster::block_on(viewer.switch_mode(PresenterMode::Map, ConfigOverrides::new())).unwrap();
    assert_eq!(viewer.presenter().unwrap().layers().len(), 2);
}

#[test]
fn test_degree_extent_under_projected_system_is_converted() {
    init_tracing();
    let mut viewer = pollster::block_on(
        Viewer::builder()
            .mode(PresenterMode::Map)
            .reference_system(ReferenceSystemConfig::code("EPSG:32633"))
            .extent(Extent::new(13.6, 13.9, 51.0, 51.1))
            .viewport(800, 600)
            .build(),
    )
    .unwrap();

    // Degrees were recognised; the camera frames kilometres, not a 0.3 m box
    let height = match viewer.presenter().unwrap().camera().projection_mode {
        ProjectionMode::Orthographic { height } => height,
        ProjectionMode::Perspective => panic!("map camera must be orthographic"),
    };
    assert!(height > 10_000.0 && height < 20_000.0, "view height {height}");

    viewer
        .fit_to_extent(
            &Extent::new(405_000.0, 406_000.0, 5_655_000.0, 5_656_000.0),
            FitOptions { duration: 0.0 },
        )
        .unwrap();
    let height = match viewer.presenter().unwrap().camera().projection_mode {
        ProjectionMode::Orthographic { height } => height,
        ProjectionMode::Perspective => unreachable!(),
    };
    assert!((height - 1_100.0).abs() < 1e-3);
}
