//! Integration tests for pointer normalization and picking

use geoview::core::scene::is_wrapper;
use geoview::prelude::*;
use geoview::presenter::FlyToOptions;
use std::cell::RefCell;
use std::rc::Rc;
use winit::event::{ElementState, MouseButton};

const CENTER: DVec2 = DVec2::new(400.0, 300.0);
const CORNER: DVec2 = DVec2::new(2.0, 2.0);

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("geoview=debug")
        .with_test_writer()
        .try_init();
}

struct Scene {
    viewer: Viewer,
    tower: DisplayHandle,
    lamp: DisplayHandle,
    marker: DisplayHandle,
}

/// A tower ten metres ahead of the camera with a lamp mounted in front of
/// it, and a marker box on the origin
fn scene() -> Scene {
    init_tracing();
    let mut viewer = pollster::block_on(
        Viewer::builder()
            .origin(GeographicPoint::new(51.05, 13.74, 0.0))
            .viewport(800, 600)
            .build(),
    )
    .unwrap();

    let tower = viewer
        .spawn_entity(
            EntityId(1),
            "tower",
            Transform::from_translation(DVec3::new(0.0, 1.6, -10.0)),
            Some(Bounds::centered(DVec3::ONE)),
            AddOptions::wrapped(),
        )
        .unwrap();
    let lamp = viewer.graph().borrow_mut().create_display_node(
        "lamp",
        Transform::from_translation(DVec3::new(0.0, 0.0, 2.0)),
        Some(Bounds::centered(DVec3::splat(0.5))),
    );
    viewer
        .graph()
        .borrow_mut()
        .attach(lamp.entity(), tower.entity())
        .unwrap();
    let marker = viewer
        .spawn_entity(
            EntityId(2),
            "marker",
            Transform::IDENTITY,
            Some(Bounds::centered(DVec3::ONE)),
            AddOptions::wrapped(),
        )
        .unwrap();

    // Propagate world transforms before anything is picked
    viewer.tick(1.0 / 60.0).unwrap();
    Scene {
        viewer,
        tower,
        lamp,
        marker,
    }
}

fn recorder(options: SubscribeOptions, viewer: &mut Viewer) -> Rc<RefCell<Vec<PointerEvent>>> {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = events.clone();
    viewer.subscribe(options, listener(move |event| sink.borrow_mut().push(event.clone())));
    events
}

#[test]
fn test_pick_reports_entity_not_wrapper_or_child() {
    let Scene {
        viewer,
        tower,
        lamp,
        ..
    } = scene();

    let hit = viewer.pick_at(CENTER).unwrap().expect("tower is straight ahead");
    assert_eq!(hit.handle, tower);
    assert_eq!(hit.node, lamp.entity());
    // Near face of the lamp
    assert!((hit.point.z + 7.5).abs() < 1e-6);
    assert!(hit.distance > 0.0);

    let graph = viewer.graph().borrow();
    let parent = graph.parent_of(tower.entity()).unwrap();
    assert!(is_wrapper(&graph, parent));
    assert_ne!(hit.handle.entity(), parent);
    assert_eq!(viewer.entity_of(hit.handle), Some(EntityId(1)));
}

#[test]
fn test_pointer_sequence_produces_normalized_events() {
    let Scene {
        mut viewer, tower, ..
    } = scene();
    let events = recorder(SubscribeOptions::all(), &mut viewer);

    let mut pointer = PointerState::new();
    viewer.handle_pointer(pointer.cursor_entered()).unwrap();
    viewer.handle_pointer(pointer.cursor_moved(CENTER.x, CENTER.y)).unwrap();
    viewer
        .handle_pointer(pointer.mouse_button(MouseButton::Left, ElementState::Pressed))
        .unwrap();
    viewer.handle_pointer(pointer.cursor_moved(CENTER.x + 2.0, CENTER.y)).unwrap();
    viewer
        .handle_pointer(pointer.mouse_button(MouseButton::Left, ElementState::Released))
        .unwrap();
    viewer.handle_pointer(pointer.cursor_left()).unwrap();
    viewer.tick(1.0 / 60.0).unwrap();

    let events = events.borrow();
    let kinds: Vec<PointerEventKind> = events.iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![
            PointerEventKind::PointerEnter,
            PointerEventKind::Hover,
            PointerEventKind::PointerDown,
            PointerEventKind::Hover,
            PointerEventKind::PointerUp,
            PointerEventKind::Select,
            PointerEventKind::PointerLeave,
        ]
    );

    let select = &events[5];
    assert_eq!(select.handle, Some(tower));
    assert_eq!(select.mode, PresenterMode::Immersive);
    assert!(select.device.is_click);
    let geographic = select.geographic.expect("hit has a geographic position");
    assert!(geographic.latitude > 51.05);
    assert!((geographic.longitude - 13.74).abs() < 1e-4);

    // Leaving is never hit-tested
    assert_eq!(events[6].handle, None);
}

#[test]
fn test_drag_is_not_a_select() {
    let Scene { mut viewer, .. } = scene();
    let events = recorder(SubscribeOptions::only([PointerEventKind::Select]), &mut viewer);

    let mut pointer = PointerState::new();
    pointer.cursor_moved(CENTER.x, CENTER.y);
    viewer
        .handle_pointer(pointer.mouse_button(MouseButton::Left, ElementState::Pressed))
        .unwrap();
    pointer.cursor_moved(CENTER.x + 40.0, CENTER.y);
    viewer
        .handle_pointer(pointer.mouse_button(MouseButton::Left, ElementState::Released))
        .unwrap();
    viewer.tick(1.0 / 60.0).unwrap();

    assert!(events.borrow().is_empty());
}

#[test]
fn test_empty_click_is_suppressed_unless_requested() {
    let Scene { mut viewer, .. } = scene();
    let default = recorder(SubscribeOptions::all(), &mut viewer);
    let eager = recorder(SubscribeOptions::all().emit_on_empty_pick(true), &mut viewer);

    viewer
        .handle_pointer(PointerInput::new(PointerAction::Pressed, CORNER).with_button(MouseButton::Left))
        .unwrap();
    viewer.handle_pointer(PointerInput::click(CORNER)).unwrap();
    viewer
        .handle_pointer(PointerInput::new(PointerAction::Moved, CORNER))
        .unwrap();
    viewer.tick(1.0 / 60.0).unwrap();

    let default_kinds: Vec<_> = default.borrow().iter().map(|e| e.kind).collect();
    assert_eq!(default_kinds, vec![PointerEventKind::Hover]);

    let eager = eager.borrow();
    assert_eq!(eager.len(), 4);
    assert!(eager.iter().all(|e| e.handle.is_none() && e.point.is_none()));
}

#[test]
fn test_input_burst_keeps_the_newest_events() {
    let Scene { mut viewer, .. } = scene();
    let events = recorder(SubscribeOptions::only([PointerEventKind::Hover]), &mut viewer);

    for x in 0..300 {
        viewer
            .handle_pointer(PointerInput::new(PointerAction::Moved, DVec2::new(f64::from(x), 5.0)))
            .unwrap();
    }
    viewer.tick(1.0 / 60.0).unwrap();

    let events = events.borrow();
    assert_eq!(events.len(), 256);
    assert_eq!(events[0].device.position.x, 44.0);
    assert_eq!(events[255].device.position.x, 299.0);
}

#[test]
fn test_unsubscribed_listener_is_silent() {
    let Scene { mut viewer, .. } = scene();
    let events = Rc::new(RefCell::new(0usize));
    let sink = events.clone();
    let id = viewer.subscribe(
        SubscribeOptions::all(),
        listener(move |_| *sink.borrow_mut() += 1),
    );
    assert!(viewer.unsubscribe(id));
    assert!(!viewer.unsubscribe(id));

    viewer.handle_pointer(PointerInput::click(CENTER)).unwrap();
    viewer.tick(1.0 / 60.0).unwrap();
    assert_eq!(*events.borrow(), 0);
}

#[test]
fn test_map_picks_the_same_entities() {
    let Scene {
        mut viewer,
        tower,
        marker,
        ..
    } = scene();
    let events = recorder(SubscribeOptions::only([PointerEventKind::Select]), &mut viewer);

    pollster::block_on(
        viewer.switch_mode(
            PresenterMode::Map,
            ConfigOverrides::new()
                .reference_system(ReferenceSystemConfig::code("EPSG:32633"))
                .extent(Extent::new(400_000.0, 420_000.0, 5_650_000.0, 5_660_000.0)),
        ),
    )
    .unwrap();
    viewer
        .fly_to(&GeographicPoint::new(51.05, 13.74, 0.0), FlyToOptions::instant())
        .unwrap();
    viewer.tick(1.0 / 60.0).unwrap();

    // Looking straight down on the origin
    let hit = viewer.pick_at(CENTER).unwrap().expect("marker sits on the origin");
    assert_eq!(hit.handle, marker);
    assert_ne!(hit.handle, tower);

    viewer.handle_pointer(PointerInput::click(CENTER)).unwrap();
    viewer.tick(1.0 / 60.0).unwrap();
    let events = events.borrow();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].handle, Some(marker));
    assert_eq!(events[0].mode, PresenterMode::Map);
}
