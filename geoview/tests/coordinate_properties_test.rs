//! Property tests for the geodetic and projection round trips

use geoview::config::ReferenceSystemConfig;
use geoview::core::coordinates::CoordinateAdapter;
use geoview::core::geodesy::{ecef_to_geodetic, geodetic_to_ecef, GeographicPoint};
use geoview::runtime::Runtime;
use glam::DVec3;
use proptest::prelude::*;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("geoview=warn")
        .with_test_writer()
        .try_init();
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    #[test]
    fn ecef_round_trip(
        latitude in -89.0f64..89.0,
        longitude in -180.0f64..180.0,
        height in -500.0f64..10_000.0,
    ) {
        let point = GeographicPoint::new(latitude, longitude, height);
        let back = ecef_to_geodetic(geodetic_to_ecef(&point));

        prop_assert!(back.is_reliable());
        prop_assert!((back.value.latitude - latitude).abs() < 1e-9);
        prop_assert!((back.value.longitude - longitude).abs() < 1e-9);
        prop_assert!((back.value.height - height).abs() < 1e-4);
    }

    #[test]
    fn transverse_mercator_round_trip(
        latitude in -75.0f64..75.0,
        longitude in 12.0f64..18.0,
    ) {
        let runtime = Runtime::headless();
        let projection = runtime.projection_for("EPSG:32633").unwrap();
        let point = GeographicPoint::new(latitude, longitude, 0.0);

        let projected = projection.forward(&point);
        prop_assert!(projected.is_reliable());
        let back = projection.inverse(projected.value);
        prop_assert!(back.is_reliable());
        prop_assert!((back.value.latitude - latitude).abs() < 1e-9);
        prop_assert!((back.value.longitude - longitude).abs() < 1e-9);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn enu_round_trip_near_origin(
        origin_latitude in -80.0f64..80.0,
        origin_longitude in -179.0f64..179.0,
        offset_latitude in -0.5f64..0.5,
        offset_longitude in -0.5f64..0.5,
        height in 0.0f64..2_000.0,
    ) {
        init_tracing();
        let runtime = Runtime::headless();
        let origin = GeographicPoint::new(origin_latitude, origin_longitude, 0.0);
        let mut adapter = CoordinateAdapter::new(ReferenceSystemConfig::wgs84(), Some(origin), None);
        pollster::block_on(adapter.initialize(&runtime)).unwrap();

        let target = GeographicPoint::new(
            origin_latitude + offset_latitude,
            origin_longitude + offset_longitude,
            height,
        );
        let enu = adapter.geographic_to_enu(&target).unwrap();
        prop_assert!(enu.is_reliable());
        let back = adapter.enu_to_geographic(enu.value).unwrap();
        prop_assert!(back.is_reliable());

        let error = geodetic_to_ecef(&back.value).distance(geodetic_to_ecef(&target));
        prop_assert!(error < 1e-3, "round trip drifted by {error} m");
    }

    #[test]
    fn rebase_preserves_world_position(
        east in -5_000.0f64..5_000.0,
        north in -5_000.0f64..5_000.0,
        up in -100.0f64..100.0,
        shift_latitude in -0.05f64..0.05,
        shift_longitude in -0.05f64..0.05,
    ) {
        init_tracing();
        let runtime = Runtime::headless();
        let dresden = GeographicPoint::new(51.05, 13.74, 0.0);
        let mut adapter = CoordinateAdapter::new(
            ReferenceSystemConfig::code("EPSG:32633"),
            Some(dresden),
            None,
        );
        pollster::block_on(adapter.initialize(&runtime)).unwrap();

        let world = adapter.enu_to_geographic(DVec3::new(east, north, up)).unwrap().value;
        adapter
            .set_origin(GeographicPoint::new(
                dresden.latitude + shift_latitude,
                dresden.longitude + shift_longitude,
                0.0,
            ))
            .unwrap();
        let relocated = adapter
            .enu_to_geographic(adapter.geographic_to_enu(&world).unwrap().value)
            .unwrap()
            .value;

        let error = geodetic_to_ecef(&relocated).distance(geodetic_to_ecef(&world));
        prop_assert!(error < 0.01, "rebase moved the point by {error} m");
    }
}
