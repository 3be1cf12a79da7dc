use geolocate::{
    CircleQuery, Config, Engine, GeoLocateError, Level, RegionRecord, TimeRange, TrajectoryPoint,
};
use std::time::{Duration, UNIX_EPOCH};

/// Empty engine answers everything with empty results
#[test]
fn test_empty_engine() {
    let engine = Engine::default();
    assert!(!engine.locate(0.0, 0.0).unwrap().is_found());
    let query = CircleQuery::new(0.0, 0.0, 1_000.0);
    assert!(engine.circle_query(&query).unwrap().is_empty());
    assert_eq!(engine.count_in_circle(&query).unwrap(), 0);
    assert!(engine.get_track("V1", None, None).unwrap().is_empty());
    assert!(engine.region(1).is_none());
}

/// Circles straddling the antimeridian find points on both sides
#[test]
fn test_antimeridian_circle() {
    let engine = Engine::default();
    engine.ingest(vec![
        TrajectoryPoint::new("E", UNIX_EPOCH, 179.999, 0.0),
        TrajectoryPoint::new("W", UNIX_EPOCH, -179.999, 0.0),
        TrajectoryPoint::new("F", UNIX_EPOCH, 179.0, 0.0),
    ]);

    let hits = engine
        .circle_query(&CircleQuery::new(180.0, 0.0, 1_000.0))
        .unwrap();
    let vehicles: Vec<_> = hits.iter().map(|h| h.vehicle_id.as_str()).collect();
    assert_eq!(hits.len(), 2);
    assert!(vehicles.contains(&"E") && vehicles.contains(&"W"));
}

/// Circles around a pole cover every longitude
#[test]
fn test_polar_circle() {
    let engine = Engine::default();
    engine.ingest(vec![
        TrajectoryPoint::new("A", UNIX_EPOCH, 0.0, 89.999),
        TrajectoryPoint::new("B", UNIX_EPOCH, 180.0, 89.999),
        TrajectoryPoint::new("C", UNIX_EPOCH, -90.0, 89.999),
    ]);
    let query = CircleQuery::new(45.0, 90.0, 1_000.0);
    assert_eq!(engine.count_in_circle(&query).unwrap(), 3);
}

/// Identical positions are all returned and tie-broken stably
#[test]
fn test_duplicate_positions() {
    let engine = Engine::default();
    let points = (0..5u64).map(|i| {
        TrajectoryPoint::new(format!("V{}", i), UNIX_EPOCH + Duration::from_secs(i), 10.0, 10.0)
    });
    engine.ingest(points);

    let query = CircleQuery::new(10.0, 10.0, 1.0);
    let first = engine.circle_query(&query).unwrap();
    assert_eq!(first.len(), 5);
    for _ in 0..5 {
        assert_eq!(engine.circle_query(&query).unwrap(), first);
    }
}

/// Invalid trajectory points are counted and skipped
#[test]
fn test_ingest_report() {
    let engine = Engine::default();
    let report = engine.ingest(vec![
        TrajectoryPoint::new("ok", UNIX_EPOCH, 1.0, 1.0),
        TrajectoryPoint::new("bad", UNIX_EPOCH, 1.0, f64::NAN),
        TrajectoryPoint::new("bad", UNIX_EPOCH, -181.0, 1.0),
    ]);
    assert_eq!(report.accepted, 1);
    assert_eq!(report.rejected, 2);
    assert_eq!(engine.stats().trajectories.vehicles, 1);
}

/// Malformed regions are skipped unless strict loading is on
#[test]
fn test_malformed_regions() {
    let records = || {
        vec![
            RegionRecord::new(
                1,
                Level::Province,
                "Fine",
                vec![vec![[0.0, 0.0], [2.0, 0.0], [2.0, 2.0], [0.0, 2.0]]],
            ),
            RegionRecord::new(2, Level::Province, "Line", vec![vec![[0.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]),
            RegionRecord::new(3, Level::City, "Nothing", vec![]),
        ]
    };

    let lenient = Engine::default();
    let stats = lenient.load_regions(records()).unwrap();
    assert_eq!(stats.provinces, 1);
    assert_eq!(stats.skipped, 2);
    assert_eq!(lenient.locate(1.0, 1.0).unwrap().province.unwrap().id, 1);

    let strict = Engine::new(Config::default().with_strict_region_load(true)).unwrap();
    assert!(matches!(
        strict.load_regions(records()),
        Err(GeoLocateError::DataError { region_id: 2, .. })
    ));
}

/// Closed and open rings describe the same region
#[test]
fn test_closed_ring_equivalent() {
    let open = vec![[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0]];
    let mut closed = open.clone();
    closed.push([0.0, 0.0]);

    let engine = Engine::default();
    engine
        .load_regions(vec![
            RegionRecord::new(1, Level::Province, "Open", vec![open]),
            RegionRecord::new(2, Level::Province, "Closed", vec![closed]),
        ])
        .unwrap();

    for &(lng, lat) in &[(1.0, 1.0), (3.9, 0.1), (5.0, 5.0)] {
        let index = engine.region_index();
        let a = index.get(1).unwrap().contains(lng, lat);
        let b = index.get(2).unwrap().contains(lng, lat);
        assert_eq!(a, b);
    }
}

/// Inverted time windows are rejected, degenerate ones are allowed
#[test]
fn test_time_range_validation() {
    let engine = Engine::default();
    let t = UNIX_EPOCH + Duration::from_secs(100);
    engine.ingest(vec![TrajectoryPoint::new("V", t, 1.0, 1.0)]);

    let inverted = TimeRange::between(t, t - Duration::from_secs(1));
    assert!(engine.get_track("V", Some(inverted), None).is_err());
    assert!(
        engine
            .circle_query(&CircleQuery::new(1.0, 1.0, 10.0).time_range(inverted))
            .is_err()
    );

    let instant = TimeRange::between(t, t);
    assert_eq!(engine.get_track("V", Some(instant), None).unwrap().len(), 1);
}

/// Large radius covering the whole dataset
#[test]
fn test_huge_radius() {
    let engine = Engine::default();
    engine.ingest(vec![
        TrajectoryPoint::new("A", UNIX_EPOCH, -170.0, -60.0),
        TrajectoryPoint::new("B", UNIX_EPOCH, 170.0, 60.0),
    ]);
    let query = CircleQuery::new(0.0, 0.0, 25_000_000.0);
    assert_eq!(engine.count_in_circle(&query).unwrap(), 2);
}

/// A point on the far side of the globe is still within a covering radius
#[test]
fn test_antipodal_point_in_range() {
    let engine = Engine::default();
    engine.ingest(vec![
        TrajectoryPoint::new("NEAR", UNIX_EPOCH, 116.407, 2.5),
        TrajectoryPoint::new("ANTI", UNIX_EPOCH, -63.593, -2.5),
    ]);

    let query = CircleQuery::new(116.407, 2.5, 21_000_000.0);
    let hits = engine.circle_query(&query).unwrap();
    let vehicles: Vec<_> = hits.iter().map(|h| h.vehicle_id.as_str()).collect();
    assert_eq!(vehicles, vec!["NEAR", "ANTI"]);
    assert!(hits[1].distance_m.is_finite());
    assert!(hits[1].distance_m > 20_000_000.0);
    assert_eq!(engine.count_in_circle(&query).unwrap(), 2);
}

/// A generous deadline never trips
#[test]
fn test_deadline_configured() {
    let engine = Engine::new(Config::default().with_query_deadline(Duration::from_secs(60))).unwrap();
    engine.ingest(vec![TrajectoryPoint::new("A", UNIX_EPOCH, 1.0, 1.0)]);
    assert_eq!(
        engine
            .circle_query(&CircleQuery::new(1.0, 1.0, 10.0))
            .unwrap()
            .len(),
        1
    );
}

/// Sub-millisecond deadlines are a valid configuration
#[test]
fn test_sub_millisecond_deadline_accepted() {
    let config = Config::default().with_query_deadline(Duration::from_micros(500));
    assert_eq!(config.query_deadline(), Some(Duration::from_millis(1)));
    assert!(Engine::new(config).is_ok());
}
