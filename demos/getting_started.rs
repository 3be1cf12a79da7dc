use geolocate::{CircleQuery, Engine, Level, RegionRecord, TimeRange, TrajectoryPoint};
use std::time::{Duration, UNIX_EPOCH};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set RUST_LOG=debug to see index builds and per-query counters
    env_logger::init();

    println!("=== geolocate - Getting Started ===\n");

    let engine = Engine::builder()
        .regions(vec![
            RegionRecord::new(
                450000,
                Level::Province,
                "Guangxi",
                vec![vec![[104.5, 21.4], [112.0, 21.4], [112.0, 26.4], [104.5, 26.4]]],
            )
            .with_path("Guangxi"),
            RegionRecord::new(
                450400,
                Level::City,
                "Wuzhou",
                vec![vec![[110.3, 22.6], [111.6, 22.6], [111.6, 24.1], [110.3, 24.1]]],
            )
            .with_parent(450000)
            .with_path("Guangxi Wuzhou"),
            RegionRecord::new(
                450481,
                Level::District,
                "Cenxi",
                vec![vec![[110.7, 22.6], [111.3, 22.6], [111.3, 23.2], [110.7, 23.2]]],
            )
            .with_parent(450400)
            .with_path("Guangxi Wuzhou Cenxi"),
        ])
        .build()?;

    println!("1. Region lookup");
    println!("----------------");
    let location = engine.locate(110.995, 22.918)?;
    println!("   (110.995, 22.918) -> {}\n", location);

    println!("2. Trajectory search");
    println!("--------------------");
    let start = UNIX_EPOCH + Duration::from_secs(1_700_000_000);
    let points = (0..20u64).map(|i| {
        TrajectoryPoint::new(
            format!("V{:03}", i % 4),
            start + Duration::from_secs(i * 30),
            110.995 + i as f64 * 0.0004,
            22.918,
        )
        .with_speed(40.0)
    });
    let report = engine.ingest(points);
    println!("   Ingested {} points ({} rejected)", report.accepted, report.rejected);

    let query = CircleQuery::new(110.995, 22.918, 300.0)
        .time_range(TimeRange::between(start, start + Duration::from_secs(300)))
        .limit(5);
    for hit in engine.circle_query(&query)? {
        println!("   {} at {:.1} m", hit.vehicle_id, hit.distance_m);
    }
    println!(
        "   {} points within 300 m overall\n",
        engine.count_in_circle(&CircleQuery::new(110.995, 22.918, 300.0))?
    );

    println!("3. Vehicle track");
    println!("----------------");
    let track = engine.get_track("V001", None, Some(3))?;
    for step in &track {
        println!("   ({:.4}, {:.4})", step.lng, step.lat);
    }

    println!("\n{:#?}", engine.stats());
    Ok(())
}
