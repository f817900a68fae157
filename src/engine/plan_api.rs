use super::Engine;

use async_trait::async_trait;

use crate::{
    api::PlanAPI,
    clock,
    entities::TravelPlan,
    error::{invalid_input_error, Error},
    planner,
};

#[async_trait]
impl PlanAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn compute_travel_plan(
        &self,
        source: &str,
        destination: &str,
        departure: &str,
    ) -> Result<TravelPlan, Error> {
        if source.trim().is_empty() || destination.trim().is_empty() {
            return Err(invalid_input_error("source and destination are required"));
        }

        // reject bad times before spending a directions request
        clock::parse(departure)?;

        let route = self.maps.directions(source, destination).await?;

        tracing::info!(
            "route found: {}s over {}m",
            route.duration_seconds,
            route.distance_meters
        );

        planner::plan_route(&route, departure)
    }
}

#[test]
fn plans_five_hour_trip() {
    use super::fakes;
    use crate::entities::{Coordinates, StopKind};
    use tokio_test::block_on;

    let dir = tempfile::tempdir().unwrap();
    let (engine, maps) = fakes::engine(
        fakes::FakeMaps {
            route: Some(fakes::five_hour_route()),
            ..Default::default()
        },
        dir.path(),
    );

    let plan =
        block_on(engine.compute_travel_plan("Los Angeles", "Las Vegas", "08:00 AM")).unwrap();

    let kinds: Vec<(StopKind, u64)> = plan
        .suggested_stops
        .iter()
        .map(|s| (s.kind, s.duration_from_start))
        .collect();
    assert_eq!(
        kinds,
        vec![
            (StopKind::Breakfast, 1800),
            (StopKind::CoffeeBreak, 7200),
            (StopKind::RestBreak, 9000),
            (StopKind::CoffeeBreak, 14_400),
        ]
    );
    assert_eq!(plan.suggested_stops[1].coordinates, Coordinates::new(3.0, 0.0));
    assert_eq!(plan.route_summary.total_distance, "480.0 km");
    assert_eq!(plan.route_summary.estimated_arrival, "01:00 PM");
    assert_eq!(plan.total_stops, 4);
    assert!(maps.calls.lock().unwrap().is_empty());
}

#[test]
fn missing_route_is_structured_error() {
    use super::fakes;
    use tokio_test::block_on;

    let dir = tempfile::tempdir().unwrap();
    let (engine, _) = fakes::engine(fakes::FakeMaps::default(), dir.path());

    let err = block_on(engine.compute_travel_plan("Here", "Nowhere", "08:00 AM")).unwrap_err();
    assert_eq!(err.body(), serde_json::json!({"code": 101, "error": "No route found"}));
}

#[test]
fn rejects_bad_input() {
    use super::fakes;
    use tokio_test::block_on;

    let dir = tempfile::tempdir().unwrap();
    let (engine, _) = fakes::engine(
        fakes::FakeMaps {
            route: Some(fakes::five_hour_route()),
            ..Default::default()
        },
        dir.path(),
    );

    let err = block_on(engine.compute_travel_plan("A", "B", "8 o'clock")).unwrap_err();
    assert_eq!(err.code, crate::error::INVALID_INPUT);

    let err = block_on(engine.compute_travel_plan("", "B", "08:00 AM")).unwrap_err();
    assert_eq!(err.code, crate::error::INVALID_INPUT);
}
