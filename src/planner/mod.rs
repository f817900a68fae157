mod sampler;
mod scheduler;

pub use sampler::RouteSampler;
pub use scheduler::schedule;

use crate::{
    clock,
    entities::{Route, RouteSummary, TravelPlan},
    error::Error,
};

/// Schedules stops along `route` for a departure given as `"HH:MM AM/PM"`.
#[tracing::instrument(skip(route), fields(duration = route.duration_seconds))]
pub fn plan_route(route: &Route, departure: &str) -> Result<TravelPlan, Error> {
    let departure = clock::parse(departure)?;
    let sampler = RouteSampler::from_polyline(&route.polyline, route.duration_seconds)?;

    let stops = schedule(departure, &sampler);

    let summary = RouteSummary {
        total_duration: clock::format_duration(route.duration_seconds),
        total_distance: route.distance_text(),
        departure: clock::format(&departure),
        estimated_arrival: clock::format(&clock::after(departure, route.duration_seconds)),
    };

    Ok(TravelPlan::new(summary, stops))
}

#[test]
fn plans_from_directions() {
    let route = Route::new("_p~iF~ps|U_ulLnnqC_mqNvxq`@".into(), 18_000, 412_345);
    let plan = plan_route(&route, "08:00 AM").unwrap();

    assert_eq!(plan.route_summary.total_duration, "5:00:00");
    assert_eq!(plan.route_summary.total_distance, "412.3 km");
    assert_eq!(plan.route_summary.departure, "08:00 AM");
    assert_eq!(plan.route_summary.estimated_arrival, "01:00 PM");
    assert_eq!(plan.total_stops, 4);
    assert_eq!(plan.suggested_stops.len(), 4);
}

#[test]
fn bad_departure_is_invalid_input() {
    let route = Route::new("_p~iF~ps|U".into(), 600, 1000);
    let err = plan_route(&route, "half past eight").unwrap_err();

    assert_eq!(err.code, crate::error::INVALID_INPUT);
}
