use axum::extract::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::api::{AnnotationAPI, DynAPI, PlanAPI, PlanWithSuggestions};
use crate::entities::TravelPlan;
use crate::error::Error;
use crate::server::handlers::Success;

#[derive(Serialize, Deserialize)]
pub struct TravelParams {
    source: String,
    destination: String,
    start_time: String,
}

#[derive(Serialize, Deserialize)]
pub struct CombinedParams {
    source: String,
    destination: String,
    start_time: String,
    restaurant_query: Option<String>,
}

pub async fn travel_plan(
    Extension(api): Extension<DynAPI>,
    Json(params): Json<TravelParams>,
) -> Result<Json<Success<TravelPlan>>, Error> {
    let plan = api
        .compute_travel_plan(&params.source, &params.destination, &params.start_time)
        .await?;

    Ok(Json(Success::new(plan)))
}

pub async fn travel_plan_with_restaurants(
    Extension(api): Extension<DynAPI>,
    Json(params): Json<CombinedParams>,
) -> Result<Json<Success<PlanWithSuggestions>>, Error> {
    let result = api
        .annotate_with_places(
            &params.source,
            &params.destination,
            &params.start_time,
            params.restaurant_query.as_deref(),
        )
        .await?;

    Ok(Json(Success::new(result)))
}

#[cfg(test)]
fn api() -> (DynAPI, tempfile::TempDir) {
    use crate::engine::fakes;

    let dir = tempfile::tempdir().unwrap();
    let (engine, _) = fakes::engine(
        fakes::FakeMaps {
            route: Some(fakes::five_hour_route()),
            ..Default::default()
        },
        dir.path(),
    );

    (std::sync::Arc::new(engine), dir)
}

#[test]
fn travel_plan_envelope() {
    use tokio_test::block_on;

    let (api, _dir) = api();
    let params: TravelParams = serde_json::from_value(serde_json::json!({
        "source": "Los Angeles",
        "destination": "Las Vegas",
        "start_time": "08:00 AM"
    }))
    .unwrap();

    let Json(body) = block_on(travel_plan(Extension(api), Json(params))).unwrap();
    let body = serde_json::to_value(&body).unwrap();

    assert_eq!(body["status"], "success");
    assert_eq!(body["data"]["total_stops"], 4);
    assert_eq!(body["data"]["suggested_stops"][0]["type"], "Breakfast");
    assert_eq!(body["data"]["suggested_stops"][0]["time"], "08:30 AM");
    assert_eq!(body["data"]["suggested_stops"][0]["duration_from_start"], 1800);
    assert_eq!(body["data"]["route_summary"]["total_duration"], "5:00:00");
}

#[test]
fn combined_plan_without_query() {
    use tokio_test::block_on;

    let (api, _dir) = api();
    let params: CombinedParams = serde_json::from_value(serde_json::json!({
        "source": "Los Angeles",
        "destination": "Las Vegas",
        "start_time": "08:00 AM"
    }))
    .unwrap();

    let Json(body) = block_on(travel_plan_with_restaurants(Extension(api), Json(params))).unwrap();
    let body = serde_json::to_value(&body).unwrap();

    assert_eq!(body["data"]["restaurant_suggestions"], serde_json::Value::Null);
    let stops = body["data"]["travel_plan"]["stops_with_restaurants"]
        .as_array()
        .unwrap();
    assert_eq!(stops.len(), 4);
    assert_eq!(stops[0]["places"][0]["name"], "Diner 0");
}
