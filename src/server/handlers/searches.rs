use axum::extract::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::api::{DynAPI, SearchAPI};
use crate::error::{invalid_input_error, Error};
use crate::index::{Suggestions, DEFAULT_TOP_K};
use crate::server::handlers::Success;

#[derive(Serialize, Deserialize)]
pub struct RestaurantSearchParams {
    query: String,
    source: Option<String>,
    destination: Option<String>,
    start_time: Option<String>,
    k: Option<usize>,
}

#[derive(Serialize, Deserialize)]
pub struct SavedSearchParams {
    query: String,
    k: Option<usize>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

pub async fn restaurant_search(
    Extension(api): Extension<DynAPI>,
    Json(params): Json<RestaurantSearchParams>,
) -> Result<Json<Success<Suggestions>>, Error> {
    let (source, destination, start_time) = match (
        present(&params.source),
        present(&params.destination),
        present(&params.start_time),
    ) {
        (Some(s), Some(d), Some(t)) => (s, d, t),
        _ => {
            return Err(invalid_input_error(
                "Source, destination, and start_time must be provided for restaurant search.",
            ))
        }
    };

    let suggestions = api
        .search_route(
            source,
            destination,
            start_time,
            &params.query,
            params.k.unwrap_or(DEFAULT_TOP_K),
        )
        .await?;

    Ok(Json(Success::new(suggestions)))
}

pub async fn saved_search(
    Extension(api): Extension<DynAPI>,
    Json(params): Json<SavedSearchParams>,
) -> Result<Json<Success<Suggestions>>, Error> {
    let suggestions = api
        .search_saved_index(&params.query, params.k.unwrap_or(DEFAULT_TOP_K))
        .await?;

    Ok(Json(Success::new(suggestions)))
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
fn search_requires_route_fields() {
    use tokio_test::block_on;

    let (api, _dir) = api();
    let params: RestaurantSearchParams = serde_json::from_value(serde_json::json!({
        "query": "pancakes",
        "source": "Los Angeles",
        "start_time": "08:00 AM"
    }))
    .unwrap();

    let err = block_on(restaurant_search(Extension(api), Json(params))).unwrap_err();
    assert_eq!(err.code, crate::error::INVALID_INPUT);
    assert!(err.message.starts_with("Source, destination, and start_time"));
}

#[test]
fn search_then_reuse_saved_index() {
    use tokio_test::block_on;

    let (api, _dir) = api();
    let params: RestaurantSearchParams = serde_json::from_value(serde_json::json!({
        "query": "gas mart",
        "source": "Los Angeles",
        "destination": "Las Vegas",
        "start_time": "08:00 AM",
        "k": 2
    }))
    .unwrap();

    let Json(body) = block_on(restaurant_search(Extension(api.clone()), Json(params))).unwrap();
    let body = serde_json::to_value(&body).unwrap();
    assert_eq!(body["status"], "success");
    assert_eq!(body["data"]["matches"].as_array().unwrap().len(), 2);
    assert!(body["data"]["matches"][0]["name"]
        .as_str()
        .unwrap()
        .starts_with("Gas Mart"));

    let params: SavedSearchParams =
        serde_json::from_value(serde_json::json!({"query": "diner"})).unwrap();
    let Json(body) = block_on(saved_search(Extension(api), Json(params))).unwrap();
    let body = serde_json::to_value(&body).unwrap();
    assert_eq!(body["data"]["matches"][0]["name"], "Diner 0");
}
