use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    config::Config,
    entities::{Category, Coordinates, Place, Route},
    error::{invalid_input_error, no_route_error, upstream_error, Error},
    external::MapsProvider,
};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Geometry {
    pub location: Coordinates,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct NearbyPlace {
    name: String,
    vicinity: Option<String>,
    geometry: Option<Geometry>,
    rating: Option<f64>,
    price_level: Option<u8>,
    #[serde(default)]
    types: Vec<String>,
    business_status: Option<String>,
    place_id: Option<String>,
}

impl From<NearbyPlace> for Place {
    fn from(p: NearbyPlace) -> Self {
        Place {
            name: p.name,
            address: p.vicinity,
            location: p.geometry.map(|g| g.location),
            rating: p.rating,
            price_level: p.price_level,
            types: p.types,
            business_status: p.business_status,
            place_id: p.place_id,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct Polyline {
    points: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct Measure {
    value: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct Leg {
    duration: Measure,
    distance: Measure,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct DirectionsRoute {
    overview_polyline: Polyline,
    #[serde(default)]
    legs: Vec<Leg>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct Response<T> {
    status: String,
    results: Option<T>,
    routes: Option<T>,
}

/// Client for the Google Maps directions and places web services.
#[derive(Clone, Debug)]
pub struct GoogleMaps {
    client: reqwest::Client,
    api_base: String,
    key: String,
}

impl GoogleMaps {
    pub fn new(config: &Config) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(config.provider_timeout)
            .build()?;

        Ok(Self {
            client,
            api_base: config.google_maps_api_base.clone(),
            key: config.google_maps_api_key.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("https://{}/maps/api/{}/json", self.api_base, path)
    }
}

fn check_status(status_code: u16) -> Result<(), Error> {
    if (400..500).contains(&status_code) {
        return Err(invalid_input_error(format!(
            "maps provider rejected the request ({})",
            status_code
        )));
    } else if status_code != 200 {
        return Err(upstream_error(format!(
            "maps provider responded with {}",
            status_code
        )));
    }

    Ok(())
}

fn first_leg(data: Response<Vec<DirectionsRoute>>) -> Result<Route, Error> {
    match data.status.as_str() {
        "OK" => (),
        "ZERO_RESULTS" | "NOT_FOUND" => return Err(no_route_error()),
        status => {
            return Err(upstream_error(format!(
                "directions request failed with status {}",
                status
            )))
        }
    }

    let route = data
        .routes
        .and_then(|routes| routes.into_iter().next())
        .ok_or_else(no_route_error)?;
    let leg = route.legs.first().ok_or_else(no_route_error)?;

    Ok(Route::new(
        route.overview_polyline.points,
        leg.duration.value,
        leg.distance.value,
    ))
}

fn nearby_places(data: Response<Vec<NearbyPlace>>) -> Result<Vec<Place>, Error> {
    if !(data.status == "OK" || data.status == "ZERO_RESULTS") {
        return Err(upstream_error(format!(
            "places request failed with status {}",
            data.status
        )));
    }

    Ok(data
        .results
        .unwrap_or_default()
        .into_iter()
        .map(Place::from)
        .collect())
}

#[async_trait]
impl MapsProvider for GoogleMaps {
    #[tracing::instrument(skip(self))]
    async fn directions(&self, origin: &str, destination: &str) -> Result<Route, Error> {
        let res = self
            .client
            .get(self.url("directions"))
            .query(&[("key", self.key.as_str())])
            .query(&[("origin", origin)])
            .query(&[("destination", destination)])
            .send()
            .await?;

        check_status(res.status().as_u16())?;

        let data: Response<Vec<DirectionsRoute>> = res.json().await?;

        first_leg(data)
    }

    #[tracing::instrument(skip(self))]
    async fn places_nearby(
        &self,
        location: Coordinates,
        radius: f64,
        category: Category,
    ) -> Result<Vec<Place>, Error> {
        let location: String = location.into();

        let res = self
            .client
            .get(self.url("place/nearbysearch"))
            .query(&[("key", self.key.as_str())])
            .query(&[("location", location)])
            .query(&[("radius", radius)])
            .query(&[("type", category.name())])
            .send()
            .await?;

        check_status(res.status().as_u16())?;

        let data: Response<Vec<NearbyPlace>> = res.json().await?;

        nearby_places(data)
    }
}

#[test]
fn parses_directions() {
    let data: Response<Vec<DirectionsRoute>> = serde_json::from_str(
        r#"{
            "status": "OK",
            "routes": [{
                "overview_polyline": {"points": "_p~iF~ps|U_ulLnnqC"},
                "legs": [{
                    "duration": {"value": 18000, "text": "5 hours"},
                    "distance": {"value": 480000, "text": "480 km"}
                }]
            }]
        }"#,
    )
    .unwrap();

    let route = first_leg(data).unwrap();
    assert_eq!(route, Route::new("_p~iF~ps|U_ulLnnqC".into(), 18_000, 480_000));
}

#[test]
fn empty_directions_is_no_route() {
    let data: Response<Vec<DirectionsRoute>> =
        serde_json::from_str(r#"{"status": "OK", "routes": []}"#).unwrap();
    assert_eq!(first_leg(data).unwrap_err().message, "No route found");

    let data: Response<Vec<DirectionsRoute>> =
        serde_json::from_str(r#"{"status": "ZERO_RESULTS", "routes": []}"#).unwrap();
    assert_eq!(first_leg(data).unwrap_err().message, "No route found");

    let data: Response<Vec<DirectionsRoute>> =
        serde_json::from_str(r#"{"status": "REQUEST_DENIED"}"#).unwrap();
    assert_eq!(first_leg(data).unwrap_err().code, crate::error::UPSTREAM);
}

#[test]
fn parses_nearby_places_leaving_absent_fields_unset() {
    let data: Response<Vec<NearbyPlace>> = serde_json::from_str(
        r#"{
            "status": "OK",
            "results": [
                {
                    "name": "Mel's Diner",
                    "vicinity": "12 Route 66",
                    "geometry": {"location": {"lat": 35.1, "lng": -106.6}},
                    "rating": 4.2,
                    "price_level": 2,
                    "types": ["restaurant", "food"],
                    "business_status": "OPERATIONAL",
                    "place_id": "abc"
                },
                {"name": "Nameless Stand"}
            ]
        }"#,
    )
    .unwrap();

    let places = nearby_places(data).unwrap();
    assert_eq!(places.len(), 2);
    assert_eq!(places[0].address.as_deref(), Some("12 Route 66"));
    assert_eq!(places[0].location, Some(Coordinates::new(35.1, -106.6)));
    assert_eq!(places[0].price_level, Some(2));
    assert_eq!(places[1].rating, None);
    assert_eq!(places[1].address, None);
    assert!(places[1].types.is_empty());
}

#[test]
fn provider_status_codes() {
    assert!(check_status(200).is_ok());
    assert_eq!(check_status(403).unwrap_err().code, crate::error::INVALID_INPUT);
    assert_eq!(check_status(503).unwrap_err().code, crate::error::UPSTREAM);
}
