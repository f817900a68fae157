use serde::{Deserialize, Serialize};

use crate::entities::{Place, Stop};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RouteSummary {
    pub total_duration: String,
    pub total_distance: String,
    pub departure: String,
    pub estimated_arrival: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TravelPlan {
    pub route_summary: RouteSummary,
    pub suggested_stops: Vec<Stop>,
    pub total_stops: usize,
}

impl TravelPlan {
    pub fn new(route_summary: RouteSummary, suggested_stops: Vec<Stop>) -> Self {
        Self {
            route_summary,
            total_stops: suggested_stops.len(),
            suggested_stops,
        }
    }
}

/// A stop together with the places found around it. `error` is set when the
/// places lookup for this stop failed; `places` is then empty.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StopWithPlaces {
    pub stop_info: Stop,
    pub places: Vec<Place>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedPlan {
    pub route_summary: RouteSummary,
    pub stops_with_restaurants: Vec<StopWithPlaces>,
}

impl AnnotatedPlan {
    pub fn place_count(&self) -> usize {
        self.stops_with_restaurants
            .iter()
            .map(|s| s.places.len())
            .sum()
    }
}
