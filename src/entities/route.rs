use serde::{Deserialize, Serialize};

/// The first leg of a directions response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub polyline: String,
    pub duration_seconds: u64,
    pub distance_meters: u64,
}

impl Route {
    pub fn new(polyline: String, duration_seconds: u64, distance_meters: u64) -> Self {
        Route {
            polyline,
            duration_seconds,
            distance_meters,
        }
    }

    pub fn distance_text(&self) -> String {
        format!("{:.1} km", self.distance_meters as f64 / 1000.0)
    }
}

#[test]
fn distance_in_km() {
    let route = Route::new(String::new(), 60, 123_456);
    assert_eq!(route.distance_text(), "123.5 km");

    let route = Route::new(String::new(), 60, 40);
    assert_eq!(route.distance_text(), "0.0 km");
}
