use geo_types::Coord;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    #[serde(alias = "lat")]
    pub latitude: f64,
    #[serde(alias = "lng")]
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Rounds both axes to `digits` decimal places.
    pub fn rounded(&self, digits: i32) -> Self {
        let factor = 10f64.powi(digits);

        Self {
            latitude: (self.latitude * factor).round() / factor,
            longitude: (self.longitude * factor).round() / factor,
        }
    }
}

// polylines decode into (x = longitude, y = latitude)
impl From<Coord<f64>> for Coordinates {
    fn from(coord: Coord<f64>) -> Self {
        Self::new(coord.y, coord.x)
    }
}

impl From<Coordinates> for String {
    fn from(coordinates: Coordinates) -> Self {
        format!("{},{}", coordinates.latitude, coordinates.longitude)
    }
}

#[test]
fn google_field_names() {
    let c: Coordinates = serde_json::from_str(r#"{"lat": 12.5, "lng": -3.25}"#).unwrap();
    assert_eq!(c, Coordinates::new(12.5, -3.25));

    let query: String = c.into();
    assert_eq!(query, "12.5,-3.25");
}

#[test]
fn rounds_to_five_places() {
    let c = Coordinates::new(38.123456789, -120.987654321).rounded(5);
    assert_eq!(c, Coordinates::new(38.12346, -120.98765));
}
