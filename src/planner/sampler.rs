use crate::{
    entities::Coordinates,
    error::{no_route_error, upstream_error, Error},
};

/// Google encodes overview polylines with five decimal places.
const POLYLINE_PRECISION: u32 = 5;

/// Maps elapsed driving time onto the decoded waypoints of a route, assuming
/// waypoints are spread evenly in time.
#[derive(Clone, Debug)]
pub struct RouteSampler {
    duration_seconds: u64,
    waypoints: Vec<Coordinates>,
}

impl RouteSampler {
    pub fn new(duration_seconds: u64, waypoints: Vec<Coordinates>) -> Result<Self, Error> {
        if waypoints.is_empty() {
            return Err(no_route_error());
        }

        Ok(Self {
            duration_seconds,
            waypoints,
        })
    }

    #[tracing::instrument(skip(encoded))]
    pub fn from_polyline(encoded: &str, duration_seconds: u64) -> Result<Self, Error> {
        let line = polyline::decode_polyline(encoded, POLYLINE_PRECISION)
            .map_err(|err| upstream_error(format!("malformed route polyline: {}", err)))?;

        let waypoints: Vec<Coordinates> = line.0.into_iter().map(Coordinates::from).collect();

        tracing::info!("decoded {} waypoints", waypoints.len());

        Self::new(duration_seconds, waypoints)
    }

    pub fn duration_seconds(&self) -> u64 {
        self.duration_seconds
    }

    pub fn waypoints(&self) -> &[Coordinates] {
        &self.waypoints
    }

    pub fn coordinate_at(&self, elapsed_seconds: u64) -> Coordinates {
        let last = self.waypoints.len() - 1;

        let index = if self.duration_seconds == 0 {
            0
        } else {
            let elapsed = elapsed_seconds.min(self.duration_seconds);
            let fraction = (elapsed as f64 / self.duration_seconds as f64).min(1.0);
            ((fraction * last as f64).floor() as usize).min(last)
        };

        self.waypoints[index].rounded(5)
    }
}

#[cfg(test)]
fn line(n: usize) -> Vec<Coordinates> {
    (0..n)
        .map(|i| Coordinates::new(40.0 + i as f64 * 0.1, -75.0 - i as f64 * 0.1))
        .collect()
}

#[test]
fn endpoints() {
    let waypoints = line(11);
    let sampler = RouteSampler::new(3600, waypoints.clone()).unwrap();

    assert_eq!(sampler.coordinate_at(0), waypoints[0].rounded(5));
    assert_eq!(sampler.coordinate_at(3600), waypoints[10].rounded(5));
    assert_eq!(sampler.coordinate_at(99_999), waypoints[10].rounded(5));
}

#[test]
fn floors_fractional_index() {
    let waypoints = line(11);
    let sampler = RouteSampler::new(1000, waypoints.clone()).unwrap();

    // 0.55 * 10 = 5.5
    assert_eq!(sampler.coordinate_at(550), waypoints[5].rounded(5));
    assert_eq!(sampler.coordinate_at(99), waypoints[0].rounded(5));
    assert_eq!(sampler.coordinate_at(100), waypoints[1].rounded(5));
}

#[test]
fn zero_duration_uses_first_waypoint() {
    let waypoints = line(4);
    let sampler = RouteSampler::new(0, waypoints.clone()).unwrap();

    assert_eq!(sampler.coordinate_at(0), waypoints[0].rounded(5));
    assert_eq!(sampler.coordinate_at(500), waypoints[0].rounded(5));
}

#[test]
fn single_waypoint() {
    let sampler = RouteSampler::new(7200, line(1)).unwrap();
    assert_eq!(sampler.coordinate_at(3600), line(1)[0]);
}

#[test]
fn empty_route_is_no_route() {
    let err = RouteSampler::new(100, vec![]).unwrap_err();
    assert_eq!(err.message, "No route found");
}

#[test]
fn decodes_google_polyline() {
    // example from the Google encoded polyline documentation
    let sampler = RouteSampler::from_polyline("_p~iF~ps|U_ulLnnqC_mqNvxq`@", 100).unwrap();

    assert_eq!(
        sampler.waypoints(),
        &[
            Coordinates::new(38.5, -120.2),
            Coordinates::new(40.7, -120.95),
            Coordinates::new(43.252, -126.453),
        ]
    );
    assert_eq!(sampler.coordinate_at(100), Coordinates::new(43.252, -126.453));
}

#[test]
fn malformed_polyline_is_upstream_error() {
    // truncated mid-value, and a latitude with no longitude after it
    for encoded in ["_", "~", "_p~iF~ps|U_ulL"] {
        let err = RouteSampler::from_polyline(encoded, 100).unwrap_err();
        assert_eq!(err.code, crate::error::UPSTREAM, "{}", encoded);
        assert!(err.message.starts_with("malformed route polyline"));
    }
}
