mod annotation_api;
mod plan_api;
mod search_api;

use std::path::PathBuf;
use std::sync::Arc;

use crate::{
    api::API,
    config::Config,
    error::Error,
    external::{embeddings::OpenAiEmbedder, google_maps::GoogleMaps, DynEmbedder, DynMaps},
};

/// Places are searched within this distance of a stop.
pub const SEARCH_RADIUS_METERS: f64 = 5000.0;

pub struct Engine {
    maps: DynMaps,
    embedder: DynEmbedder,
    index_dir: PathBuf,
}

impl Engine {
    #[tracing::instrument(name = "Engine::new", skip_all)]
    pub fn new(config: &Config) -> Result<Self, Error> {
        let maps = Arc::new(GoogleMaps::new(config)?) as DynMaps;
        let embedder = Arc::new(OpenAiEmbedder::new(config)?) as DynEmbedder;

        tracing::info!("persisting indexes under {}", config.index_dir.display());

        Ok(Self::with_providers(maps, embedder, config.index_dir.clone()))
    }

    pub fn with_providers(maps: DynMaps, embedder: DynEmbedder, index_dir: PathBuf) -> Self {
        Self {
            maps,
            embedder,
            index_dir,
        }
    }
}

impl API for Engine {}

#[cfg(test)]
pub(crate) mod fakes {
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use super::Engine;
    use crate::{
        entities::{Category, Coordinates, Place, Route, Stop, StopKind},
        error::{no_route_error, upstream_error, Error},
        external::{EmbeddingProvider, MapsProvider},
    };

    // (0, 0), (1, 0) ... (9, 0): ten points north along the prime meridian
    pub const POLYLINE: &str = "??_ibE?_ibE?_ibE?_ibE?_ibE?_ibE?_ibE?_ibE?_ibE?";

    #[derive(Default)]
    pub struct FakeMaps {
        pub route: Option<Route>,
        /// Stops at this latitude fail their places lookup.
        pub failing_latitude: Option<f64>,
        pub calls: Mutex<Vec<(Coordinates, f64, Category)>>,
    }

    pub fn place(name: &str, types: &[&str], rating: Option<f64>) -> Place {
        Place {
            name: name.into(),
            address: Some(format!("{} Road", name)),
            location: None,
            rating,
            price_level: Some(1),
            types: types.iter().map(|t| t.to_string()).collect(),
            business_status: Some("OPERATIONAL".into()),
            place_id: Some(format!("id-{}", name)),
        }
    }

    #[async_trait]
    impl MapsProvider for FakeMaps {
        async fn directions(&self, _origin: &str, _destination: &str) -> Result<Route, Error> {
            self.route.clone().ok_or_else(no_route_error)
        }

        async fn places_nearby(
            &self,
            location: Coordinates,
            radius: f64,
            category: Category,
        ) -> Result<Vec<Place>, Error> {
            self.calls.lock().unwrap().push((location, radius, category));

            if Some(location.latitude) == self.failing_latitude {
                return Err(upstream_error("places request failed with status UNKNOWN_ERROR"));
            }

            let tag = format!("{:.0}", location.latitude);
            Ok(match category {
                Category::Restaurant => vec![
                    place(&format!("Diner {}", tag), &["restaurant", "food"], Some(4.5)),
                    place(&format!("Bakery Cafe {}", tag), &["cafe", "restaurant"], Some(4.8)),
                ],
                Category::Cafe => vec![place(&format!("Espresso Bar {}", tag), &["cafe"], None)],
                Category::Store => vec![
                    place(&format!("Espresso Bar {}", tag), &["cafe"], None),
                    place(&format!("Gas Mart {}", tag), &["store"], Some(3.0)),
                ],
            })
        }
    }

    pub fn stop_at(kind: StopKind, latitude: f64) -> Stop {
        Stop {
            kind,
            reason: "test".into(),
            time: chrono::NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
            duration_from_start: 1800,
            coordinates: Coordinates::new(latitude, 0.0),
        }
    }

    /// Counts words into FNV-1a buckets so texts sharing words score higher.
    /// The test vocabulary lands in distinct buckets below the last one.
    pub struct FakeEmbedder;

    pub const DIMENSION: usize = 128;

    fn bucket(word: &str) -> usize {
        let hash = word
            .to_lowercase()
            .bytes()
            .fold(0x811c9dc5u32, |h, b| (h ^ b as u32).wrapping_mul(0x01000193));
        hash as usize % DIMENSION
    }

    pub fn embed_text(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; DIMENSION];
        for word in text.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
            vector[bucket(word)] += 1.0;
        }
        // keeps every vector non-zero
        vector[DIMENSION - 1] += 0.01;
        vector
    }

    #[async_trait]
    impl EmbeddingProvider for FakeEmbedder {
        async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, Error> {
            Ok(inputs.iter().map(|t| embed_text(t)).collect())
        }
    }

    pub fn engine(maps: FakeMaps, index_dir: &Path) -> (Engine, Arc<FakeMaps>) {
        let maps = Arc::new(maps);
        let engine = Engine::with_providers(maps.clone(), Arc::new(FakeEmbedder), index_dir.into());

        (engine, maps)
    }

    /// Five hours along the ten-point polyline.
    pub fn five_hour_route() -> Route {
        Route::new(POLYLINE.into(), 18_000, 480_000)
    }
}
