pub mod embeddings;
pub mod google_maps;

use async_trait::async_trait;

use crate::entities::{Category, Coordinates, Place, Route};
use crate::error::Error;

#[async_trait]
pub trait MapsProvider {
    /// First route between two free-text locations.
    async fn directions(&self, origin: &str, destination: &str) -> Result<Route, Error>;

    async fn places_nearby(
        &self,
        location: Coordinates,
        radius: f64,
        category: Category,
    ) -> Result<Vec<Place>, Error>;
}

#[async_trait]
pub trait EmbeddingProvider {
    /// One vector per input, in input order.
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, Error>;
}

pub type DynMaps = std::sync::Arc<dyn MapsProvider + Send + Sync>;
pub type DynEmbedder = std::sync::Arc<dyn EmbeddingProvider + Send + Sync>;
