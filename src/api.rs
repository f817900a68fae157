use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::entities::{AnnotatedPlan, Place, Stop, TravelPlan};
use crate::error::Error;
use crate::index::{Corpus, Suggestions};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlanWithSuggestions {
    pub travel_plan: AnnotatedPlan,
    pub restaurant_suggestions: Option<Suggestions>,
}

#[async_trait]
pub trait PlanAPI {
    async fn compute_travel_plan(
        &self,
        source: &str,
        destination: &str,
        departure: &str,
    ) -> Result<TravelPlan, Error>;
}

#[async_trait]
pub trait AnnotationAPI {
    async fn annotate_stop(&self, stop: &Stop) -> Result<Vec<Place>, Error>;
    async fn annotate_plan(&self, plan: TravelPlan) -> AnnotatedPlan;
    async fn annotate_with_places(
        &self,
        source: &str,
        destination: &str,
        departure: &str,
        query: Option<&str>,
    ) -> Result<PlanWithSuggestions, Error>;
}

#[async_trait]
pub trait SearchAPI {
    async fn build_corpus(&self, plan: &AnnotatedPlan) -> Result<Corpus, Error>;
    async fn search_along_route(
        &self,
        query: &str,
        corpus: &Corpus,
        k: usize,
    ) -> Result<Suggestions, Error>;
    async fn search_route(
        &self,
        source: &str,
        destination: &str,
        departure: &str,
        query: &str,
        k: usize,
    ) -> Result<Suggestions, Error>;
    async fn search_saved_index(&self, query: &str, k: usize) -> Result<Suggestions, Error>;
}

pub trait API: PlanAPI + AnnotationAPI + SearchAPI {}

pub type DynAPI = Arc<dyn API + Send + Sync>;
