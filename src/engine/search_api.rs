use super::Engine;

use async_trait::async_trait;

use crate::{
    api::{AnnotationAPI, PlanAPI, SearchAPI},
    entities::AnnotatedPlan,
    error::{empty_corpus_error, invalid_input_error, upstream_error, Error},
    index::{self, store, Corpus, Suggestions},
};

#[async_trait]
impl SearchAPI for Engine {
    #[tracing::instrument(skip_all, fields(places = plan.place_count()))]
    async fn build_corpus(&self, plan: &AnnotatedPlan) -> Result<Corpus, Error> {
        let (texts, _) = index::entries(plan);

        if texts.is_empty() {
            tracing::warn!("no places found along the route, nothing to index");
            store::clear(&self.index_dir)?;
            return Corpus::from_embeddings(plan, vec![]);
        }

        let embeddings = self.embedder.embed(&texts).await?;
        let corpus = Corpus::from_embeddings(plan, embeddings)?;

        store::save(&corpus, &self.index_dir)?;

        tracing::info!("indexed {} places as corpus {}", corpus.len(), corpus.token);

        Ok(corpus)
    }

    #[tracing::instrument(skip(self, corpus), fields(corpus = %corpus.token))]
    async fn search_along_route(
        &self,
        query: &str,
        corpus: &Corpus,
        k: usize,
    ) -> Result<Suggestions, Error> {
        if query.trim().is_empty() {
            return Err(invalid_input_error("query is required"));
        }

        if corpus.is_empty() {
            return Err(empty_corpus_error());
        }

        let query_vector = self
            .embedder
            .embed(&[query.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| upstream_error("embeddings provider returned no vector for the query"))?;

        let suggestions = corpus.search(query_vector, k)?;

        tracing::info!("{} matches", suggestions.matches.len());

        Ok(suggestions)
    }

    #[tracing::instrument(skip(self))]
    async fn search_route(
        &self,
        source: &str,
        destination: &str,
        departure: &str,
        query: &str,
        k: usize,
    ) -> Result<Suggestions, Error> {
        let plan = self
            .compute_travel_plan(source, destination, departure)
            .await?;
        let annotated = self.annotate_plan(plan).await;
        let corpus = self.build_corpus(&annotated).await?;

        self.search_along_route(query, &corpus, k).await
    }

    #[tracing::instrument(skip(self))]
    async fn search_saved_index(&self, query: &str, k: usize) -> Result<Suggestions, Error> {
        let corpus = store::load(&self.index_dir)?;

        self.search_along_route(query, &corpus, k).await
    }
}

#[cfg(test)]
fn annotated(engine: &Engine) -> AnnotatedPlan {
    use tokio_test::block_on;

    let plan = block_on(engine.compute_travel_plan("A", "B", "08:00 AM")).unwrap();
    block_on(engine.annotate_plan(plan))
}

#[cfg(test)]
fn route_engine() -> (Engine, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let (engine, _) = super::fakes::engine(
        super::fakes::FakeMaps {
            route: Some(super::fakes::five_hour_route()),
            ..Default::default()
        },
        dir.path(),
    );

    (engine, dir)
}

#[test]
fn corpus_vectors_are_unit_length() {
    use tokio_test::block_on;

    let (engine, _dir) = route_engine();
    let plan = annotated(&engine);
    let corpus = block_on(engine.build_corpus(&plan)).unwrap();

    assert_eq!(corpus.len(), plan.place_count());
    assert_eq!(corpus.index().len(), corpus.texts().len());

    let suggestions = block_on(engine.search_along_route("gas", &corpus, 2)).unwrap();
    for hit in &suggestions.matches {
        assert!((-1.0..=1.0).contains(&hit.score));
    }
}

#[test]
fn finds_the_closest_place() {
    use tokio_test::block_on;

    let (engine, _dir) = route_engine();
    let corpus = block_on(engine.build_corpus(&annotated(&engine))).unwrap();

    let suggestions = block_on(engine.search_along_route("Gas Mart 7", &corpus, 1)).unwrap();

    assert_eq!(suggestions.matches.len(), 1);
    let hit = &suggestions.matches[0];
    assert_eq!(hit.name, "Gas Mart 7");
    assert_eq!(hit.stop_type, "Coffee Break");
    assert_eq!(hit.stop_time, "12:00 PM");
    assert_eq!(
        suggestions.message,
        "Here are some suggestions: \n\nYou can stop at Gas Mart 7 with a rating of 3.0/5 \
         during your coffee break at 12:00 PM. It's located at Gas Mart 7 Road."
    );
}

#[test]
fn oversized_k_returns_whole_corpus() {
    use tokio_test::block_on;

    let (engine, _dir) = route_engine();
    let corpus = block_on(engine.build_corpus(&annotated(&engine))).unwrap();

    let suggestions = block_on(engine.search_along_route("coffee", &corpus, 50)).unwrap();
    assert_eq!(suggestions.matches.len(), corpus.len());

    let scores: Vec<f32> = suggestions.matches.iter().map(|m| m.score).collect();
    assert!(scores.windows(2).all(|w| w[0] >= w[1]));
}

#[test]
fn search_without_places_is_empty_corpus() {
    use tokio_test::block_on;

    let (engine, dir) = route_engine();
    let mut plan = annotated(&engine);
    block_on(engine.build_corpus(&plan)).unwrap();
    assert!(dir.path().join(store::INDEX_FILE).exists());

    plan.stops_with_restaurants
        .iter_mut()
        .for_each(|s| s.places.clear());

    let corpus = block_on(engine.build_corpus(&plan)).unwrap();
    assert!(corpus.is_empty());
    assert!(!dir.path().join(store::INDEX_FILE).exists());
    assert!(!dir.path().join(store::METADATA_FILE).exists());

    let err = block_on(engine.search_along_route("pizza", &corpus, 3)).unwrap_err();
    assert_eq!(err.code, crate::error::EMPTY_CORPUS);

    // the earlier route's index is gone too
    let err = block_on(engine.search_saved_index("pizza", 3)).unwrap_err();
    assert_eq!(err.code, crate::error::STORAGE);
}

#[test]
fn saved_index_answers_later_queries() {
    use tokio_test::block_on;

    let (engine, _dir) = route_engine();

    let err = block_on(engine.search_saved_index("diner", 3)).unwrap_err();
    assert_eq!(err.code, crate::error::STORAGE);

    let fresh = block_on(engine.search_route("A", "B", "08:00 AM", "diner", 3)).unwrap();
    let saved = block_on(engine.search_saved_index("diner", 3)).unwrap();

    assert_eq!(fresh.matches[0].name, "Diner 0");
    assert_eq!(saved.matches[0].name, "Diner 0");
    assert_eq!(saved.matches[0].stop_time, fresh.matches[0].stop_time);
    assert_eq!(saved.matches.len(), fresh.matches.len());
}

#[test]
fn blank_query_is_invalid() {
    use tokio_test::block_on;

    let (engine, _dir) = route_engine();
    let corpus = block_on(engine.build_corpus(&annotated(&engine))).unwrap();

    let err = block_on(engine.search_along_route(" ", &corpus, 3)).unwrap_err();
    assert_eq!(err.code, crate::error::INVALID_INPUT);
}
