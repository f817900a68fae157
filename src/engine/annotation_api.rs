use super::{Engine, SEARCH_RADIUS_METERS};

use async_trait::async_trait;
use futures::future::join_all;

use crate::{
    api::{AnnotationAPI, PlanAPI, PlanWithSuggestions, SearchAPI},
    entities::{AnnotatedPlan, Category, Place, Stop, StopWithPlaces, TravelPlan},
    error::Error,
    index::{Suggestions, DEFAULT_TOP_K},
};

#[async_trait]
impl AnnotationAPI for Engine {
    #[tracing::instrument(
        skip(self, stop),
        fields(kind = %stop.kind, at = stop.duration_from_start)
    )]
    async fn annotate_stop(&self, stop: &Stop) -> Result<Vec<Place>, Error> {
        let mut places: Vec<Place> = vec![];

        for &category in stop.kind.categories() {
            let mut found = self
                .maps
                .places_nearby(stop.coordinates, SEARCH_RADIUS_METERS, category)
                .await?;

            // dual-tagged cafes are left for coffee stops
            if category == Category::Restaurant {
                found.retain(|p| !p.has_type(Category::Cafe));
            }

            for place in found {
                let seen = place.place_id.is_some()
                    && places.iter().any(|p| p.place_id == place.place_id);
                if !seen {
                    places.push(place);
                }
            }
        }

        tracing::info!("found {} places", places.len());

        Ok(places)
    }

    #[tracing::instrument(skip_all, fields(stops = plan.suggested_stops.len()))]
    async fn annotate_plan(&self, plan: TravelPlan) -> AnnotatedPlan {
        let lookups = plan
            .suggested_stops
            .iter()
            .map(|stop| self.annotate_stop(stop));
        let results = join_all(lookups).await;

        let stops_with_restaurants = plan
            .suggested_stops
            .into_iter()
            .zip(results)
            .map(|(stop, result)| match result {
                Ok(places) => StopWithPlaces {
                    stop_info: stop,
                    places,
                    error: None,
                },
                Err(err) => {
                    tracing::warn!(
                        "places lookup failed for {} at {}s: {}",
                        stop.kind,
                        stop.duration_from_start,
                        err
                    );

                    StopWithPlaces {
                        stop_info: stop,
                        places: vec![],
                        error: Some(err.message),
                    }
                }
            })
            .collect();

        AnnotatedPlan {
            route_summary: plan.route_summary,
            stops_with_restaurants,
        }
    }

    #[tracing::instrument(skip(self))]
    async fn annotate_with_places(
        &self,
        source: &str,
        destination: &str,
        departure: &str,
        query: Option<&str>,
    ) -> Result<PlanWithSuggestions, Error> {
        let plan = self
            .compute_travel_plan(source, destination, departure)
            .await?;
        let travel_plan = self.annotate_plan(plan).await;

        let restaurant_suggestions = match query.map(str::trim).filter(|q| !q.is_empty()) {
            Some(query) => {
                let corpus = self.build_corpus(&travel_plan).await?;

                if corpus.is_empty() {
                    Some(Suggestions::none())
                } else {
                    Some(
                        self.search_along_route(query, &corpus, DEFAULT_TOP_K)
                            .await?,
                    )
                }
            }
            None => None,
        };

        Ok(PlanWithSuggestions {
            travel_plan,
            restaurant_suggestions,
        })
    }
}

#[cfg(test)]
fn test_engine(
    maps: super::fakes::FakeMaps,
) -> (Engine, std::sync::Arc<super::fakes::FakeMaps>, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let (engine, maps) = super::fakes::engine(maps, dir.path());

    (engine, maps, dir)
}

#[test]
fn meal_stops_search_restaurants_without_cafes() {
    use crate::entities::{Coordinates, StopKind};
    use tokio_test::block_on;

    let (engine, maps, _dir) = test_engine(Default::default());
    let stop = super::fakes::stop_at(StopKind::Lunch, 2.0);

    let places = block_on(engine.annotate_stop(&stop)).unwrap();

    assert_eq!(places.len(), 1);
    assert_eq!(places[0].name, "Diner 2");
    assert_eq!(places[0].rating, Some(4.5));

    let calls = maps.calls.lock().unwrap();
    assert_eq!(
        *calls,
        vec![(Coordinates::new(2.0, 0.0), 5000.0, Category::Restaurant)]
    );
}

#[test]
fn break_stops_search_cafes_and_stores() {
    use crate::entities::StopKind;
    use tokio_test::block_on;

    let (engine, maps, _dir) = test_engine(Default::default());
    let stop = super::fakes::stop_at(StopKind::CoffeeBreak, 5.0);

    let places = block_on(engine.annotate_stop(&stop)).unwrap();

    // the espresso bar comes back from both searches but is kept once
    let names: Vec<&str> = places.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Espresso Bar 5", "Gas Mart 5"]);

    let categories: Vec<Category> = maps.calls.lock().unwrap().iter().map(|c| c.2).collect();
    assert_eq!(categories, vec![Category::Cafe, Category::Store]);
}

#[test]
fn one_failing_stop_keeps_the_others() {
    use crate::entities::StopKind;
    use tokio_test::block_on;

    let (engine, _maps, _dir) = test_engine(super::fakes::FakeMaps {
        route: Some(super::fakes::five_hour_route()),
        // the rest break at 9000s samples waypoint 4
        failing_latitude: Some(4.0),
        ..Default::default()
    });

    let plan = block_on(engine.compute_travel_plan("A", "B", "08:00 AM")).unwrap();
    let annotated = block_on(engine.annotate_plan(plan));

    let stops = &annotated.stops_with_restaurants;
    assert_eq!(stops.len(), 4);
    assert_eq!(
        stops.iter().map(|s| s.stop_info.kind).collect::<Vec<_>>(),
        vec![
            StopKind::Breakfast,
            StopKind::CoffeeBreak,
            StopKind::RestBreak,
            StopKind::CoffeeBreak
        ]
    );

    assert!(stops[2].places.is_empty());
    assert!(stops[2].error.as_deref().unwrap().contains("UNKNOWN_ERROR"));

    assert_eq!(stops[0].places[0].name, "Diner 0");
    assert_eq!(stops[1].places.len(), 2);
    assert_eq!(stops[3].places[1].name, "Gas Mart 7");
    assert!(stops.iter().enumerate().all(|(i, s)| i == 2 || s.error.is_none()));
    assert_eq!(annotated.place_count(), 5);
}

#[test]
fn annotates_and_answers_query() {
    use tokio_test::block_on;

    let (engine, _maps, dir) = test_engine(super::fakes::FakeMaps {
        route: Some(super::fakes::five_hour_route()),
        ..Default::default()
    });

    let result =
        block_on(engine.annotate_with_places("A", "B", "08:00 AM", Some("diner"))).unwrap();

    let suggestions = result.restaurant_suggestions.unwrap();
    assert_eq!(suggestions.matches.len(), 3);
    assert_eq!(suggestions.matches[0].name, "Diner 0");
    assert_eq!(suggestions.matches[0].stop_type, "Breakfast");
    assert!(suggestions.message.starts_with(
        "Here are some suggestions: \n\nYou can stop at Diner 0 with a rating of 4.5/5 \
         during your breakfast at 08:30 AM."
    ));

    // the build also refreshed the saved index
    assert!(dir.path().join(crate::index::store::INDEX_FILE).exists());
}

#[test]
fn no_query_skips_search() {
    use tokio_test::block_on;

    let (engine, _maps, dir) = test_engine(super::fakes::FakeMaps {
        route: Some(super::fakes::five_hour_route()),
        ..Default::default()
    });

    let result = block_on(engine.annotate_with_places("A", "B", "08:00 AM", Some("  "))).unwrap();

    assert!(result.restaurant_suggestions.is_none());
    assert_eq!(result.travel_plan.stops_with_restaurants.len(), 4);
    assert!(!dir.path().join(crate::index::store::INDEX_FILE).exists());
}
