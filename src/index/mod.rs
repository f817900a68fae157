//! Similarity search over the places found along one route.
//!
//! A [`Corpus`] is built from an [`AnnotatedPlan`]: every place contributes one
//! descriptive text, embedded and normalized so the inner product of two
//! vectors is their cosine similarity. Each row remembers the stop and place it
//! came from, so hits map back to their context without matching on text.

mod flat;
pub mod store;

pub use flat::{dot, normalize, FlatIndex};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    clock,
    entities::{AnnotatedPlan, Place, Stop, StopWithPlaces},
    error::{empty_corpus_error, storage_error, Error},
};

pub const DEFAULT_TOP_K: usize = 3;

pub const NO_MATCH: &str = "I couldn't find any matching places for your query along the route.";

/// Position of a place inside `AnnotatedPlan::stops_with_restaurants`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryOrigin {
    pub stop: usize,
    pub place: usize,
}

#[derive(Clone, Debug)]
pub struct Corpus {
    pub token: Uuid,
    texts: Vec<String>,
    origins: Vec<EntryOrigin>,
    index: FlatIndex,
    stops: Vec<StopWithPlaces>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub name: String,
    pub rating: Option<f64>,
    pub stop_type: String,
    pub stop_time: String,
    pub address: Option<String>,
    pub score: f32,
}

impl Suggestion {
    pub fn sentence(&self) -> String {
        let rating = match self.rating {
            Some(r) if r > 0.0 => format!(" with a rating of {}/5", rating_text(r)),
            _ => String::new(),
        };

        format!(
            "You can stop at {}{} during your {} at {}. It's located at {}.",
            self.name,
            rating,
            self.stop_type.to_lowercase(),
            self.stop_time,
            self.address.as_deref().unwrap_or("an unlisted address"),
        )
    }
}

fn rating_text(rating: f64) -> String {
    if rating.fract() == 0.0 {
        format!("{:.1}", rating)
    } else {
        rating.to_string()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Suggestions {
    pub message: String,
    pub matches: Vec<Suggestion>,
}

impl Suggestions {
    pub fn new(matches: Vec<Suggestion>) -> Self {
        let message = if matches.is_empty() {
            NO_MATCH.to_string()
        } else {
            let sentences: Vec<String> = matches.iter().map(Suggestion::sentence).collect();
            format!("Here are some suggestions: \n\n{}", sentences.join("\n\n"))
        };

        Self { message, matches }
    }

    pub fn none() -> Self {
        Self::new(vec![])
    }
}

/// Descriptive texts for every place in `plan`, with their origins, in stop
/// then place order.
pub fn entries(plan: &AnnotatedPlan) -> (Vec<String>, Vec<EntryOrigin>) {
    plan.stops_with_restaurants
        .iter()
        .enumerate()
        .flat_map(|(stop, entry)| {
            entry
                .places
                .iter()
                .enumerate()
                .map(move |(place, p)| (p.search_text(), EntryOrigin { stop, place }))
        })
        .unzip()
}

impl Corpus {
    /// Builds a corpus from `plan` and one raw embedding per entry text.
    pub fn from_embeddings(
        plan: &AnnotatedPlan,
        embeddings: Vec<Vec<f32>>,
    ) -> Result<Self, Error> {
        let (texts, origins) = entries(plan);

        if embeddings.len() != texts.len() {
            return Err(crate::error::upstream_error(format!(
                "received {} embeddings for {} places",
                embeddings.len(),
                texts.len()
            )));
        }

        let dimension = embeddings.first().map(|v| v.len()).unwrap_or(0);
        let mut index = FlatIndex::new(dimension);
        for mut vector in embeddings {
            normalize(&mut vector)?;
            index.add(vector)?;
        }

        Ok(Self {
            token: Uuid::new_v4(),
            texts,
            origins,
            index,
            stops: plan.stops_with_restaurants.clone(),
        })
    }

    pub(crate) fn from_parts(
        token: Uuid,
        texts: Vec<String>,
        origins: Vec<EntryOrigin>,
        index: FlatIndex,
        stops: Vec<StopWithPlaces>,
    ) -> Result<Self, Error> {
        if texts.len() != index.len() || origins.len() != index.len() {
            return Err(storage_error(format!(
                "index has {} vectors but metadata lists {} texts and {} origins",
                index.len(),
                texts.len(),
                origins.len()
            )));
        }

        Ok(Self {
            token,
            texts,
            origins,
            index,
            stops,
        })
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    pub fn texts(&self) -> &[String] {
        &self.texts
    }

    pub fn origins(&self) -> &[EntryOrigin] {
        &self.origins
    }

    pub fn index(&self) -> &FlatIndex {
        &self.index
    }

    pub fn stops(&self) -> &[StopWithPlaces] {
        &self.stops
    }

    pub fn resolve(&self, origin: EntryOrigin) -> Option<(&Stop, &Place)> {
        let entry = self.stops.get(origin.stop)?;
        let place = entry.places.get(origin.place)?;

        Some((&entry.stop_info, place))
    }

    /// Nearest places to an already embedded query. The query is normalized
    /// here; `k` is capped at the corpus size.
    pub fn search(&self, mut query: Vec<f32>, k: usize) -> Result<Suggestions, Error> {
        if self.is_empty() {
            return Err(empty_corpus_error());
        }

        normalize(&mut query)?;

        let matches = self
            .index
            .search(&query, k.min(self.len()))?
            .into_iter()
            .filter_map(|(row, score)| {
                let origin = *self.origins.get(row)?;
                let (stop, place) = self.resolve(origin)?;

                Some(Suggestion {
                    name: place.name.clone(),
                    rating: place.rating,
                    stop_type: stop.kind.name().to_string(),
                    stop_time: clock::format(&stop.time),
                    address: place.address.clone(),
                    score,
                })
            })
            .collect();

        Ok(Suggestions::new(matches))
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::NaiveTime;

    use crate::entities::{
        AnnotatedPlan, Coordinates, Place, RouteSummary, Stop, StopKind, StopWithPlaces,
    };

    pub fn place(name: &str, address: &str, types: &[&str], rating: Option<f64>) -> Place {
        Place {
            name: name.into(),
            address: Some(address.into()),
            location: Some(Coordinates::new(36.0, -115.0)),
            rating,
            price_level: None,
            types: types.iter().map(|t| t.to_string()).collect(),
            business_status: Some("OPERATIONAL".into()),
            place_id: None,
        }
    }

    pub fn stop(kind: StopKind, elapsed: u64, hour: u32, minute: u32) -> Stop {
        Stop {
            kind,
            reason: "test".into(),
            time: NaiveTime::from_hms_opt(hour, minute, 0).unwrap(),
            duration_from_start: elapsed,
            coordinates: Coordinates::new(36.0, -115.0),
        }
    }

    pub fn plan() -> AnnotatedPlan {
        AnnotatedPlan {
            route_summary: RouteSummary {
                total_duration: "5:00:00".into(),
                total_distance: "480.0 km".into(),
                departure: "08:00 AM".into(),
                estimated_arrival: "01:00 PM".into(),
            },
            stops_with_restaurants: vec![
                StopWithPlaces {
                    stop_info: stop(StopKind::Breakfast, 1800, 8, 30),
                    places: vec![
                        place("Sunrise Pancakes", "1 Elm St", &["restaurant", "food"], Some(4.5)),
                        place("Taco Town", "9 Oak Ave", &["restaurant"], None),
                    ],
                    error: None,
                },
                StopWithPlaces {
                    stop_info: stop(StopKind::CoffeeBreak, 7200, 10, 0),
                    places: vec![],
                    error: Some("upstream request failed".into()),
                },
                StopWithPlaces {
                    stop_info: stop(StopKind::RestBreak, 9000, 10, 30),
                    places: vec![place("Bean There", "4 Pine Rd", &["cafe", "store"], Some(4.0))],
                    error: None,
                },
            ],
        }
    }
}

#[cfg(test)]
fn one_hot(i: usize) -> Vec<f32> {
    let mut v = vec![0.0; 4];
    v[i] = 2.0;
    v
}

#[test]
fn entries_follow_stop_and_place_order() {
    let (texts, origins) = entries(&fixtures::plan());

    assert_eq!(
        texts,
        vec![
            "Sunrise Pancakes 1 Elm St restaurant, food",
            "Taco Town 9 Oak Ave restaurant",
            "Bean There 4 Pine Rd cafe, store",
        ]
    );
    assert_eq!(origins[2], EntryOrigin { stop: 2, place: 0 });
}

#[test]
fn builds_unit_vectors() {
    let corpus = Corpus::from_embeddings(
        &fixtures::plan(),
        vec![one_hot(0), one_hot(1), vec![1.0, 1.0, 1.0, 1.0]],
    )
    .unwrap();

    assert_eq!(corpus.len(), 3);
    assert_eq!(corpus.index().len(), corpus.texts().len());
    assert_eq!(corpus.index().dimension(), 4);
}

#[test]
fn embedding_count_must_match() {
    let err = Corpus::from_embeddings(&fixtures::plan(), vec![one_hot(0)]).unwrap_err();
    assert!(err.is_upstream());
}

#[test]
fn maps_hits_back_to_stops() {
    let corpus = Corpus::from_embeddings(
        &fixtures::plan(),
        vec![one_hot(0), one_hot(1), one_hot(2)],
    )
    .unwrap();

    let suggestions = corpus.search(one_hot(2), 1).unwrap();
    assert_eq!(suggestions.matches.len(), 1);

    let hit = &suggestions.matches[0];
    assert_eq!(hit.name, "Bean There");
    assert_eq!(hit.stop_type, "Rest Break");
    assert_eq!(hit.stop_time, "10:30 AM");
    assert!((hit.score - 1.0).abs() < 1e-6);
    assert_eq!(
        suggestions.message,
        "Here are some suggestions: \n\nYou can stop at Bean There with a rating of 4.0/5 \
         during your rest break at 10:30 AM. It's located at 4 Pine Rd."
    );
}

#[test]
fn k_is_capped_at_corpus_size() {
    let corpus = Corpus::from_embeddings(
        &fixtures::plan(),
        vec![one_hot(0), one_hot(1), one_hot(2)],
    )
    .unwrap();

    let suggestions = corpus.search(one_hot(1), 10).unwrap();
    assert_eq!(suggestions.matches.len(), 3);
    assert_eq!(suggestions.matches[0].name, "Taco Town");
    assert!(suggestions.matches[0].sentence().starts_with("You can stop at Taco Town during"));
}

#[test]
fn empty_corpus_is_an_error() {
    let mut plan = fixtures::plan();
    plan.stops_with_restaurants.iter_mut().for_each(|s| s.places.clear());

    let corpus = Corpus::from_embeddings(&plan, vec![]).unwrap();
    assert!(corpus.is_empty());
    assert_eq!(
        corpus.search(one_hot(0), 3).unwrap_err().code,
        crate::error::EMPTY_CORPUS
    );
}

#[test]
fn no_match_message() {
    assert_eq!(Suggestions::none().message, NO_MATCH);
}
