use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::entities::{Category, Coordinates};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopKind {
    Breakfast,
    Lunch,
    Dinner,
    #[serde(rename = "Coffee Break")]
    CoffeeBreak,
    #[serde(rename = "Rest Break")]
    RestBreak,
}

impl StopKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Breakfast => "Breakfast",
            Self::Lunch => "Lunch",
            Self::Dinner => "Dinner",
            Self::CoffeeBreak => "Coffee Break",
            Self::RestBreak => "Rest Break",
        }
    }

    pub fn is_meal(&self) -> bool {
        matches!(self, Self::Breakfast | Self::Lunch | Self::Dinner)
    }

    /// Place categories searched around a stop of this kind.
    pub fn categories(&self) -> &'static [Category] {
        match self {
            Self::Breakfast | Self::Lunch | Self::Dinner => &[Category::Restaurant],
            Self::CoffeeBreak | Self::RestBreak => &[Category::Cafe, Category::Store],
        }
    }
}

impl fmt::Display for StopKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    #[serde(rename = "type")]
    pub kind: StopKind,
    pub reason: String,
    #[serde(with = "crate::clock::twelve_hour")]
    pub time: NaiveTime,
    pub duration_from_start: u64,
    pub coordinates: Coordinates,
}

#[test]
fn wire_names() {
    let json = serde_json::to_string(&StopKind::CoffeeBreak).unwrap();
    assert_eq!(json, "\"Coffee Break\"");

    let kind: StopKind = serde_json::from_str("\"Rest Break\"").unwrap();
    assert_eq!(kind, StopKind::RestBreak);
}

#[test]
fn category_lookup() {
    assert_eq!(StopKind::Lunch.categories(), &[Category::Restaurant]);
    assert_eq!(
        StopKind::RestBreak.categories(),
        &[Category::Cafe, Category::Store]
    );
    assert!(StopKind::Dinner.is_meal());
    assert!(!StopKind::CoffeeBreak.is_meal());
}

#[test]
fn stop_serializes_clock_time() {
    let stop = Stop {
        kind: StopKind::Breakfast,
        reason: "Recommended Breakfast stop".into(),
        time: NaiveTime::from_hms_opt(8, 30, 0).unwrap(),
        duration_from_start: 1800,
        coordinates: Coordinates::new(1.0, 2.0),
    };

    let value = serde_json::to_value(&stop).unwrap();
    assert_eq!(value["type"], "Breakfast");
    assert_eq!(value["time"], "08:30 AM");

    let back: Stop = serde_json::from_value(value).unwrap();
    assert_eq!(back, stop);
}
