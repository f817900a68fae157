use chrono::{NaiveTime, Timelike};

use crate::{
    clock,
    entities::{Stop, StopKind},
    planner::RouteSampler,
};

/// Meal windows as `(kind, first hour, end hour exclusive, delay after departure)`.
/// Checked in order; the first window containing the departure hour wins.
const MEAL_WINDOWS: [(StopKind, u32, u32, u64); 3] = [
    (StopKind::Breakfast, 7, 9, 30 * 60),
    (StopKind::Lunch, 12, 14, 30 * 60),
    (StopKind::Dinner, 18, 20, 30 * 60),
];

const DRIVING_BREAK_INTERVAL: u64 = 2 * 3600;
const FATIGUE_THRESHOLD: u64 = 4 * 3600;

/// Suggests meal, coffee and fatigue stops for a trip leaving at `departure`,
/// sorted by time from departure.
#[tracing::instrument(skip(sampler))]
pub fn schedule(departure: NaiveTime, sampler: &RouteSampler) -> Vec<Stop> {
    let duration = sampler.duration_seconds();

    let stop_at = |kind: StopKind, reason: String, elapsed: u64| {
        let elapsed = elapsed.min(duration);

        Stop {
            kind,
            reason,
            time: clock::after(departure, elapsed),
            duration_from_start: elapsed,
            coordinates: sampler.coordinate_at(elapsed),
        }
    };

    let mut stops = vec![];

    let hour = departure.hour();
    if let Some((meal, _, _, delay)) = MEAL_WINDOWS
        .iter()
        .find(|(_, start, end, _)| (*start..*end).contains(&hour))
    {
        stops.push(stop_at(
            *meal,
            format!("Recommended {} stop", meal),
            *delay,
        ));
    }

    let mut elapsed = DRIVING_BREAK_INTERVAL;
    while elapsed < duration {
        stops.push(stop_at(
            StopKind::CoffeeBreak,
            "Scheduled driving break".into(),
            elapsed,
        ));
        elapsed += DRIVING_BREAK_INTERVAL;
    }

    if duration > FATIGUE_THRESHOLD {
        stops.push(stop_at(
            StopKind::RestBreak,
            "Mid-journey fatigue prevention".into(),
            duration / 2,
        ));
    }

    // stable: equal times keep meal, coffee, rest order
    stops.sort_by_key(|stop| stop.duration_from_start);

    tracing::info!("scheduled {} stops over {}s", stops.len(), duration);

    stops
}

#[cfg(test)]
fn sampler(duration: u64) -> RouteSampler {
    use crate::entities::Coordinates;

    let waypoints = (0..101)
        .map(|i| Coordinates::new(34.0 + i as f64 * 0.01, -118.0 + i as f64 * 0.01))
        .collect();

    RouteSampler::new(duration, waypoints).unwrap()
}

#[cfg(test)]
fn at(time: &str) -> NaiveTime {
    clock::parse(time).unwrap()
}

#[cfg(test)]
fn summary(stops: &[Stop]) -> Vec<(StopKind, u64)> {
    stops
        .iter()
        .map(|s| (s.kind, s.duration_from_start))
        .collect()
}

#[test]
fn five_hour_morning_trip() {
    let stops = schedule(at("08:00 AM"), &sampler(18_000));

    assert_eq!(
        summary(&stops),
        vec![
            (StopKind::Breakfast, 1800),
            (StopKind::CoffeeBreak, 7200),
            (StopKind::RestBreak, 9000),
            (StopKind::CoffeeBreak, 14_400),
        ]
    );
    assert_eq!(clock::format(&stops[0].time), "08:30 AM");
    assert_eq!(stops[0].reason, "Recommended Breakfast stop");
    assert_eq!(clock::format(&stops[2].time), "10:30 AM");
    assert_eq!(stops[2].coordinates, sampler(18_000).coordinate_at(9000));
}

#[test]
fn meal_windows_by_departure_hour() {
    let kinds = |time| {
        schedule(at(time), &sampler(3600))
            .into_iter()
            .filter(|s| s.kind.is_meal())
            .map(|s| s.kind)
            .collect::<Vec<_>>()
    };

    assert_eq!(kinds("07:00 AM"), vec![StopKind::Breakfast]);
    assert_eq!(kinds("08:59 AM"), vec![StopKind::Breakfast]);
    assert_eq!(kinds("09:00 AM"), vec![]);
    assert_eq!(kinds("12:15 PM"), vec![StopKind::Lunch]);
    assert_eq!(kinds("01:45 PM"), vec![StopKind::Lunch]);
    assert_eq!(kinds("06:00 PM"), vec![StopKind::Dinner]);
    assert_eq!(kinds("08:00 PM"), vec![]);
    assert_eq!(kinds("03:00 AM"), vec![]);
}

#[test]
fn coffee_breaks_strictly_before_arrival() {
    let coffee = |duration| {
        schedule(at("10:00 AM"), &sampler(duration))
            .into_iter()
            .filter(|s| s.kind == StopKind::CoffeeBreak)
            .map(|s| s.duration_from_start)
            .collect::<Vec<_>>()
    };

    assert_eq!(coffee(7200), Vec::<u64>::new());
    assert_eq!(coffee(7201), vec![7200]);
    assert_eq!(coffee(14_400), vec![7200]);
    assert_eq!(coffee(21_601), vec![7200, 14_400, 21_600]);
}

#[test]
fn fatigue_break_only_on_long_drives() {
    let rest = |duration| {
        schedule(at("10:00 AM"), &sampler(duration))
            .into_iter()
            .filter(|s| s.kind == StopKind::RestBreak)
            .map(|s| s.duration_from_start)
            .collect::<Vec<_>>()
    };

    assert_eq!(rest(14_400), Vec::<u64>::new());
    assert_eq!(rest(14_401), vec![7200]);
    assert_eq!(rest(30_001), vec![15_000]);
}

#[test]
fn coinciding_breaks_are_both_kept() {
    // duration / 2 == 14400 lands on the second coffee break
    let stops = schedule(at("10:00 AM"), &sampler(28_800));

    assert_eq!(
        summary(&stops),
        vec![
            (StopKind::CoffeeBreak, 7200),
            (StopKind::CoffeeBreak, 14_400),
            (StopKind::RestBreak, 14_400),
            (StopKind::CoffeeBreak, 21_600),
        ]
    );
}

#[test]
fn stops_stay_within_trip() {
    let departures = ["07:30 AM", "12:00 PM", "06:45 PM", "11:00 PM"];
    let durations = [0, 60, 1799, 1800, 7200, 14_401, 50_000, 200_000];

    for departure in departures {
        for duration in durations {
            let stops = schedule(at(departure), &sampler(duration));

            assert!(stops.iter().all(|s| s.duration_from_start <= duration));
            assert!(stops.iter().filter(|s| s.kind.is_meal()).count() <= 1);
            assert!(stops
                .windows(2)
                .all(|w| w[0].duration_from_start <= w[1].duration_from_start));
        }
    }
}

#[test]
fn short_trip_meal_is_clamped() {
    let stops = schedule(at("12:30 PM"), &sampler(600));

    assert_eq!(summary(&stops), vec![(StopKind::Lunch, 600)]);
    assert_eq!(clock::format(&stops[0].time), "12:40 PM");
}
