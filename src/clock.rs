//! 12-hour wall clock helpers shared by the scheduler and the JSON surface.

use chrono::{Duration, NaiveTime};

use crate::error::{invalid_input_error, Error};

pub const FORMAT: &str = "%I:%M %p";

/// Parses a departure time such as `"08:30 AM"`.
pub fn parse(input: &str) -> Result<NaiveTime, Error> {
    NaiveTime::parse_from_str(input.trim(), FORMAT).map_err(|err| {
        invalid_input_error(format!(
            "time data '{}' does not match format 'HH:MM AM/PM': {}",
            input, err
        ))
    })
}

pub fn format(time: &NaiveTime) -> String {
    time.format(FORMAT).to_string()
}

/// Wall clock time `seconds` after `start`, wrapping past midnight.
pub fn after(start: NaiveTime, seconds: u64) -> NaiveTime {
    let (time, _) = start.overflowing_add_signed(Duration::seconds(seconds as i64));
    time
}

/// Renders a duration as `H:MM:SS`, prefixed with `N day(s), ` past 24 hours.
pub fn format_duration(seconds: u64) -> String {
    let days = seconds / 86_400;
    let rem = seconds % 86_400;
    let clock = format!("{}:{:02}:{:02}", rem / 3600, (rem % 3600) / 60, rem % 60);

    match days {
        0 => clock,
        1 => format!("1 day, {}", clock),
        n => format!("{} days, {}", n, clock),
    }
}

/// serde adapter storing a [`NaiveTime`] in the 12-hour text form.
pub mod twelve_hour {
    use chrono::NaiveTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format(time))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, super::FORMAT).map_err(de::Error::custom)
    }
}

#[test]
fn parses_and_formats() {
    let t = parse("08:30 AM").unwrap();
    assert_eq!(format(&t), "08:30 AM");

    let t = parse("7:05 pm").unwrap();
    assert_eq!(format(&t), "07:05 PM");
}

#[test]
fn rejects_malformed_time() {
    let err = parse("25:99").unwrap_err();
    assert_eq!(err.code, crate::error::INVALID_INPUT);
    assert!(err.message.contains("25:99"));
}

#[test]
fn wraps_past_midnight() {
    let t = parse("10:00 PM").unwrap();
    assert_eq!(format(&after(t, 3 * 3600)), "01:00 AM");
}

#[test]
fn duration_text() {
    assert_eq!(format_duration(0), "0:00:00");
    assert_eq!(format_duration(18_000), "5:00:00");
    assert_eq!(format_duration(3_725), "1:02:05");
    assert_eq!(format_duration(86_400 + 61), "1 day, 0:01:01");
    assert_eq!(format_duration(2 * 86_400), "2 days, 0:00:00");
}
