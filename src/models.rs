use crate::color::Color;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One row of `/api/stats`: the average hours between events of a type at a
/// location on a given day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventAggregateRecord {
    #[serde(rename = "type", default)]
    pub event_type: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub day: String,
    #[serde(default, deserialize_with = "lenient_number")]
    pub avg_time_between: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SeriesKey {
    pub event_type: String,
    pub location: String,
}

impl SeriesKey {
    pub fn of(record: &EventAggregateRecord) -> Self {
        Self {
            event_type: record.event_type.clone(),
            location: record.location.clone(),
        }
    }

    pub fn label(&self) -> String {
        format!("{} - {}", self.event_type, self.location)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub x: Option<NaiveDate>,
    pub y: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub label: String,
    pub points: Vec<SeriesPoint>,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSubmission {
    #[serde(rename = "type")]
    pub event_type: String,
    pub location: String,
    pub timestamp: String,
}

/// Parses the `day` of an aggregate row. Unparseable input yields `None`.
pub fn parse_day(day: &str) -> Option<NaiveDate> {
    let day = day.trim();
    if let Ok(date) = NaiveDate::parse_from_str(day, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(stamp) = DateTime::parse_from_rfc3339(day) {
        return Some(stamp.date_naive());
    }
    if let Ok(stamp) = NaiveDateTime::parse_from_str(day, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(stamp.date());
    }
    if let Ok(stamp) = NaiveDateTime::parse_from_str(day, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(stamp.date());
    }
    if let Ok(stamp) = NaiveDateTime::parse_from_str(day, "%Y-%m-%dT%H:%M") {
        return Some(stamp.date());
    }
    // HTTP dates such as "Mon, 01 Jan 2024 00:00:00 GMT"
    DateTime::parse_from_rfc2822(day)
        .ok()
        .map(|stamp| stamp.date_naive())
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    })
}
