use crate::color::Color;
use crate::models::{EventAggregateRecord, Series, SeriesKey, SeriesPoint, parse_day};
use std::collections::HashMap;

/// Groups aggregate rows into one series per `(type, location)`, ordered by
/// first appearance. Every series gets a new random color.
pub fn reshape(records: &[EventAggregateRecord]) -> Vec<Series> {
    reshape_with(records, Color::random)
}

pub fn reshape_with<F>(records: &[EventAggregateRecord], mut next_color: F) -> Vec<Series>
where
    F: FnMut() -> Color,
{
    let mut slots: HashMap<SeriesKey, usize> = HashMap::new();
    let mut groups: Vec<(SeriesKey, Vec<SeriesPoint>)> = Vec::new();

    for record in records {
        let point = SeriesPoint {
            x: parse_day(&record.day),
            y: record.avg_time_between,
        };
        let key = SeriesKey::of(record);
        match slots.get(&key) {
            Some(&slot) => groups[slot].1.push(point),
            None => {
                slots.insert(key.clone(), groups.len());
                groups.push((key, vec![point]));
            }
        }
    }

    groups
        .into_iter()
        .map(|(key, points)| Series {
            label: key.label(),
            points,
            color: next_color(),
        })
        .collect()
}
