//! The schedulable unit the lane engine packs.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One work item on the timeline: an inclusive `[start, end]` date range
/// inside a group.
///
/// Construction does not validate `start <= end`; the engine checks every
/// interval it receives and reports `LaneError::InvalidInterval` instead.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Interval {
    id: String,
    group: String,
    start: NaiveDate,
    end: NaiveDate,
}

impl Interval {
    pub fn new(
        id: impl Into<String>,
        group: impl Into<String>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Self {
        Self {
            id: id.into(),
            group: group.into(),
            start,
            end,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Whether `start <= end`.
    pub fn is_valid(&self) -> bool {
        self.start <= self.end
    }

    /// Number of calendar days covered, counting both ends.
    pub fn span_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn span_counts_both_ends() {
        let single = Interval::new("A", "Team A", date("2025-06-01"), date("2025-06-01"));
        assert_eq!(single.span_days(), 1);

        let week = Interval::new("B", "Team A", date("2025-06-01"), date("2025-06-07"));
        assert_eq!(week.span_days(), 7);
    }

    #[test]
    fn inverted_interval_is_not_valid() {
        let inverted = Interval::new("A", "Team A", date("2025-06-05"), date("2025-06-01"));
        assert!(!inverted.is_valid());
    }

    #[test]
    fn deserializes_from_plain_json() {
        let json = r#"{"id": "TASK-1", "group": "Team A", "start": "2025-06-01", "end": "2025-06-05"}"#;
        let interval: Interval = serde_json::from_str(json).unwrap();
        assert_eq!(interval.id(), "TASK-1");
        assert_eq!(interval.group(), "Team A");
        assert_eq!(interval.end(), date("2025-06-05"));
    }
}
