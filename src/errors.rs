//! Typed error hierarchy for swimlane.
//!
//! Two enums cover the two library subsystems:
//! - `LaneError`: contract violations reported by the lane engine
//! - `MappingError`: field-mapping and search-page input failures

use chrono::NaiveDate;
use thiserror::Error;

/// Errors from the lane assignment engine.
///
/// Every variant is a caller-contract violation. The engine never repairs the
/// input (an inverted interval is not swapped), it reports and stops.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LaneError {
    #[error("Interval {id} starts on {start} but ends on {end}")]
    InvalidInterval {
        id: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error(
        "Unknown conflict policy '{name}'. Valid values: overlap-only, overlap-or-touch, overlap-touch-adjacent"
    )]
    UnknownPolicy { name: String },

    #[error("Interval id {id} appears more than once")]
    DuplicateId { id: String },
}

/// Errors from loading field mappings and raw search pages.
#[derive(Debug, Error)]
pub enum MappingError {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        path: std::path::PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Field mapping must be a JSON object of column -> path")]
    NotAnObject,

    #[error("Invalid mapping for column '{column}': {message}")]
    InvalidSpec { column: String, message: String },

    #[error("{column} field mapping not found")]
    MissingColumn { column: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn invalid_interval_message_names_id_and_dates() {
        let err = LaneError::InvalidInterval {
            id: "TASK-1".to_string(),
            start: date("2025-06-05"),
            end: date("2025-06-01"),
        };
        let msg = err.to_string();
        assert!(msg.contains("TASK-1"));
        assert!(msg.contains("2025-06-05"));
        assert!(msg.contains("2025-06-01"));
    }

    #[test]
    fn unknown_policy_lists_valid_values() {
        let err = LaneError::UnknownPolicy {
            name: "sideways".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("'sideways'"));
        assert!(msg.contains("overlap-touch-adjacent"));
    }

    #[test]
    fn lane_errors_are_comparable() {
        let a = LaneError::DuplicateId { id: "A".into() };
        let b = LaneError::DuplicateId { id: "A".into() };
        assert_eq!(a, b);
    }

    #[test]
    fn mapping_read_error_carries_path() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = MappingError::Read {
            path: std::path::PathBuf::from("/tmp/field_mappings.json"),
            source: io_err,
        };
        assert!(err.to_string().contains("/tmp/field_mappings.json"));
        match &err {
            MappingError::Read { source, .. } => {
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            _ => panic!("Expected Read variant"),
        }
    }

    #[test]
    fn mapping_invalid_spec_names_column() {
        let err = MappingError::InvalidSpec {
            column: "Sprint".to_string(),
            message: "list mapping requires 'field'".to_string(),
        };
        assert!(err.to_string().contains("'Sprint'"));
    }

    #[test]
    fn mapping_missing_column_message() {
        let err = MappingError::MissingColumn {
            column: "Sprint".to_string(),
        };
        assert_eq!(err.to_string(), "Sprint field mapping not found");
    }
}
