//! Turning flattened rows into timeline items the lane engine accepts.

use std::collections::HashSet;

use chrono::{DateTime, Days, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::lanes::Interval;
use crate::records::Row;

pub const DEFAULT_UNASSIGNED_GROUP: &str = "Team Unassigned";

/// How the end date column should be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndConvention {
    /// End is the last working day.
    #[default]
    Inclusive,
    /// End is the first free day after the work.
    Exclusive,
}

impl std::fmt::Display for EndConvention {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EndConvention::Inclusive => write!(f, "inclusive"),
            EndConvention::Exclusive => write!(f, "exclusive"),
        }
    }
}

impl std::str::FromStr for EndConvention {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "inclusive" => Ok(EndConvention::Inclusive),
            "exclusive" => Ok(EndConvention::Exclusive),
            _ => anyhow::bail!(
                "Invalid end convention '{}'. Valid values: inclusive, exclusive",
                s
            ),
        }
    }
}

/// Row columns read for each timeline item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemColumns {
    #[serde(default = "default_id_column")]
    pub id: String,
    #[serde(default = "default_label_column")]
    pub label: String,
    #[serde(default = "default_group_column")]
    pub group: String,
    #[serde(default = "default_start_column")]
    pub start: String,
    #[serde(default = "default_end_column")]
    pub end: String,
}

fn default_id_column() -> String {
    "Key".to_string()
}

fn default_label_column() -> String {
    "Key".to_string()
}

fn default_group_column() -> String {
    "Team".to_string()
}

fn default_start_column() -> String {
    "StartDate".to_string()
}

fn default_end_column() -> String {
    "TargetEnd".to_string()
}

impl Default for ItemColumns {
    fn default() -> Self {
        Self {
            id: default_id_column(),
            label: default_label_column(),
            group: default_group_column(),
            start: default_start_column(),
            end: default_end_column(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizeOptions {
    pub columns: ItemColumns,
    pub end_convention: EndConvention,
    pub unassigned_group: String,
    /// Pass inverted and repeated rows through for the lane engine to reject.
    pub keep_invalid: bool,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            columns: ItemColumns::default(),
            end_convention: EndConvention::default(),
            unassigned_group: DEFAULT_UNASSIGNED_GROUP.to_string(),
            keep_invalid: false,
        }
    }
}

impl NormalizeOptions {
    pub fn with_end_convention(mut self, end_convention: EndConvention) -> Self {
        self.end_convention = end_convention;
        self
    }

    pub fn with_columns(mut self, columns: ItemColumns) -> Self {
        self.columns = columns;
        self
    }

    pub fn with_unassigned_group(mut self, group: impl Into<String>) -> Self {
        self.unassigned_group = group.into();
        self
    }

    pub fn with_invalid_rows_kept(mut self, keep: bool) -> Self {
        self.keep_invalid = keep;
        self
    }
}

/// An interval plus the text shown on its bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineItem {
    pub interval: Interval,
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    MissingId,
    DuplicateId,
    MissingStart,
    MissingEnd,
    EndBeforeStart,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::MissingId => write!(f, "missing id"),
            SkipReason::DuplicateId => write!(f, "duplicate id"),
            SkipReason::MissingStart => write!(f, "missing or unparseable start date"),
            SkipReason::MissingEnd => write!(f, "missing or unparseable end date"),
            SkipReason::EndBeforeStart => write!(f, "end before start"),
        }
    }
}

/// A row left off the timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRow {
    /// Position in the input rows.
    pub index: usize,
    pub id: Option<String>,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Normalized {
    pub items: Vec<TimelineItem>,
    pub skipped: Vec<SkippedRow>,
}

/// Parse a tracker date value, keeping only the calendar date.
///
/// Accepts `YYYY-MM-DD`, RFC 3339, and `2025-06-01T10:00:00.000+0000`.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(stamp) = DateTime::parse_from_rfc3339(text) {
        return Some(stamp.date_naive());
    }
    DateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f%z")
        .ok()
        .map(|stamp| stamp.date_naive())
}

/// Non-empty text of a scalar cell.
fn cell_text(value: Option<&Value>) -> Option<String> {
    let text = match value? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn cell_date(value: Option<&Value>) -> Option<NaiveDate> {
    value.and_then(Value::as_str).and_then(parse_date)
}

fn normalize_row(
    row: &Row,
    options: &NormalizeOptions,
    seen: &mut HashSet<String>,
) -> Result<TimelineItem, (Option<String>, SkipReason)> {
    let columns = &options.columns;
    let id = cell_text(row.get(&columns.id)).ok_or((None, SkipReason::MissingId))?;
    if !options.keep_invalid && seen.contains(&id) {
        return Err((Some(id), SkipReason::DuplicateId));
    }
    let Some(start) = cell_date(row.get(&columns.start)) else {
        return Err((Some(id), SkipReason::MissingStart));
    };
    let Some(mut end) = cell_date(row.get(&columns.end)) else {
        return Err((Some(id), SkipReason::MissingEnd));
    };
    if options.end_convention == EndConvention::Exclusive && end != start {
        end = end.checked_sub_days(Days::new(1)).unwrap_or(end);
    }
    if end < start && !options.keep_invalid {
        return Err((Some(id), SkipReason::EndBeforeStart));
    }

    let group = cell_text(row.get(&columns.group))
        .unwrap_or_else(|| options.unassigned_group.clone());
    let label = cell_text(row.get(&columns.label)).unwrap_or_else(|| id.clone());
    seen.insert(id.clone());
    Ok(TimelineItem {
        interval: Interval::new(id, group, start, end),
        label,
    })
}

/// Convert rows to timeline items, reporting the rows that cannot be drawn.
pub fn normalize_rows(rows: &[Row], options: &NormalizeOptions) -> Normalized {
    let mut normalized = Normalized::default();
    let mut seen = HashSet::new();
    for (index, row) in rows.iter().enumerate() {
        match normalize_row(row, options, &mut seen) {
            Ok(item) => normalized.items.push(item),
            Err((id, reason)) => {
                warn!(row = index, id = ?id, %reason, "skipping row");
                normalized.skipped.push(SkippedRow { index, id, reason });
            }
        }
    }
    normalized
}
