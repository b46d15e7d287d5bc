//! Vertical arrangement of a swimlane chart.
//!
//! Each group becomes a band of `lane_count` rows stacked under the bands of
//! the groups before it. A bar's row is its band offset plus its lane.

use std::collections::{BTreeMap, HashSet};

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::normalize::TimelineItem;
use crate::errors::LaneError;
use crate::lanes::{Interval, LaneEngine};

/// What to do with a group the engine rejects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvalidGroupAction {
    /// Drop the group and draw the rest.
    #[default]
    Skip,
    /// Fail the whole chart.
    Abort,
}

impl std::fmt::Display for InvalidGroupAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidGroupAction::Skip => write!(f, "skip"),
            InvalidGroupAction::Abort => write!(f, "abort"),
        }
    }
}

impl std::str::FromStr for InvalidGroupAction {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "skip" => Ok(InvalidGroupAction::Skip),
            "abort" => Ok(InvalidGroupAction::Abort),
            _ => anyhow::bail!("Invalid group action '{}'. Valid values: skip, abort", s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupBand {
    pub group: String,
    pub offset: usize,
    pub lane_count: usize,
    /// Row coordinate for the band's axis label.
    pub center: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bar {
    pub id: String,
    pub label: String,
    pub group: String,
    pub lane: usize,
    pub row: usize,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub span_days: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateAxis {
    pub start: NaiveDate,
    pub end: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub today: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedGroup {
    pub group: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartLayout {
    pub groups: Vec<GroupBand>,
    pub bars: Vec<Bar>,
    pub axis: Option<DateAxis>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped_groups: Vec<SkippedGroup>,
}

impl ChartLayout {
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Rows across all bands.
    pub fn total_rows(&self) -> usize {
        self.groups.iter().map(|band| band.lane_count).sum()
    }
}

/// Lay out `items` with `engine`, one band per group in key order.
///
/// With [`InvalidGroupAction::Abort`] an id repeated anywhere in `items`
/// fails the layout, even across groups.
pub fn build_layout(
    items: &[TimelineItem],
    engine: &LaneEngine,
    on_invalid: InvalidGroupAction,
    today: Option<NaiveDate>,
) -> Result<ChartLayout, LaneError> {
    let intervals: Vec<Interval> = items.iter().map(|item| item.interval.clone()).collect();
    if on_invalid == InvalidGroupAction::Abort {
        let mut seen = HashSet::new();
        if let Some(repeat) = intervals.iter().find(|iv| !seen.insert(iv.id())) {
            return Err(LaneError::DuplicateId {
                id: repeat.id().to_string(),
            });
        }
    }
    let mut members: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (i, interval) in intervals.iter().enumerate() {
        members.entry(interval.group()).or_default().push(i);
    }

    let mut layout = ChartLayout::default();
    let mut offset = 0;
    for (group, outcome) in engine.assign_by_group(&intervals) {
        let lanes = match outcome {
            Ok(lanes) => lanes,
            Err(err) if on_invalid == InvalidGroupAction::Abort => return Err(err),
            Err(err) => {
                warn!(group = %group, error = %err, "skipping group");
                layout.skipped_groups.push(SkippedGroup {
                    group,
                    error: err.to_string(),
                });
                continue;
            }
        };

        let positions = members.get(group.as_str()).map(Vec::as_slice).unwrap_or(&[]);
        let mut bars: Vec<(usize, Bar)> = positions
            .iter()
            .zip(lanes.lanes())
            .map(|(&i, &lane)| {
                let interval = &intervals[i];
                let bar = Bar {
                    id: interval.id().to_string(),
                    label: items[i].label.clone(),
                    group: group.clone(),
                    lane,
                    row: offset + lane,
                    start: interval.start(),
                    end: interval.end(),
                    span_days: interval.span_days(),
                };
                (i, bar)
            })
            .collect();
        bars.sort_by_key(|(i, bar)| (bar.start, bar.end, *i));

        let lane_count = lanes.lane_count();
        layout.groups.push(GroupBand {
            group,
            offset,
            lane_count,
            center: offset as f64 + lane_count.saturating_sub(1) as f64 / 2.0,
        });
        layout.bars.extend(bars.into_iter().map(|(_, bar)| bar));
        offset += lane_count;
    }

    layout.axis = date_axis(&layout.bars, today);
    Ok(layout)
}

/// One day of padding either side of the drawn bars.
fn date_axis(bars: &[Bar], today: Option<NaiveDate>) -> Option<DateAxis> {
    let min = bars.iter().map(|bar| bar.start).min()?;
    let max = bars.iter().map(|bar| bar.end).max()?;
    let start = min.checked_sub_days(Days::new(1)).unwrap_or(min);
    let end = max.checked_add_days(Days::new(1)).unwrap_or(max);
    Some(DateAxis {
        start,
        end,
        today: today.filter(|day| (start..=end).contains(day)),
    })
}
