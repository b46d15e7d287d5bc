//! From flattened rows to a laid-out swimlane chart.

pub mod layout;
pub mod normalize;

pub use layout::{Bar, ChartLayout, DateAxis, GroupBand, InvalidGroupAction, build_layout};
pub use normalize::{
    EndConvention, ItemColumns, NormalizeOptions, Normalized, SkipReason, SkippedRow,
    TimelineItem, normalize_rows, parse_date,
};
