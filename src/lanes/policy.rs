//! Conflict policies: when two intervals may not share a lane.

use serde::{Deserialize, Serialize};

use super::interval::Interval;
use crate::errors::LaneError;

/// Predicate deciding whether two intervals in the same group collide.
///
/// | Policy                   | Conflict when                                    |
/// |--------------------------|--------------------------------------------------|
/// | `overlap-only`           | closed ranges share at least one day             |
/// | `overlap-or-touch`       | as above; a shared boundary day already overlaps |
/// | `overlap-touch-adjacent` | as above, or one starts the day after the other ends |
///
/// Policies are ordered from most to least permissive, so a stricter policy
/// never packs into fewer lanes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictPolicy {
    #[default]
    OverlapOnly,
    OverlapOrTouch,
    OverlapTouchAdjacent,
}

impl ConflictPolicy {
    pub const ALL: [ConflictPolicy; 3] = [
        ConflictPolicy::OverlapOnly,
        ConflictPolicy::OverlapOrTouch,
        ConflictPolicy::OverlapTouchAdjacent,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ConflictPolicy::OverlapOnly => "overlap-only",
            ConflictPolicy::OverlapOrTouch => "overlap-or-touch",
            ConflictPolicy::OverlapTouchAdjacent => "overlap-touch-adjacent",
        }
    }

    /// Whether `a` and `b` may not share a lane.
    pub fn conflicts(self, a: &Interval, b: &Interval) -> bool {
        let overlap = a.start() <= b.end() && a.end() >= b.start();
        match self {
            ConflictPolicy::OverlapOnly => overlap,
            ConflictPolicy::OverlapOrTouch => {
                let touch = a.start() == b.end() || a.end() == b.start();
                overlap || touch
            }
            ConflictPolicy::OverlapTouchAdjacent => {
                let touch = a.start() == b.end() || a.end() == b.start();
                let adjacent =
                    b.end().succ_opt() == Some(a.start()) || a.end().succ_opt() == Some(b.start());
                overlap || touch || adjacent
            }
        }
    }

    /// Days of clearance the policy demands after an interval ends before
    /// another may start in the same lane.
    pub fn margin_days(self) -> i64 {
        match self {
            ConflictPolicy::OverlapOnly | ConflictPolicy::OverlapOrTouch => 0,
            ConflictPolicy::OverlapTouchAdjacent => 1,
        }
    }

    /// Whether a lane may be summarised by its latest end date alone.
    ///
    /// Only sound for plain overlap with start-ordered placement.
    pub fn supports_running_end(self) -> bool {
        matches!(self, ConflictPolicy::OverlapOnly)
    }
}

impl std::fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ConflictPolicy {
    type Err = LaneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "overlap-only" => Ok(ConflictPolicy::OverlapOnly),
            "overlap-or-touch" => Ok(ConflictPolicy::OverlapOrTouch),
            "overlap-touch-adjacent" => Ok(ConflictPolicy::OverlapTouchAdjacent),
            _ => Err(LaneError::UnknownPolicy {
                name: s.to_string(),
            }),
        }
    }
}
