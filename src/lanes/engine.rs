//! First-fit lane packing over start-ordered intervals.
//!
//! Each group is packed independently:
//!
//! 1. order the group by `(start, end, input position)`
//! 2. put each interval in the lowest lane holding nothing it conflicts with
//! 3. open a new lane when every existing lane conflicts
//!
//! For interval conflict graphs this greedy order is optimal: the lane count
//! equals the deepest point of (policy-widened) overlap.

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use super::interval::Interval;
use super::policy::ConflictPolicy;
use crate::errors::LaneError;

/// Lanes computed for a single group, parallel to the input slice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupLanes {
    lanes: Vec<usize>,
    lane_count: usize,
}

impl GroupLanes {
    /// Lane of the interval at `position` in the slice that was packed.
    pub fn lane_at(&self, position: usize) -> Option<usize> {
        self.lanes.get(position).copied()
    }

    /// Lanes in input order.
    pub fn lanes(&self) -> &[usize] {
        &self.lanes
    }

    pub fn lane_count(&self) -> usize {
        self.lane_count
    }
}

/// Where one interval landed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Placement {
    pub id: String,
    pub group: String,
    pub lane: usize,
}

/// Result of packing every group of a call.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct LaneAssignment {
    placements: Vec<Placement>,
    by_id: BTreeMap<String, usize>,
    lane_counts: BTreeMap<String, usize>,
}

impl LaneAssignment {
    pub fn lane_of(&self, id: &str) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    pub fn lane_count(&self, group: &str) -> Option<usize> {
        self.lane_counts.get(group).copied()
    }

    /// `(group, lane_count)` ordered by group key.
    pub fn groups(&self) -> impl Iterator<Item = (&str, usize)> {
        self.lane_counts.iter().map(|(g, n)| (g.as_str(), *n))
    }

    /// One placement per input interval, in input order.
    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    pub fn total_lanes(&self) -> usize {
        self.lane_counts.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }
}

/// Lane occupancy while a group is being packed.
enum LaneBook<'a> {
    /// Latest end per lane. Sound only for plain overlap.
    RunningEnd(Vec<NaiveDate>),
    /// Every occupant per lane.
    Occupants(Vec<Vec<&'a Interval>>),
}

impl<'a> LaneBook<'a> {
    fn place(&mut self, policy: ConflictPolicy, interval: &'a Interval) -> usize {
        match self {
            LaneBook::RunningEnd(ends) => {
                // Start order means only the latest end in a lane can reach us.
                match ends.iter().position(|end| interval.start() > *end) {
                    Some(lane) => {
                        ends[lane] = interval.end();
                        lane
                    }
                    None => {
                        ends.push(interval.end());
                        ends.len() - 1
                    }
                }
            }
            LaneBook::Occupants(lanes) => {
                let free = lanes.iter().position(|occupants| {
                    !occupants
                        .iter()
                        .any(|other| policy.conflicts(interval, other))
                });
                match free {
                    Some(lane) => {
                        lanes[lane].push(interval);
                        lane
                    }
                    None => {
                        lanes.push(vec![interval]);
                        lanes.len() - 1
                    }
                }
            }
        }
    }

    fn len(&self) -> usize {
        match self {
            LaneBook::RunningEnd(ends) => ends.len(),
            LaneBook::Occupants(lanes) => lanes.len(),
        }
    }
}

/// Stateless lane packer configured with a conflict policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LaneEngine {
    policy: ConflictPolicy,
    full_scan: bool,
}

impl LaneEngine {
    pub fn new(policy: ConflictPolicy) -> Self {
        Self {
            policy,
            full_scan: false,
        }
    }

    /// Build an engine from a policy identifier, failing before any packing.
    pub fn from_policy_name(name: &str) -> Result<Self, LaneError> {
        Ok(Self::new(name.parse()?))
    }

    /// Check every occupant of a lane even where the running-end shortcut
    /// would be sound.
    pub fn with_full_scan(mut self, full_scan: bool) -> Self {
        self.full_scan = full_scan;
        self
    }

    pub fn policy(&self) -> ConflictPolicy {
        self.policy
    }

    fn new_book<'a>(&self) -> LaneBook<'a> {
        if self.policy.supports_running_end() && !self.full_scan {
            LaneBook::RunningEnd(Vec::new())
        } else {
            LaneBook::Occupants(Vec::new())
        }
    }

    /// Pack `intervals` as one group. The `group` field is not consulted.
    pub fn assign_group(&self, intervals: &[Interval]) -> Result<GroupLanes, LaneError> {
        let refs: Vec<&Interval> = intervals.iter().collect();
        self.pack(&refs)
    }

    fn pack(&self, intervals: &[&Interval]) -> Result<GroupLanes, LaneError> {
        validate(intervals)?;

        let mut order: Vec<usize> = (0..intervals.len()).collect();
        // Stable sort keeps input order for identical (start, end).
        order.sort_by_key(|&i| (intervals[i].start(), intervals[i].end()));

        let mut book = self.new_book();
        let mut lanes = vec![0; intervals.len()];
        for i in order {
            lanes[i] = book.place(self.policy, intervals[i]);
        }

        Ok(GroupLanes {
            lanes,
            lane_count: book.len(),
        })
    }

    /// Pack every group, keeping each group's outcome separate so the caller
    /// can drop a failing group and keep the rest.
    pub fn assign_by_group(
        &self,
        intervals: &[Interval],
    ) -> BTreeMap<String, Result<GroupLanes, LaneError>> {
        partition(intervals)
            .into_iter()
            .map(|(group, members)| {
                let refs: Vec<&Interval> = members.iter().map(|&i| &intervals[i]).collect();
                let outcome = self.pack(&refs);
                if let Ok(lanes) = &outcome {
                    debug!(
                        group = %group,
                        intervals = refs.len(),
                        lanes = lanes.lane_count(),
                        policy = %self.policy,
                        "packed group"
                    );
                }
                (group.to_string(), outcome)
            })
            .collect()
    }

    /// Pack every group. Any invalid group fails the whole call.
    pub fn assign(&self, intervals: &[Interval]) -> Result<LaneAssignment, LaneError> {
        let mut seen = HashSet::new();
        for interval in intervals {
            if !seen.insert(interval.id()) {
                return Err(LaneError::DuplicateId {
                    id: interval.id().to_string(),
                });
            }
        }

        let mut placements: Vec<Option<Placement>> = vec![None; intervals.len()];
        let mut lane_counts = BTreeMap::new();

        for (group, members) in partition(intervals) {
            let refs: Vec<&Interval> = members.iter().map(|&i| &intervals[i]).collect();
            let packed = self.pack(&refs)?;
            for (&input_pos, &lane) in members.iter().zip(packed.lanes()) {
                placements[input_pos] = Some(Placement {
                    id: intervals[input_pos].id().to_string(),
                    group: group.to_string(),
                    lane,
                });
            }
            lane_counts.insert(group.to_string(), packed.lane_count());
        }

        let placements: Vec<Placement> = placements.into_iter().flatten().collect();
        let by_id = placements
            .iter()
            .map(|p| (p.id.clone(), p.lane))
            .collect();

        Ok(LaneAssignment {
            placements,
            by_id,
            lane_counts,
        })
    }
}

/// Input positions per group, each list in input order.
fn partition(intervals: &[Interval]) -> BTreeMap<&str, Vec<usize>> {
    let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (i, interval) in intervals.iter().enumerate() {
        groups.entry(interval.group()).or_default().push(i);
    }
    groups
}

fn validate(intervals: &[&Interval]) -> Result<(), LaneError> {
    let mut seen = HashSet::new();
    for interval in intervals {
        if !interval.is_valid() {
            return Err(LaneError::InvalidInterval {
                id: interval.id().to_string(),
                start: interval.start(),
                end: interval.end(),
            });
        }
        if !seen.insert(interval.id()) {
            return Err(LaneError::DuplicateId {
                id: interval.id().to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn iv(id: &str, group: &str, start: &str, end: &str) -> Interval {
        Interval::new(id, group, date(start), date(end))
    }

    #[test]
    fn empty_input_has_no_lanes() {
        let engine = LaneEngine::default();
        let packed = engine.assign_group(&[]).unwrap();
        assert_eq!(packed.lane_count(), 0);
        assert!(engine.assign(&[]).unwrap().is_empty());
    }

    #[test]
    fn sorts_before_packing() {
        // Input out of start order: C would land in lane 0 if placed first.
        let intervals = vec![
            iv("C", "T", "2025-06-06", "2025-06-08"),
            iv("A", "T", "2025-06-01", "2025-06-05"),
            iv("B", "T", "2025-06-02", "2025-06-03"),
        ];
        let packed = LaneEngine::default().assign_group(&intervals).unwrap();
        assert_eq!(packed.lanes(), &[0, 0, 1]);
        assert_eq!(packed.lane_count(), 2);
    }

    #[test]
    fn reuses_lowest_free_lane() {
        let intervals = vec![
            iv("A", "T", "2025-06-01", "2025-06-10"),
            iv("B", "T", "2025-06-02", "2025-06-03"),
            iv("C", "T", "2025-06-04", "2025-06-05"),
            iv("D", "T", "2025-06-11", "2025-06-12"),
        ];
        let packed = LaneEngine::default().assign_group(&intervals).unwrap();
        assert_eq!(packed.lanes(), &[0, 1, 1, 0]);
    }

    #[test]
    fn full_scan_matches_running_end_for_plain_overlap() {
        let intervals = vec![
            iv("A", "T", "2025-06-01", "2025-06-10"),
            iv("B", "T", "2025-06-02", "2025-06-03"),
            iv("C", "T", "2025-06-03", "2025-06-05"),
            iv("D", "T", "2025-06-06", "2025-06-12"),
            iv("E", "T", "2025-06-11", "2025-06-11"),
        ];
        let fast = LaneEngine::new(ConflictPolicy::OverlapOnly)
            .assign_group(&intervals)
            .unwrap();
        let full = LaneEngine::new(ConflictPolicy::OverlapOnly)
            .with_full_scan(true)
            .assign_group(&intervals)
            .unwrap();
        assert_eq!(fast, full);
    }

    #[test]
    fn adjacency_skips_lanes_with_back_to_back_occupant() {
        // D starts the day after B ends (lane 0) and overlaps C (lane 1).
        let intervals = vec![
            iv("A", "T", "2025-06-01", "2025-06-01"),
            iv("B", "T", "2025-06-03", "2025-06-03"),
            iv("C", "T", "2025-06-01", "2025-06-10"),
            iv("D", "T", "2025-06-04", "2025-06-05"),
        ];
        let packed = LaneEngine::new(ConflictPolicy::OverlapTouchAdjacent)
            .assign_group(&intervals)
            .unwrap();
        assert_eq!(packed.lanes(), &[0, 0, 1, 2]);
    }

    #[test]
    fn rejects_inverted_interval_without_partial_result() {
        let intervals = vec![
            iv("A", "T", "2025-06-01", "2025-06-05"),
            iv("B", "T", "2025-06-09", "2025-06-03"),
        ];
        let err = LaneEngine::default().assign_group(&intervals).unwrap_err();
        assert_eq!(
            err,
            LaneError::InvalidInterval {
                id: "B".to_string(),
                start: date("2025-06-09"),
                end: date("2025-06-03"),
            }
        );
    }

    #[test]
    fn rejects_duplicate_ids_across_groups() {
        let intervals = vec![
            iv("A", "Team A", "2025-06-01", "2025-06-05"),
            iv("A", "Team B", "2025-06-01", "2025-06-05"),
        ];
        assert_eq!(
            LaneEngine::default().assign(&intervals).unwrap_err(),
            LaneError::DuplicateId { id: "A".into() }
        );
    }

    #[test]
    fn assign_keys_results_by_id_and_group() {
        let intervals = vec![
            iv("B1", "Team B", "2025-06-01", "2025-06-05"),
            iv("A1", "Team A", "2025-06-01", "2025-06-05"),
            iv("A2", "Team A", "2025-06-03", "2025-06-07"),
        ];
        let result = LaneEngine::default().assign(&intervals).unwrap();

        assert_eq!(result.lane_of("A1"), Some(0));
        assert_eq!(result.lane_of("A2"), Some(1));
        assert_eq!(result.lane_of("B1"), Some(0));
        assert_eq!(result.lane_of("missing"), None);

        assert_eq!(result.lane_count("Team A"), Some(2));
        assert_eq!(result.lane_count("Team B"), Some(1));
        assert_eq!(result.total_lanes(), 3);

        let groups: Vec<_> = result.groups().collect();
        assert_eq!(groups, vec![("Team A", 2), ("Team B", 1)]);

        let ids: Vec<_> = result.placements().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["B1", "A1", "A2"]);
    }

    #[test]
    fn assign_fails_whole_call_on_one_bad_group() {
        let intervals = vec![
            iv("A1", "Team A", "2025-06-01", "2025-06-05"),
            iv("B1", "Team B", "2025-06-09", "2025-06-01"),
        ];
        assert!(matches!(
            LaneEngine::default().assign(&intervals),
            Err(LaneError::InvalidInterval { .. })
        ));
    }

    #[test]
    fn assign_by_group_isolates_bad_group() {
        let intervals = vec![
            iv("A1", "Team A", "2025-06-01", "2025-06-05"),
            iv("A2", "Team A", "2025-06-03", "2025-06-07"),
            iv("B1", "Team B", "2025-06-09", "2025-06-01"),
        ];
        let outcomes = LaneEngine::default().assign_by_group(&intervals);
        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes["Team A"].as_ref().unwrap().lanes(), &[0, 1]);
        assert!(outcomes["Team B"].is_err());
    }

    #[test]
    fn unknown_policy_name_fails_before_packing() {
        assert_eq!(
            LaneEngine::from_policy_name("sideways").unwrap_err(),
            LaneError::UnknownPolicy {
                name: "sideways".into()
            }
        );
        let engine = LaneEngine::from_policy_name("overlap-or-touch").unwrap();
        assert_eq!(engine.policy(), ConflictPolicy::OverlapOrTouch);
    }
}
