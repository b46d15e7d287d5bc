//! Lane assignment for grouped timeline intervals.
//!
//! Given work items partitioned by group (usually a team), the engine assigns
//! each item a zero-based lane so that no two items in the same lane of the
//! same group conflict, using as few lanes as the conflict policy allows.
//!
//! ## Guarantees
//!
//! - **No conflicts**: same-lane items never satisfy the policy predicate.
//! - **Minimal**: the lane count per group equals the deepest overlap.
//! - **Deterministic**: processing order is `(start, end, input position)`.
//! - **Group independence**: a group's lanes never depend on other groups.
//!
//! ## Example
//!
//! ```
//! use chrono::NaiveDate;
//! use swimlane::lanes::{ConflictPolicy, Interval, LaneEngine};
//!
//! let d = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap();
//! let items = vec![
//!     Interval::new("A", "Team A", d("2025-06-01"), d("2025-06-05")),
//!     Interval::new("B", "Team A", d("2025-06-06"), d("2025-06-10")),
//! ];
//!
//! let loose = LaneEngine::new(ConflictPolicy::OverlapOnly).assign(&items)?;
//! assert_eq!(loose.lane_count("Team A"), Some(1));
//!
//! let spaced = LaneEngine::new(ConflictPolicy::OverlapTouchAdjacent).assign(&items)?;
//! assert_eq!(spaced.lane_of("B"), Some(1));
//! # Ok::<(), swimlane::errors::LaneError>(())
//! ```

mod engine;
mod interval;
mod policy;

pub use engine::{GroupLanes, LaneAssignment, LaneEngine, Placement};
pub use interval::Interval;
pub use policy::ConflictPolicy;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Days, NaiveDate};
    use proptest::prelude::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn iv(id: &str, group: &str, start: &str, end: &str) -> Interval {
        Interval::new(id, group, date(start), date(end))
    }

    /// Deepest point of overlap after widening each end by the policy margin.
    fn max_depth(intervals: &[Interval], policy: ConflictPolicy) -> usize {
        let margin = Days::new(policy.margin_days() as u64);
        intervals
            .iter()
            .map(|probe| {
                intervals
                    .iter()
                    .filter(|other| {
                        other.start() <= probe.start()
                            && probe.start() <= other.end() + margin
                    })
                    .count()
            })
            .max()
            .unwrap_or(0)
    }

    // =========================================
    // Worked scenarios
    // =========================================

    #[test]
    fn overlapping_pair_needs_two_lanes() {
        let items = vec![
            iv("A", "Team A", "2025-06-01", "2025-06-05"),
            iv("B", "Team A", "2025-06-03", "2025-06-07"),
        ];
        let result = LaneEngine::new(ConflictPolicy::OverlapOnly)
            .assign(&items)
            .unwrap();
        assert_eq!(result.lane_count("Team A"), Some(2));
        assert_eq!(result.lane_of("A"), Some(0));
        assert_eq!(result.lane_of("B"), Some(1));
    }

    #[test]
    fn back_to_back_pair_shares_a_lane() {
        let items = vec![
            iv("A", "Team A", "2025-06-01", "2025-06-05"),
            iv("B", "Team A", "2025-06-06", "2025-06-10"),
        ];
        let result = LaneEngine::new(ConflictPolicy::OverlapOnly)
            .assign(&items)
            .unwrap();
        assert_eq!(result.lane_count("Team A"), Some(1));
        assert_eq!(result.lane_of("A"), Some(0));
        assert_eq!(result.lane_of("B"), Some(0));
    }

    #[test]
    fn back_to_back_pair_splits_under_adjacency() {
        let items = vec![
            iv("A", "Team A", "2025-06-01", "2025-06-05"),
            iv("B", "Team A", "2025-06-06", "2025-06-10"),
        ];
        let result = LaneEngine::new(ConflictPolicy::OverlapTouchAdjacent)
            .assign(&items)
            .unwrap();
        assert_eq!(result.lane_count("Team A"), Some(2));
    }

    #[test]
    fn nested_intervals_each_get_a_lane() {
        let items = vec![
            iv("A", "Team A", "2025-06-01", "2025-06-30"),
            iv("B", "Team A", "2025-06-05", "2025-06-20"),
            iv("C", "Team A", "2025-06-10", "2025-06-12"),
        ];
        let result = LaneEngine::new(ConflictPolicy::OverlapOnly)
            .assign(&items)
            .unwrap();
        assert_eq!(result.lane_count("Team A"), Some(3));
        assert_eq!(result.lane_of("C"), Some(2));
    }

    #[test]
    fn groups_do_not_influence_each_other() {
        let team_a = vec![
            iv("A1", "Team A", "2025-06-01", "2025-06-05"),
            iv("A2", "Team A", "2025-06-03", "2025-06-07"),
        ];
        let mut both = team_a.clone();
        both.push(iv("B1", "Team B", "2025-06-01", "2025-06-05"));
        both.push(iv("B2", "Team B", "2025-06-03", "2025-06-07"));

        let engine = LaneEngine::default();
        let alone = engine.assign(&team_a).unwrap();
        let together = engine.assign(&both).unwrap();
        for id in ["A1", "A2"] {
            assert_eq!(alone.lane_of(id), together.lane_of(id));
        }
        assert_eq!(alone.lane_count("Team A"), together.lane_count("Team A"));
    }

    #[test]
    fn touching_tasks_sample_sprint() {
        // Two teams of tasks that touch or abut each other.
        let items = vec![
            iv("TASK-1", "Team A", "2025-06-01", "2025-06-05"),
            iv("TASK-2", "Team A", "2025-06-05", "2025-06-10"),
            iv("TASK-3", "Team A", "2025-06-07", "2025-06-12"),
            iv("TASK-4", "Team A", "2025-06-12", "2025-06-15"),
            iv("TASK-5", "Team B", "2025-06-01", "2025-06-10"),
            iv("TASK-6", "Team B", "2025-06-10", "2025-06-15"),
            iv("TASK-7", "Team B", "2025-06-10", "2025-06-20"),
        ];
        let result = LaneEngine::new(ConflictPolicy::OverlapTouchAdjacent)
            .assign(&items)
            .unwrap();

        let lanes: Vec<_> = items
            .iter()
            .map(|i| result.lane_of(i.id()).unwrap())
            .collect();
        assert_eq!(lanes, vec![0, 1, 0, 1, 0, 1, 2]);
        assert_eq!(result.lane_count("Team A"), Some(2));
        assert_eq!(result.lane_count("Team B"), Some(3));
    }

    #[test]
    fn identical_ranges_keep_input_order() {
        let first = iv("X", "T", "2025-06-01", "2025-06-05");
        let second = iv("Y", "T", "2025-06-01", "2025-06-05");

        let forward = LaneEngine::default()
            .assign(&[first.clone(), second.clone()])
            .unwrap();
        assert_eq!(forward.lane_of("X"), Some(0));
        assert_eq!(forward.lane_of("Y"), Some(1));

        let reversed = LaneEngine::default().assign(&[second, first]).unwrap();
        assert_eq!(reversed.lane_of("Y"), Some(0));
        assert_eq!(reversed.lane_of("X"), Some(1));
    }

    // =========================================
    // Property tests
    // =========================================

    fn arb_intervals() -> impl Strategy<Value = Vec<Interval>> {
        prop::collection::vec((0u64..60, 0u64..10, 0usize..3), 0..40).prop_map(|specs| {
            let base = date("2025-06-01");
            specs
                .into_iter()
                .enumerate()
                .map(|(idx, (offset, len, group))| {
                    let start = base + Days::new(offset);
                    Interval::new(
                        format!("I-{idx}"),
                        format!("Team {group}"),
                        start,
                        start + Days::new(len),
                    )
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_same_lane_never_conflicts(items in arb_intervals()) {
            for policy in ConflictPolicy::ALL {
                let result = LaneEngine::new(policy).assign(&items).unwrap();
                for a in &items {
                    for b in &items {
                        if a.id() != b.id()
                            && a.group() == b.group()
                            && result.lane_of(a.id()) == result.lane_of(b.id())
                        {
                            prop_assert!(!policy.conflicts(a, b), "{} / {} under {}", a.id(), b.id(), policy);
                        }
                    }
                }
            }
        }

        #[test]
        fn prop_lane_count_is_minimal(items in arb_intervals()) {
            for policy in ConflictPolicy::ALL {
                let result = LaneEngine::new(policy).assign(&items).unwrap();
                for (group, count) in result.groups() {
                    let members: Vec<Interval> =
                        items.iter().filter(|i| i.group() == group).cloned().collect();
                    prop_assert_eq!(count, max_depth(&members, policy));
                }
            }
        }

        #[test]
        fn prop_assignment_is_deterministic(items in arb_intervals()) {
            let engine = LaneEngine::new(ConflictPolicy::OverlapTouchAdjacent);
            prop_assert_eq!(engine.assign(&items).unwrap(), engine.assign(&items).unwrap());
        }

        #[test]
        fn prop_stricter_policy_never_uses_fewer_lanes(items in arb_intervals()) {
            let only = LaneEngine::new(ConflictPolicy::OverlapOnly).assign(&items).unwrap();
            let touch = LaneEngine::new(ConflictPolicy::OverlapOrTouch).assign(&items).unwrap();
            let adjacent = LaneEngine::new(ConflictPolicy::OverlapTouchAdjacent).assign(&items).unwrap();
            for (group, count) in only.groups() {
                let touch_count = touch.lane_count(group).unwrap();
                let adjacent_count = adjacent.lane_count(group).unwrap();
                prop_assert!(count <= touch_count);
                prop_assert!(touch_count <= adjacent_count);
            }
        }

        #[test]
        fn prop_running_end_matches_full_scan(items in arb_intervals()) {
            let fast = LaneEngine::new(ConflictPolicy::OverlapOnly).assign(&items).unwrap();
            let full = LaneEngine::new(ConflictPolicy::OverlapOnly)
                .with_full_scan(true)
                .assign(&items)
                .unwrap();
            prop_assert_eq!(fast, full);
        }
    }
}
