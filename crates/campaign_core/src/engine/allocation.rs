//! Weekly plan allocation.
//!
//! # Responsibility
//! - Spread each member's prospects across campaign weeks by priority.
//!
//! # Invariants
//! - Every prospect receives a week in `[1, week_count]`.
//! - Buckets are keyed by `assigned_to` and planned independently; there is
//!   no balancing across members.
//! - Within a bucket, priority is tier (`A` first) then score (high first);
//!   remaining ties keep intake order.
//! - Output depends only on inputs, so repeated runs are identical.

use crate::engine::{ProspectMutation, ValidationError};
use crate::model::prospect::{Prospect, ProspectId};
use std::cmp::Reverse;
use std::collections::BTreeMap;

/// Target week per prospect.
pub type WeeklyPlan = BTreeMap<ProspectId, u32>;

/// Computes the weekly plan for all prospects.
///
/// # Errors
/// - `ValidationError::NonPositiveWeekCount` when `week_count == 0`.
pub fn plan_weeks(prospects: &[Prospect], week_count: u32) -> Result<WeeklyPlan, ValidationError> {
    if week_count == 0 {
        return Err(ValidationError::NonPositiveWeekCount);
    }

    let mut plan = WeeklyPlan::new();
    for mut bucket in bucket_by_member(prospects).into_values() {
        sort_by_priority(&mut bucket);
        let per_week = bucket.len().div_ceil(week_count as usize);
        for (index, prospect) in bucket.into_iter().enumerate() {
            let week = ((index / per_week) as u32 + 1).min(week_count);
            plan.insert(prospect.id, week);
        }
    }

    Ok(plan)
}

/// Groups prospects by `assigned_to`, keeping intake order inside each bucket.
///
/// Unassigned prospects share the `None` bucket.
pub fn bucket_by_member(prospects: &[Prospect]) -> BTreeMap<Option<&str>, Vec<&Prospect>> {
    let mut buckets: BTreeMap<Option<&str>, Vec<&Prospect>> = BTreeMap::new();
    for prospect in prospects {
        buckets
            .entry(prospect.assigned_to.as_deref())
            .or_default()
            .push(prospect);
    }
    buckets
}

/// Stable priority sort: tier rank ascending, then score descending.
pub fn sort_by_priority(bucket: &mut [&Prospect]) {
    bucket.sort_by_key(|prospect| (prospect.tier.priority_rank(), Reverse(prospect.score)));
}

/// Converts a plan into the mutations that differ from current state.
pub fn plan_mutations(prospects: &[Prospect], plan: &WeeklyPlan) -> Vec<ProspectMutation> {
    prospects
        .iter()
        .filter_map(|prospect| {
            let week = *plan.get(&prospect.id)?;
            (prospect.target_week != Some(week)).then_some(ProspectMutation::SetTargetWeek {
                prospect_id: prospect.id,
                week,
            })
        })
        .collect()
}

/// Counts prospects whose existing week slot the plan would overwrite.
pub fn overwritten_count(prospects: &[Prospect], plan: &WeeklyPlan) -> usize {
    prospects
        .iter()
        .filter(|prospect| match (prospect.target_week, plan.get(&prospect.id)) {
            (Some(current), Some(next)) => current != *next,
            _ => false,
        })
        .count()
}

#[cfg(test)]
mod tests {
    use super::{overwritten_count, plan_mutations, plan_weeks, sort_by_priority};
    use crate::engine::{ProspectMutation, ValidationError};
    use crate::model::prospect::{Prospect, Tier};

    fn ann_prospects() -> Vec<Prospect> {
        vec![
            Prospect::new("a90", Tier::A, 90).assigned("Ann"),
            Prospect::new("b70", Tier::B, 70).assigned("Ann"),
            Prospect::new("c40", Tier::C, 40).assigned("Ann"),
            Prospect::new("a85", Tier::A, 85).assigned("Ann"),
        ]
    }

    #[test]
    fn four_prospects_over_two_weeks() {
        let prospects = ann_prospects();
        let plan = plan_weeks(&prospects, 2).unwrap();

        assert_eq!(plan[&prospects[0].id], 1);
        assert_eq!(plan[&prospects[3].id], 1);
        assert_eq!(plan[&prospects[1].id], 2);
        assert_eq!(plan[&prospects[2].id], 2);
    }

    #[test]
    fn zero_week_count_is_rejected() {
        let err = plan_weeks(&ann_prospects(), 0).unwrap_err();
        assert_eq!(err, ValidationError::NonPositiveWeekCount);
    }

    #[test]
    fn empty_prospect_set_yields_empty_plan() {
        assert!(plan_weeks(&[], 4).unwrap().is_empty());
    }

    #[test]
    fn single_prospect_bucket_lands_in_week_one() {
        let prospects = vec![
            Prospect::new("solo", Tier::C, 1).assigned("Bob"),
            Prospect::new("x", Tier::A, 99).assigned("Ann"),
            Prospect::new("y", Tier::A, 98).assigned("Ann"),
        ];
        let plan = plan_weeks(&prospects, 5).unwrap();
        assert_eq!(plan[&prospects[0].id], 1);
    }

    #[test]
    fn buckets_are_planned_independently() {
        let mut prospects = ann_prospects();
        prospects.push(Prospect::new("bob-c", Tier::C, 10).assigned("Bob"));
        prospects.push(Prospect::new("unassigned", Tier::C, 5));
        let plan = plan_weeks(&prospects, 2).unwrap();

        assert_eq!(plan[&prospects[4].id], 1);
        assert_eq!(plan[&prospects[5].id], 1);
        assert_eq!(plan[&prospects[2].id], 2);
    }

    #[test]
    fn more_weeks_than_prospects_uses_leading_weeks() {
        let prospects = ann_prospects();
        let plan = plan_weeks(&prospects, 10).unwrap();
        let mut weeks: Vec<u32> = prospects.iter().map(|p| plan[&p.id]).collect();
        weeks.sort_unstable();
        assert_eq!(weeks, vec![1, 2, 3, 4]);
    }

    #[test]
    fn equal_keys_keep_intake_order() {
        let first = Prospect::new("first", Tier::B, 50).assigned("Ann");
        let second = Prospect::new("second", Tier::B, 50).assigned("Ann");
        let prospects = vec![first.clone(), second.clone()];
        let mut bucket: Vec<&Prospect> = prospects.iter().collect();
        sort_by_priority(&mut bucket);
        assert_eq!(bucket[0].id, first.id);

        let plan = plan_weeks(&prospects, 2).unwrap();
        assert_eq!(plan[&first.id], 1);
        assert_eq!(plan[&second.id], 2);
    }

    #[test]
    fn uneven_bucket_clamps_to_last_week() {
        // perWeek = ceil(7 / 3) = 3 -> weeks 1,1,1,2,2,2,3
        let prospects: Vec<Prospect> = (0..7)
            .map(|i| Prospect::new(format!("p{i}"), Tier::B, 90 - i as u8).assigned("Ann"))
            .collect();
        let plan = plan_weeks(&prospects, 3).unwrap();
        let weeks: Vec<u32> = prospects.iter().map(|p| plan[&p.id]).collect();
        assert_eq!(weeks, vec![1, 1, 1, 2, 2, 2, 3]);
    }

    #[test]
    fn plan_mutations_skip_unchanged_weeks() {
        let mut prospects = ann_prospects();
        prospects[0].target_week = Some(1);
        prospects[1].target_week = Some(1);
        let plan = plan_weeks(&prospects, 2).unwrap();

        let mutations = plan_mutations(&prospects, &plan);
        assert_eq!(mutations.len(), 3);
        assert!(!mutations.contains(&ProspectMutation::SetTargetWeek {
            prospect_id: prospects[0].id,
            week: 1,
        }));
        assert_eq!(overwritten_count(&prospects, &plan), 1);
    }

    #[test]
    fn generated_sets_respect_coverage_and_priority() {
        let mut seed: u64 = 0x5eed;
        let mut next = move |bound: u64| {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (seed >> 33) % bound
        };
        let members = ["Ann", "Bob", "Cy"];
        let tiers = [Tier::A, Tier::B, Tier::C];

        for _ in 0..50 {
            let size = next(40) as usize;
            let week_count = next(6) as u32 + 1;
            let prospects: Vec<Prospect> = (0..size)
                .map(|i| {
                    let prospect = Prospect::new(
                        format!("p{i}"),
                        tiers[next(3) as usize],
                        next(101) as u8,
                    );
                    match next(4) {
                        0 => prospect,
                        n => prospect.assigned(members[(n - 1) as usize]),
                    }
                })
                .collect();

            let plan = plan_weeks(&prospects, week_count).unwrap();
            assert_eq!(plan.len(), prospects.len());
            assert!(plan.values().all(|week| (1..=week_count).contains(week)));
            assert_eq!(plan, plan_weeks(&prospects, week_count).unwrap());

            for p in &prospects {
                for q in &prospects {
                    let ahead = p.assigned_to == q.assigned_to
                        && (p.tier.priority_rank(), std::cmp::Reverse(p.score))
                            < (q.tier.priority_rank(), std::cmp::Reverse(q.score));
                    if ahead {
                        assert!(plan[&p.id] <= plan[&q.id]);
                    }
                }
            }
        }
    }
}
