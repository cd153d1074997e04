//! Orphaned prospect detection and bulk repair.
//!
//! A prospect is orphaned when `assigned_to` names someone who is no longer
//! on the roster. Unassigned prospects are not orphans.

use crate::engine::transfer::{reassign_all, require_member};
use crate::engine::{EngineResult, ProspectMutation};
use crate::model::member::{MemberId, Roster};
use crate::model::prospect::Prospect;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Orphaned prospects plus the distinct stale member names they reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrphanReport {
    /// Orphans in intake order.
    pub prospects: Vec<Prospect>,
    /// Distinct stale names, sorted.
    pub stale_names: Vec<String>,
}

impl OrphanReport {
    pub fn is_empty(&self) -> bool {
        self.prospects.is_empty()
    }
}

pub fn is_orphan(roster: &Roster, prospect: &Prospect) -> bool {
    prospect
        .assigned_to
        .as_deref()
        .is_some_and(|name| !roster.contains_name(name))
}

/// Lists every orphaned prospect.
pub fn find_orphans(roster: &Roster, prospects: &[Prospect]) -> OrphanReport {
    let orphans: Vec<Prospect> = prospects
        .iter()
        .filter(|prospect| is_orphan(roster, prospect))
        .cloned()
        .collect();
    let stale_names: BTreeSet<String> = orphans
        .iter()
        .filter_map(|prospect| prospect.assigned_to.clone())
        .collect();

    OrphanReport {
        prospects: orphans,
        stale_names: stale_names.into_iter().collect(),
    }
}

/// Plans reassignment of all current orphans to `target_member_id`.
///
/// Every orphan moves regardless of which stale name it references. An
/// empty result means there is nothing to repair.
///
/// # Errors
/// - `Conflict(MemberNotOnRoster)` when the target is not on the roster.
pub fn plan_orphan_resolution(
    roster: &Roster,
    prospects: &[Prospect],
    target_member_id: MemberId,
) -> EngineResult<Vec<ProspectMutation>> {
    let target = require_member(roster, target_member_id)?;
    let orphans = prospects
        .iter()
        .filter(|prospect| is_orphan(roster, prospect));
    Ok(reassign_all(orphans, target))
}
