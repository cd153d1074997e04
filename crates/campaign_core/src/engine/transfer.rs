//! Manual workload rebalance between two roster members.
//!
//! # Invariants
//! - Lowest-priority work moves first: tier `C` before `B` before `A`, then
//!   lowest score first; equal keys keep intake order.
//! - Only `assigned_to` changes; `target_week` is inherited by the new owner.
//! - Source loses exactly `count` prospects and target gains exactly `count`.

use crate::engine::{ConflictError, EngineResult, ProspectMutation, ValidationError};
use crate::model::member::{MemberId, Roster, TeamMember};
use crate::model::prospect::Prospect;

/// Validated transfer request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferRequest {
    pub from_member_id: MemberId,
    pub to_member_id: MemberId,
    pub count: usize,
}

/// Plans the transfer of `request.count` prospects.
///
/// # Errors
/// - `Validation(NonPositiveTransferCount)` when `count == 0`.
/// - `Validation(SameSourceAndTarget)` when both members are the same.
/// - `Conflict(MemberNotOnRoster)` when either member is missing.
/// - `Conflict(InsufficientProspects)` when the source owns fewer than `count`.
pub fn plan_transfer(
    roster: &Roster,
    prospects: &[Prospect],
    request: TransferRequest,
) -> EngineResult<Vec<ProspectMutation>> {
    if request.count == 0 {
        return Err(ValidationError::NonPositiveTransferCount.into());
    }
    if request.from_member_id == request.to_member_id {
        return Err(ValidationError::SameSourceAndTarget(request.from_member_id).into());
    }

    let from = require_member(roster, request.from_member_id)?;
    let to = require_member(roster, request.to_member_id)?;

    let mut owned: Vec<&Prospect> = prospects
        .iter()
        .filter(|prospect| prospect.is_assigned_to(&from.display_name))
        .collect();
    if request.count > owned.len() {
        return Err(ConflictError::InsufficientProspects {
            member_id: from.member_id,
            requested: request.count,
            available: owned.len(),
        }
        .into());
    }

    sort_by_shed_order(&mut owned);
    Ok(reassign_all(owned.into_iter().take(request.count), to))
}

/// Stable shed sort: tier shed rank ascending, then score ascending.
pub fn sort_by_shed_order(bucket: &mut [&Prospect]) {
    bucket.sort_by_key(|prospect| (prospect.tier.shed_rank(), prospect.score));
}

/// Builds reassignment mutations pointing every prospect at `target`.
pub(crate) fn reassign_all<'a>(
    prospects: impl IntoIterator<Item = &'a Prospect>,
    target: &TeamMember,
) -> Vec<ProspectMutation> {
    prospects
        .into_iter()
        .map(|prospect| ProspectMutation::Reassign {
            prospect_id: prospect.id,
            assigned_to: target.display_name.clone(),
        })
        .collect()
}

pub(crate) fn require_member(roster: &Roster, member_id: MemberId) -> EngineResult<&TeamMember> {
    roster
        .get(member_id)
        .ok_or_else(|| ConflictError::MemberNotOnRoster(member_id).into())
}
