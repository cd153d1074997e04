//! Roster membership change coordinator.
//!
//! # Responsibility
//! - Validate member add, remove and owner-change requests.
//! - Pair a member removal with the reassignment of every prospect the
//!   member still holds, so both commit as one unit.
//!
//! # Invariants
//! - Roster entry lifecycle: `absent -> member -> (owner | removed)`.
//! - The owner is never removed; ownership moves through `plan_owner_change`.
//! - A removal plan never leaves prospects pointing at the removed member.

use crate::engine::transfer::{reassign_all, require_member};
use crate::engine::{ConflictError, EngineResult, ProspectMutation, RosterChange, ValidationError};
use crate::model::member::{normalize_display_name, MemberId, MemberRole, Roster, TeamMember};
use crate::model::prospect::Prospect;
use serde::{Deserialize, Serialize};

/// Request to add one roster entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMember {
    pub display_name: String,
    pub role: MemberRole,
}

/// Validated removal, ready to commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalPlan {
    pub member: TeamMember,
    /// Set when the member still held prospects.
    pub reassigned_to: Option<TeamMember>,
    pub mutations: Vec<ProspectMutation>,
    pub roster_changes: Vec<RosterChange>,
}

/// Validates a new roster entry and assigns it a member id.
///
/// # Errors
/// - `Validation(BlankName)` for blank display names.
/// - `Validation(OwnerAlreadyAssigned)` when adding a second owner.
/// - `Conflict(MemberAlreadyOnRoster)` when the display name is taken.
pub fn plan_add_member(roster: &Roster, request: &NewMember) -> EngineResult<TeamMember> {
    let display_name =
        normalize_display_name(&request.display_name).ok_or(ValidationError::BlankName)?;
    if request.role == MemberRole::Owner && roster.owner().is_some() {
        return Err(ValidationError::OwnerAlreadyAssigned.into());
    }
    if roster.contains_name(&display_name) {
        return Err(ConflictError::MemberAlreadyOnRoster(display_name).into());
    }
    Ok(TeamMember::new(display_name, request.role))
}

/// Plans removal of `member_id`, reassigning its prospects when needed.
///
/// `reassign_to` is ignored when the member holds no prospects.
///
/// # Errors
/// - `Conflict(MemberNotOnRoster)` for unknown member or target.
/// - `Validation(CannotRemoveOwner)` when the member is the owner.
/// - `Validation(MissingReassignmentTarget)` when prospects remain and no
///   target was given.
/// - `Validation(SameSourceAndTarget)` when the target is the removed member.
pub fn plan_member_removal(
    roster: &Roster,
    prospects: &[Prospect],
    member_id: MemberId,
    reassign_to: Option<MemberId>,
) -> EngineResult<RemovalPlan> {
    let member = require_member(roster, member_id)?;
    if member.is_owner() {
        return Err(ValidationError::CannotRemoveOwner(member_id).into());
    }

    let owned: Vec<&Prospect> = prospects
        .iter()
        .filter(|prospect| prospect.is_assigned_to(&member.display_name))
        .collect();

    let roster_changes = vec![RosterChange::Remove(member_id)];
    if owned.is_empty() {
        return Ok(RemovalPlan {
            member: member.clone(),
            reassigned_to: None,
            mutations: Vec::new(),
            roster_changes,
        });
    }

    let target_id = reassign_to.ok_or(ValidationError::MissingReassignmentTarget {
        member_id,
        prospect_count: owned.len(),
    })?;
    if target_id == member_id {
        return Err(ValidationError::SameSourceAndTarget(member_id).into());
    }
    let target = require_member(roster, target_id)?;

    Ok(RemovalPlan {
        member: member.clone(),
        reassigned_to: Some(target.clone()),
        mutations: reassign_all(owned, target),
        roster_changes,
    })
}

/// Plans promotion of `new_owner_id`, demoting the current owner to member.
///
/// Returns no changes when the member already owns the campaign.
pub fn plan_owner_change(roster: &Roster, new_owner_id: MemberId) -> EngineResult<Vec<RosterChange>> {
    let next_owner = require_member(roster, new_owner_id)?;
    if next_owner.is_owner() {
        return Ok(Vec::new());
    }

    let mut changes = Vec::with_capacity(2);
    if let Some(current) = roster.owner() {
        changes.push(RosterChange::SetRole {
            member_id: current.member_id,
            role: MemberRole::Member,
        });
    }
    changes.push(RosterChange::SetRole {
        member_id: new_owner_id,
        role: MemberRole::Owner,
    });
    Ok(changes)
}

#[cfg(test)]
mod tests {
    use super::{plan_add_member, plan_member_removal, plan_owner_change, NewMember};
    use crate::engine::{ConflictError, EngineError, RosterChange, ValidationError};
    use crate::model::member::{MemberRole, Roster, TeamMember};
    use crate::model::prospect::{Prospect, Tier};

    fn roster() -> (Roster, TeamMember, TeamMember, TeamMember) {
        let owner = TeamMember::new("Olive", MemberRole::Owner);
        let ann = TeamMember::new("Ann", MemberRole::Member);
        let bob = TeamMember::new("Bob", MemberRole::Member);
        (
            Roster::new(vec![owner.clone(), ann.clone(), bob.clone()]),
            owner,
            ann,
            bob,
        )
    }

    #[test]
    fn add_member_normalizes_and_rejects_duplicates() {
        let (roster, ..) = roster();
        let added = plan_add_member(
            &roster,
            &NewMember {
                display_name: "  Carol   King ".to_string(),
                role: MemberRole::Member,
            },
        )
        .unwrap();
        assert_eq!(added.display_name, "Carol King");

        let err = plan_add_member(
            &roster,
            &NewMember {
                display_name: "Ann".to_string(),
                role: MemberRole::Viewer,
            },
        )
        .unwrap_err();
        assert_eq!(
            err,
            EngineError::Conflict(ConflictError::MemberAlreadyOnRoster("Ann".to_string()))
        );
    }

    #[test]
    fn add_second_owner_is_rejected() {
        let (roster, ..) = roster();
        let err = plan_add_member(
            &roster,
            &NewMember {
                display_name: "Zoe".to_string(),
                role: MemberRole::Owner,
            },
        )
        .unwrap_err();
        assert_eq!(
            err,
            EngineError::Validation(ValidationError::OwnerAlreadyAssigned)
        );
    }

    #[test]
    fn removing_owner_is_rejected() {
        let (roster, owner, ..) = roster();
        let err = plan_member_removal(&roster, &[], owner.member_id, None).unwrap_err();
        assert_eq!(
            err,
            EngineError::Validation(ValidationError::CannotRemoveOwner(owner.member_id))
        );
    }

    #[test]
    fn member_without_prospects_is_removed_directly() {
        let (roster, _, ann, _) = roster();
        let plan = plan_member_removal(&roster, &[], ann.member_id, None).unwrap();
        assert!(plan.mutations.is_empty());
        assert_eq!(plan.roster_changes, vec![RosterChange::Remove(ann.member_id)]);
    }

    #[test]
    fn member_with_prospects_requires_target() {
        let (roster, _, ann, bob) = roster();
        let prospects = vec![
            Prospect::new("x", Tier::A, 1).assigned("Ann"),
            Prospect::new("y", Tier::B, 2).assigned("Ann"),
            Prospect::new("z", Tier::C, 3).assigned("Bob"),
        ];

        let err = plan_member_removal(&roster, &prospects, ann.member_id, None).unwrap_err();
        assert_eq!(
            err,
            EngineError::Validation(ValidationError::MissingReassignmentTarget {
                member_id: ann.member_id,
                prospect_count: 2,
            })
        );

        let plan =
            plan_member_removal(&roster, &prospects, ann.member_id, Some(bob.member_id)).unwrap();
        assert_eq!(plan.mutations.len(), 2);
        assert_eq!(plan.reassigned_to.map(|m| m.display_name), Some("Bob".to_string()));
    }

    #[test]
    fn reassigning_to_removed_member_is_rejected() {
        let (roster, _, ann, _) = roster();
        let prospects = vec![Prospect::new("x", Tier::A, 1).assigned("Ann")];
        let err = plan_member_removal(&roster, &prospects, ann.member_id, Some(ann.member_id))
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Validation(ValidationError::SameSourceAndTarget(_))
        ));
    }

    #[test]
    fn owner_change_demotes_previous_owner_first() {
        let (roster, owner, ann, _) = roster();
        let changes = plan_owner_change(&roster, ann.member_id).unwrap();
        assert_eq!(
            changes,
            vec![
                RosterChange::SetRole {
                    member_id: owner.member_id,
                    role: MemberRole::Member,
                },
                RosterChange::SetRole {
                    member_id: ann.member_id,
                    role: MemberRole::Owner,
                },
            ]
        );
        assert!(plan_owner_change(&roster, owner.member_id).unwrap().is_empty());
    }
}
