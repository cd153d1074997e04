//! Campaign use-case service.
//!
//! # Responsibility
//! - Expose the campaign scheduling and team allocation operations.
//! - Load a snapshot, run a pure engine, then commit the full result through
//!   the repository under the snapshot version.
//!
//! # Invariants
//! - Nothing is written when an engine rejects a request.
//! - Every successful mutation appends exactly one activity entry.
//! - A concurrent commit between load and commit surfaces as
//!   `ConflictError::StaleVersion`; the operation can be retried in full.
//! - Weekly plan regeneration is two-step: request a proposal, then confirm it.

use crate::engine::allocation::{overwritten_count, plan_mutations, plan_weeks, WeeklyPlan};
use crate::engine::membership::{
    plan_add_member, plan_member_removal, plan_owner_change, NewMember,
};
use crate::engine::orphan::{find_orphans, plan_orphan_resolution, OrphanReport};
use crate::engine::transfer::{plan_transfer, TransferRequest};
use crate::engine::{
    ConflictError, EngineError, ProspectMutation, RosterChange, ValidationError,
};
use crate::model::activity::{ActivityAction, ActivityEntry, NewActivity};
use crate::model::campaign::{Campaign, CampaignGoals, CampaignId, CampaignState, MemberWorkload};
use crate::model::member::{normalize_display_name, MemberId, MemberRole, TeamMember};
use crate::model::prospect::{Prospect, ProspectId, ProspectStatus, Tier, MAX_SCORE};
use crate::model::week::generate_weeks;
use crate::repo::campaign_repo::{CampaignCommit, CampaignRepository, RepoError};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;
use uuid::Uuid;

/// Service error for campaign use-cases.
#[derive(Debug)]
pub enum CampaignServiceError {
    /// Bad input; nothing was written.
    Validation(ValidationError),
    /// Request conflicts with current state; nothing was written.
    Conflict(ConflictError),
    CampaignNotFound(CampaignId),
    /// Storage failed; the commit was rolled back and may be retried.
    Persistence(RepoError),
}

impl Display for CampaignServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "validation error: {err}"),
            Self::Conflict(err) => write!(f, "conflict: {err}"),
            Self::CampaignNotFound(id) => write!(f, "campaign not found: {id}"),
            Self::Persistence(err) => write!(f, "persistence error: {err}"),
        }
    }
}

impl Error for CampaignServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Conflict(err) => Some(err),
            Self::CampaignNotFound(_) => None,
            Self::Persistence(err) => Some(err),
        }
    }
}

impl CampaignServiceError {
    fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Conflict(_) => "conflict",
            Self::CampaignNotFound(_) => "not_found",
            Self::Persistence(_) => "persistence",
        }
    }
}

impl From<EngineError> for CampaignServiceError {
    fn from(value: EngineError) -> Self {
        match value {
            EngineError::Validation(err) => Self::Validation(err),
            EngineError::Conflict(err) => Self::Conflict(err),
        }
    }
}

impl From<ValidationError> for CampaignServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<ConflictError> for CampaignServiceError {
    fn from(value: ConflictError) -> Self {
        Self::Conflict(value)
    }
}

impl From<RepoError> for CampaignServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::VersionConflict {
                expected, actual, ..
            } => Self::Conflict(ConflictError::StaleVersion { expected, actual }),
            RepoError::CampaignNotFound(id) => Self::CampaignNotFound(id),
            RepoError::ProspectNotFound(id) => Self::Conflict(ConflictError::ProspectNotFound(id)),
            RepoError::MemberNotFound(id) => Self::Conflict(ConflictError::MemberNotOnRoster(id)),
            other => Self::Persistence(other),
        }
    }
}

pub type ServiceResult<T> = Result<T, CampaignServiceError>;

/// Input for creating a campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCampaign {
    pub name: String,
    /// Epoch milliseconds, inclusive.
    pub start_date: i64,
    /// Epoch milliseconds, inclusive.
    pub end_date: i64,
    #[serde(default)]
    pub goals: CampaignGoals,
    /// Display name of the initial owner.
    pub owner_name: String,
}

/// Input for manual prospect intake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProspect {
    pub company_name: String,
    pub tier: Tier,
    pub score: u8,
    pub assigned_to: Option<String>,
    pub next_action: Option<String>,
}

/// Precomputed weekly plan awaiting explicit confirmation.
///
/// Confirming commits exactly this plan. If the campaign changes after the
/// proposal was computed, confirmation fails with a stale-version conflict
/// and a new proposal must be requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeeklyPlanProposal {
    campaign_id: CampaignId,
    base_version: u64,
    week_count: u32,
    plan: WeeklyPlan,
    mutations: Vec<ProspectMutation>,
    overwritten: usize,
}

impl WeeklyPlanProposal {
    pub fn campaign_id(&self) -> CampaignId {
        self.campaign_id
    }

    pub fn base_version(&self) -> u64 {
        self.base_version
    }

    pub fn week_count(&self) -> u32 {
        self.week_count
    }

    /// Target week for every prospect in the campaign.
    pub fn plan(&self) -> &WeeklyPlan {
        &self.plan
    }

    /// Number of prospects whose week changes on confirm.
    pub fn changed_count(&self) -> usize {
        self.mutations.len()
    }

    /// Number of existing week slots (manual or earlier plans) replaced on confirm.
    pub fn overwritten_count(&self) -> usize {
        self.overwritten
    }
}

/// Result of confirming a weekly plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeeklyPlanCommitted {
    pub version: u64,
    pub changed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferOutcome {
    /// Prospects moved, in shed order.
    pub moved: Vec<ProspectId>,
    pub version: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrphanResolution {
    pub reassigned: Vec<ProspectId>,
    /// `None` when there was nothing to resolve and no commit happened.
    pub version: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalOutcome {
    pub removed: TeamMember,
    pub reassigned_to: Option<TeamMember>,
    pub reassigned: Vec<ProspectId>,
    pub version: u64,
}

/// Campaign service facade over repository implementations.
pub struct CampaignService<R: CampaignRepository> {
    repo: R,
}

impl<R: CampaignRepository> CampaignService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates a campaign with its week calendar and owner.
    pub fn create_campaign(&self, input: &NewCampaign) -> ServiceResult<CampaignState> {
        let campaign_id = Uuid::new_v4();
        self.run("create_campaign", campaign_id, || {
            let name = input.name.trim();
            if name.is_empty() {
                return Err(ValidationError::BlankName.into());
            }
            let owner_name =
                normalize_display_name(&input.owner_name).ok_or(ValidationError::BlankName)?;
            let weeks = generate_weeks(input.start_date, input.end_date)
                .map_err(ValidationError::InvalidDateRange)?;

            let campaign = Campaign {
                id: campaign_id,
                name: name.to_string(),
                start_date: input.start_date,
                end_date: input.end_date,
                goals: input.goals,
                version: 0,
            };
            let owner = TeamMember::new(owner_name, MemberRole::Owner);
            self.repo.create_campaign(&campaign, &owner, &weeks)?;
            self.load(campaign_id)
        })
    }

    /// Loads one campaign snapshot.
    pub fn get_campaign(&self, campaign_id: CampaignId) -> ServiceResult<CampaignState> {
        self.load(campaign_id)
    }

    /// Appends one prospect in intake order.
    pub fn add_prospect(
        &self,
        campaign_id: CampaignId,
        input: NewProspect,
    ) -> ServiceResult<Prospect> {
        self.run("add_prospect", campaign_id, || {
            if input.company_name.trim().is_empty() {
                return Err(ValidationError::BlankName.into());
            }
            if input.score > MAX_SCORE {
                return Err(ValidationError::ScoreOutOfRange(input.score).into());
            }

            let state = self.load(campaign_id)?;
            let mut prospect = Prospect::new(input.company_name.trim(), input.tier, input.score);
            prospect.assigned_to = input.assigned_to.as_deref().and_then(normalize_display_name);
            prospect.next_action = input.next_action.clone();
            prospect.status = ProspectStatus::NotContacted;

            let commit = CampaignCommit::new(
                campaign_id,
                state.version(),
                NewActivity::new(
                    ActivityAction::ProspectAdded,
                    format!("prospect {} added (tier {})", prospect.id, prospect.tier.as_str()),
                ),
            )
            .with_new_prospects(vec![prospect.clone()]);
            self.repo.commit(&commit)?;
            Ok(prospect)
        })
    }

    /// Computes a weekly plan proposal without writing anything.
    pub fn request_weekly_plan(&self, campaign_id: CampaignId) -> ServiceResult<WeeklyPlanProposal> {
        let state = self.load(campaign_id)?;
        let week_count = state.week_count();
        let plan = plan_weeks(&state.prospects, week_count)?;
        let mutations = plan_mutations(&state.prospects, &plan);
        let overwritten = overwritten_count(&state.prospects, &plan);

        info!(
            "event=weekly_plan_requested module=service status=ok campaign={} version={} prospects={} changes={} overwritten={}",
            campaign_id,
            state.version(),
            plan.len(),
            mutations.len(),
            overwritten
        );

        Ok(WeeklyPlanProposal {
            campaign_id,
            base_version: state.version(),
            week_count,
            plan,
            mutations,
            overwritten,
        })
    }

    /// Commits a previously requested weekly plan.
    pub fn confirm_weekly_plan(
        &self,
        proposal: &WeeklyPlanProposal,
    ) -> ServiceResult<WeeklyPlanCommitted> {
        self.run("confirm_weekly_plan", proposal.campaign_id, || {
            let commit = CampaignCommit::new(
                proposal.campaign_id,
                proposal.base_version,
                NewActivity::new(
                    ActivityAction::WeeklyPlanRegenerated,
                    format!(
                        "weekly plan regenerated over {} week(s): {} prospect(s) moved, {} slot(s) overwritten",
                        proposal.week_count,
                        proposal.mutations.len(),
                        proposal.overwritten
                    ),
                ),
            )
            .with_mutations(proposal.mutations.clone());
            let version = self.repo.commit(&commit)?;
            Ok(WeeklyPlanCommitted {
                version,
                changed: proposal.mutations.len(),
            })
        })
    }

    /// Manually pins one prospect to a week.
    pub fn set_target_week(
        &self,
        campaign_id: CampaignId,
        prospect_id: ProspectId,
        week: u32,
    ) -> ServiceResult<u64> {
        self.run("set_target_week", campaign_id, || {
            let state = self.load(campaign_id)?;
            let week_count = state.week_count();
            if week == 0 || week > week_count {
                return Err(ValidationError::WeekOutOfRange { week, week_count }.into());
            }
            if state.prospect(prospect_id).is_none() {
                return Err(ConflictError::ProspectNotFound(prospect_id).into());
            }

            let commit = CampaignCommit::new(
                campaign_id,
                state.version(),
                NewActivity::new(
                    ActivityAction::TargetWeekSet,
                    format!("prospect {prospect_id} pinned to week {week}"),
                ),
            )
            .with_mutations(vec![ProspectMutation::SetTargetWeek { prospect_id, week }]);
            Ok(self.repo.commit(&commit)?)
        })
    }

    /// Moves `count` lowest-priority prospects from one member to another.
    pub fn transfer_prospects(
        &self,
        campaign_id: CampaignId,
        from_member_id: MemberId,
        to_member_id: MemberId,
        count: usize,
    ) -> ServiceResult<TransferOutcome> {
        self.run("transfer_prospects", campaign_id, || {
            let state = self.load(campaign_id)?;
            let request = TransferRequest {
                from_member_id,
                to_member_id,
                count,
            };
            let mutations = plan_transfer(&state.roster, &state.prospects, request)?;
            let moved: Vec<ProspectId> = mutations.iter().map(ProspectMutation::prospect_id).collect();

            let detail = format!(
                "{} prospect(s) transferred from {} to {}",
                moved.len(),
                member_label(&state, from_member_id),
                member_label(&state, to_member_id)
            );
            let commit = CampaignCommit::new(
                campaign_id,
                state.version(),
                NewActivity::new(ActivityAction::ProspectsTransferred, detail),
            )
            .with_mutations(mutations);
            let version = self.repo.commit(&commit)?;
            Ok(TransferOutcome { moved, version })
        })
    }

    /// Lists orphaned prospects and the stale names they reference.
    pub fn list_orphans(&self, campaign_id: CampaignId) -> ServiceResult<OrphanReport> {
        let state = self.load(campaign_id)?;
        Ok(find_orphans(&state.roster, &state.prospects))
    }

    /// Reassigns every orphaned prospect to one roster member.
    pub fn resolve_orphans(
        &self,
        campaign_id: CampaignId,
        target_member_id: MemberId,
    ) -> ServiceResult<OrphanResolution> {
        self.run("resolve_orphans", campaign_id, || {
            let state = self.load(campaign_id)?;
            let stale_names = find_orphans(&state.roster, &state.prospects).stale_names;
            let mutations =
                plan_orphan_resolution(&state.roster, &state.prospects, target_member_id)?;
            let reassigned: Vec<ProspectId> =
                mutations.iter().map(ProspectMutation::prospect_id).collect();
            if mutations.is_empty() {
                return Ok(OrphanResolution {
                    reassigned,
                    version: None,
                });
            }

            let detail = format!(
                "{} orphaned prospect(s) from [{}] reassigned to {}",
                reassigned.len(),
                stale_names.join(", "),
                member_label(&state, target_member_id)
            );
            let commit = CampaignCommit::new(
                campaign_id,
                state.version(),
                NewActivity::new(ActivityAction::OrphansResolved, detail),
            )
            .with_mutations(mutations);
            let version = self.repo.commit(&commit)?;
            Ok(OrphanResolution {
                reassigned,
                version: Some(version),
            })
        })
    }

    /// Adds one roster entry.
    pub fn add_member(&self, campaign_id: CampaignId, request: &NewMember) -> ServiceResult<TeamMember> {
        self.run("add_member", campaign_id, || {
            let state = self.load(campaign_id)?;
            let member = plan_add_member(&state.roster, request)?;
            let commit = CampaignCommit::new(
                campaign_id,
                state.version(),
                NewActivity::new(
                    ActivityAction::MemberAdded,
                    format!("{} added as {}", member.display_name, member.role.as_str()),
                ),
            )
            .with_roster_changes(vec![RosterChange::Add(member.clone())]);
            self.repo.commit(&commit)?;
            Ok(member)
        })
    }

    /// Removes a non-owner member, reassigning its prospects in the same commit.
    pub fn remove_member(
        &self,
        campaign_id: CampaignId,
        member_id: MemberId,
        reassign_to: Option<MemberId>,
    ) -> ServiceResult<RemovalOutcome> {
        self.run("remove_member", campaign_id, || {
            let state = self.load(campaign_id)?;
            let plan = plan_member_removal(&state.roster, &state.prospects, member_id, reassign_to)?;
            let reassigned: Vec<ProspectId> =
                plan.mutations.iter().map(ProspectMutation::prospect_id).collect();

            let detail = match &plan.reassigned_to {
                Some(target) => format!(
                    "{} removed; {} prospect(s) reassigned to {}",
                    plan.member.display_name,
                    reassigned.len(),
                    target.display_name
                ),
                None => format!("{} removed", plan.member.display_name),
            };
            let commit = CampaignCommit::new(
                campaign_id,
                state.version(),
                NewActivity::new(ActivityAction::MemberRemoved, detail),
            )
            .with_mutations(plan.mutations)
            .with_roster_changes(plan.roster_changes);
            let version = self.repo.commit(&commit)?;

            Ok(RemovalOutcome {
                removed: plan.member,
                reassigned_to: plan.reassigned_to,
                reassigned,
                version,
            })
        })
    }

    /// Promotes a roster member to owner and demotes the current owner.
    ///
    /// Returns the campaign version; unchanged when the member already owns it.
    pub fn change_owner(&self, campaign_id: CampaignId, new_owner_id: MemberId) -> ServiceResult<u64> {
        self.run("change_owner", campaign_id, || {
            let state = self.load(campaign_id)?;
            let changes = plan_owner_change(&state.roster, new_owner_id)?;
            if changes.is_empty() {
                return Ok(state.version());
            }

            let commit = CampaignCommit::new(
                campaign_id,
                state.version(),
                NewActivity::new(
                    ActivityAction::OwnerChanged,
                    format!(
                        "ownership moved from {} to {}",
                        state
                            .roster
                            .owner()
                            .map_or("nobody", |owner| owner.display_name.as_str()),
                        member_label(&state, new_owner_id)
                    ),
                ),
            )
            .with_roster_changes(changes);
            Ok(self.repo.commit(&commit)?)
        })
    }

    /// Prospect count per roster member, in roster order.
    pub fn member_workload(&self, campaign_id: CampaignId) -> ServiceResult<Vec<MemberWorkload>> {
        let state = self.load(campaign_id)?;
        Ok(state
            .roster
            .members()
            .iter()
            .map(|member| MemberWorkload {
                member_id: member.member_id,
                display_name: member.display_name.clone(),
                prospect_count: state.assigned_count(&member.display_name),
            })
            .collect())
    }

    /// Lists the campaign activity log, oldest first.
    pub fn list_activity(&self, campaign_id: CampaignId) -> ServiceResult<Vec<ActivityEntry>> {
        self.load(campaign_id)?;
        Ok(self.repo.list_activity(campaign_id)?)
    }

    fn load(&self, campaign_id: CampaignId) -> ServiceResult<CampaignState> {
        self.repo
            .load_campaign(campaign_id)?
            .ok_or(CampaignServiceError::CampaignNotFound(campaign_id))
    }

    fn run<T>(
        &self,
        operation: &'static str,
        campaign_id: CampaignId,
        body: impl FnOnce() -> ServiceResult<T>,
    ) -> ServiceResult<T> {
        let started_at = Instant::now();
        let result = body();
        let duration_ms = started_at.elapsed().as_millis();
        match &result {
            Ok(_) => info!(
                "event={operation} module=service status=ok campaign={campaign_id} duration_ms={duration_ms}"
            ),
            Err(err @ CampaignServiceError::Persistence(_)) => error!(
                "event={operation} module=service status=error campaign={campaign_id} duration_ms={duration_ms} error_code={} error={err}",
                err.code()
            ),
            Err(err) => warn!(
                "event={operation} module=service status=rejected campaign={campaign_id} duration_ms={duration_ms} error_code={} error={err}",
                err.code()
            ),
        }
        result
    }
}

fn member_label(state: &CampaignState, member_id: MemberId) -> String {
    state
        .member(member_id)
        .map_or_else(|| member_id.to_string(), |member| member.display_name.clone())
}
