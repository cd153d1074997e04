//! Pure scheduling and allocation engines.
//!
//! # Responsibility
//! - Compute weekly plans, transfers, orphan repairs and roster changes as
//!   plain data (`ProspectMutation`, `RosterChange`).
//! - Reject invalid requests before any mutation is produced.
//!
//! # Invariants
//! - Engines never mutate their inputs; callers commit the returned changes
//!   as one unit.
//! - Output mutations only rewrite `assigned_to` / `target_week`, so the set
//!   of prospect ids is preserved.

use crate::model::member::{MemberId, MemberRole, TeamMember};
use crate::model::prospect::ProspectId;
use crate::model::week::InvalidDateRange;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod allocation;
pub mod membership;
pub mod orphan;
pub mod transfer;

/// One field-level change to an existing prospect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProspectMutation {
    /// Sets `target_week` to a week in `[1, week_count]`.
    SetTargetWeek { prospect_id: ProspectId, week: u32 },
    /// Rewrites `assigned_to` to a roster display name.
    Reassign {
        prospect_id: ProspectId,
        assigned_to: String,
    },
}

impl ProspectMutation {
    pub fn prospect_id(&self) -> ProspectId {
        match self {
            Self::SetTargetWeek { prospect_id, .. } | Self::Reassign { prospect_id, .. } => {
                *prospect_id
            }
        }
    }
}

/// One roster change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RosterChange {
    Add(TeamMember),
    Remove(MemberId),
    SetRole { member_id: MemberId, role: MemberRole },
}

/// Bad input, rejected before any mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    NonPositiveWeekCount,
    NonPositiveTransferCount,
    SameSourceAndTarget(MemberId),
    MissingReassignmentTarget {
        member_id: MemberId,
        prospect_count: usize,
    },
    CannotRemoveOwner(MemberId),
    WeekOutOfRange {
        week: u32,
        week_count: u32,
    },
    BlankName,
    ScoreOutOfRange(u8),
    InvalidDateRange(InvalidDateRange),
    OwnerAlreadyAssigned,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonPositiveWeekCount => write!(f, "week count must be at least 1"),
            Self::NonPositiveTransferCount => write!(f, "transfer count must be at least 1"),
            Self::SameSourceAndTarget(id) => {
                write!(f, "source and target member must differ: {id}")
            }
            Self::MissingReassignmentTarget {
                member_id,
                prospect_count,
            } => write!(
                f,
                "member {member_id} still owns {prospect_count} prospect(s); a reassignment target is required"
            ),
            Self::CannotRemoveOwner(id) => {
                write!(f, "campaign owner {id} cannot be removed; transfer ownership first")
            }
            Self::WeekOutOfRange { week, week_count } => {
                write!(f, "week {week} is outside 1..={week_count}")
            }
            Self::BlankName => write!(f, "name must not be blank"),
            Self::ScoreOutOfRange(score) => write!(f, "score {score} is outside 0..=100"),
            Self::InvalidDateRange(err) => write!(f, "{err}"),
            Self::OwnerAlreadyAssigned => write!(f, "campaign already has an owner"),
        }
    }
}

impl Error for ValidationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidDateRange(err) => Some(err),
            _ => None,
        }
    }
}

/// Request conflicts with current campaign state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictError {
    MemberNotOnRoster(MemberId),
    InsufficientProspects {
        member_id: MemberId,
        requested: usize,
        available: usize,
    },
    MemberAlreadyOnRoster(String),
    ProspectNotFound(ProspectId),
    StaleVersion { expected: u64, actual: u64 },
}

impl Display for ConflictError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MemberNotOnRoster(id) => write!(f, "member is not on the active roster: {id}"),
            Self::InsufficientProspects {
                member_id,
                requested,
                available,
            } => write!(
                f,
                "member {member_id} has {available} prospect(s), cannot transfer {requested}"
            ),
            Self::MemberAlreadyOnRoster(name) => {
                write!(f, "member already on roster: `{name}`")
            }
            Self::ProspectNotFound(id) => write!(f, "prospect not found: {id}"),
            Self::StaleVersion { expected, actual } => write!(
                f,
                "campaign changed since it was read (expected version {expected}, found {actual})"
            ),
        }
    }
}

impl Error for ConflictError {}

/// Rejection produced by a pure engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    Validation(ValidationError),
    Conflict(ConflictError),
}

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Conflict(err) => write!(f, "{err}"),
        }
    }
}

impl Error for EngineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Conflict(err) => Some(err),
        }
    }
}

impl From<ValidationError> for EngineError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<ConflictError> for EngineError {
    fn from(value: ConflictError) -> Self {
        Self::Conflict(value)
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
