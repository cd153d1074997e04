//! Prospect domain model.
//!
//! # Responsibility
//! - Define the prospect company record worked during a campaign.
//! - Own priority ordering keys used by allocation and transfer engines.
//!
//! # Invariants
//! - `id` is stable and never reused for another prospect.
//! - `score` lies in `[0, 100]`.
//! - `target_week`, once set, is `>= 1` (upper bound depends on the campaign calendar).

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for one prospect company inside a campaign.
pub type ProspectId = Uuid;

/// Highest score a prospect may carry.
pub const MAX_SCORE: u8 = 100;

/// Priority tier. `A` is the highest priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    A,
    B,
    C,
}

impl Tier {
    /// Scheduling rank: `A=0, B=1, C=2`. Lower ranks are worked earlier.
    pub fn priority_rank(self) -> u8 {
        match self {
            Self::A => 0,
            Self::B => 1,
            Self::C => 2,
        }
    }

    /// Shedding rank: `C=0, B=1, A=2`. Lower ranks are handed off first.
    pub fn shed_rank(self) -> u8 {
        2 - self.priority_rank()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "A" | "a" => Some(Self::A),
            "B" | "b" => Some(Self::B),
            "C" | "c" => Some(Self::C),
            _ => None,
        }
    }
}

/// Pipeline status of a prospect company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProspectStatus {
    NotContacted,
    Contacted,
    Engaged,
    Opportunity,
    Won,
    Lost,
}

impl ProspectStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotContacted => "not_contacted",
            Self::Contacted => "contacted",
            Self::Engaged => "engaged",
            Self::Opportunity => "opportunity",
            Self::Won => "won",
            Self::Lost => "lost",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "not_contacted" => Some(Self::NotContacted),
            "contacted" => Some(Self::Contacted),
            "engaged" => Some(Self::Engaged),
            "opportunity" => Some(Self::Opportunity),
            "won" => Some(Self::Won),
            "lost" => Some(Self::Lost),
            _ => None,
        }
    }
}

/// Prospect company record.
///
/// `assigned_to` stores the member display name. It may point at a member
/// that has since left the roster; such prospects are orphans until resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prospect {
    pub id: ProspectId,
    pub company_name: String,
    pub tier: Tier,
    pub score: u8,
    pub assigned_to: Option<String>,
    pub target_week: Option<u32>,
    pub status: ProspectStatus,
    pub next_action: Option<String>,
}

impl Prospect {
    /// Creates a not-yet-contacted prospect with a generated stable ID.
    pub fn new(company_name: impl Into<String>, tier: Tier, score: u8) -> Self {
        Self {
            id: Uuid::new_v4(),
            company_name: company_name.into(),
            tier,
            score,
            assigned_to: None,
            target_week: None,
            status: ProspectStatus::NotContacted,
            next_action: None,
        }
    }

    /// Builder-style helper used by intake paths and tests.
    pub fn assigned(mut self, member_name: impl Into<String>) -> Self {
        self.assigned_to = Some(member_name.into());
        self
    }

    /// Returns whether this prospect is assigned to `member_name`.
    pub fn is_assigned_to(&self, member_name: &str) -> bool {
        self.assigned_to.as_deref() == Some(member_name)
    }

    /// Validates record-local invariants.
    pub fn validate(&self) -> Result<(), ProspectValidationError> {
        if self.company_name.trim().is_empty() {
            return Err(ProspectValidationError::BlankCompanyName);
        }
        if self.score > MAX_SCORE {
            return Err(ProspectValidationError::ScoreOutOfRange(self.score));
        }
        if self.target_week == Some(0) {
            return Err(ProspectValidationError::ZeroTargetWeek);
        }
        Ok(())
    }
}

/// Record-level validation failures for [`Prospect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProspectValidationError {
    BlankCompanyName,
    ScoreOutOfRange(u8),
    ZeroTargetWeek,
}

impl Display for ProspectValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankCompanyName => write!(f, "company name must not be blank"),
            Self::ScoreOutOfRange(score) => {
                write!(f, "score {score} is outside the allowed range 0..={MAX_SCORE}")
            }
            Self::ZeroTargetWeek => write!(f, "target week numbers start at 1"),
        }
    }
}

impl Error for ProspectValidationError {}
