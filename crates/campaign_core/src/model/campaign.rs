//! Campaign record and per-campaign aggregate.
//!
//! # Responsibility
//! - Define the campaign header (date range, goals, version).
//! - Bundle roster, prospects and weeks into one versioned snapshot.
//!
//! # Invariants
//! - `version` increases by exactly one per committed mutation.
//! - `prospects` are kept in intake order; engines rely on it for stable ties.

use crate::model::member::{MemberId, Roster, TeamMember};
use crate::model::prospect::{Prospect, ProspectId};
use crate::model::week::Week;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for one campaign.
pub type CampaignId = Uuid;

/// Quantified campaign targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignGoals {
    pub touchpoints: u32,
    pub opportunities: u32,
    pub estimates: u32,
    pub awards: u32,
}

/// Campaign header record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: CampaignId,
    pub name: String,
    /// Epoch milliseconds, inclusive.
    pub start_date: i64,
    /// Epoch milliseconds, inclusive.
    pub end_date: i64,
    pub goals: CampaignGoals,
    /// Optimistic concurrency token compared on every commit.
    pub version: u64,
}

/// Loaded snapshot of one campaign.
///
/// Engines compute against this snapshot without mutating it; the service
/// commits their output under `campaign.version`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignState {
    pub campaign: Campaign,
    pub roster: Roster,
    pub prospects: Vec<Prospect>,
    pub weeks: Vec<Week>,
}

impl CampaignState {
    pub fn week_count(&self) -> u32 {
        self.weeks.len() as u32
    }

    pub fn version(&self) -> u64 {
        self.campaign.version
    }

    pub fn prospect(&self, prospect_id: ProspectId) -> Option<&Prospect> {
        self.prospects
            .iter()
            .find(|prospect| prospect.id == prospect_id)
    }

    pub fn member(&self, member_id: MemberId) -> Option<&TeamMember> {
        self.roster.get(member_id)
    }

    /// Number of prospects currently pointing at `display_name`.
    pub fn assigned_count(&self, display_name: &str) -> usize {
        self.prospects
            .iter()
            .filter(|prospect| prospect.is_assigned_to(display_name))
            .count()
    }
}

/// Prospect count per roster member, in roster order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberWorkload {
    pub member_id: MemberId,
    pub display_name: String,
    pub prospect_count: usize,
}
