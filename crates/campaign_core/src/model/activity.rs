//! Append-only campaign activity log model.

use crate::model::campaign::CampaignId;
use serde::{Deserialize, Serialize};

/// Mutating action recorded in the activity log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityAction {
    CampaignCreated,
    ProspectAdded,
    WeeklyPlanRegenerated,
    TargetWeekSet,
    ProspectsTransferred,
    OrphansResolved,
    MemberAdded,
    MemberRemoved,
    OwnerChanged,
}

impl ActivityAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CampaignCreated => "campaign_created",
            Self::ProspectAdded => "prospect_added",
            Self::WeeklyPlanRegenerated => "weekly_plan_regenerated",
            Self::TargetWeekSet => "target_week_set",
            Self::ProspectsTransferred => "prospects_transferred",
            Self::OrphansResolved => "orphans_resolved",
            Self::MemberAdded => "member_added",
            Self::MemberRemoved => "member_removed",
            Self::OwnerChanged => "owner_changed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "campaign_created" => Some(Self::CampaignCreated),
            "prospect_added" => Some(Self::ProspectAdded),
            "weekly_plan_regenerated" => Some(Self::WeeklyPlanRegenerated),
            "target_week_set" => Some(Self::TargetWeekSet),
            "prospects_transferred" => Some(Self::ProspectsTransferred),
            "orphans_resolved" => Some(Self::OrphansResolved),
            "member_added" => Some(Self::MemberAdded),
            "member_removed" => Some(Self::MemberRemoved),
            "owner_changed" => Some(Self::OwnerChanged),
            _ => None,
        }
    }
}

/// Activity entry to be appended by a commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewActivity {
    pub action: ActivityAction,
    /// Human-readable summary for history display.
    pub detail: String,
}

impl NewActivity {
    pub fn new(action: ActivityAction, detail: impl Into<String>) -> Self {
        Self {
            action,
            detail: detail.into(),
        }
    }
}

/// Persisted activity entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub id: i64,
    pub campaign_id: CampaignId,
    pub action: ActivityAction,
    pub detail: String,
    /// Campaign version produced by the commit that wrote this entry.
    pub version: u64,
    /// Epoch milliseconds.
    pub created_at: i64,
}
