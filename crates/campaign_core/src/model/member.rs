//! Team roster model.
//!
//! # Responsibility
//! - Define campaign team members and their roles.
//! - Provide ordered roster lookups by member id and display name.
//!
//! # Invariants
//! - Exactly one roster entry holds `MemberRole::Owner`.
//! - Member ids and display names are unique within one roster.
//! - Display names are trimmed with inner whitespace collapsed.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Stable identifier for one team member entry.
pub type MemberId = Uuid;

/// Role held by a team member within one campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    Owner,
    Member,
    Viewer,
}

impl MemberRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Member => "member",
            Self::Viewer => "viewer",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "owner" => Some(Self::Owner),
            "member" => Some(Self::Member),
            "viewer" => Some(Self::Viewer),
            _ => None,
        }
    }
}

/// One roster entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    pub member_id: MemberId,
    /// Name that prospects reference through `assigned_to`.
    pub display_name: String,
    pub role: MemberRole,
}

impl TeamMember {
    /// Creates a roster entry with a generated stable ID.
    ///
    /// The display name is stored as given; callers normalize it first.
    pub fn new(display_name: impl Into<String>, role: MemberRole) -> Self {
        Self {
            member_id: Uuid::new_v4(),
            display_name: display_name.into(),
            role,
        }
    }

    pub fn is_owner(&self) -> bool {
        self.role == MemberRole::Owner
    }
}

/// Ordered campaign roster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    members: Vec<TeamMember>,
}

impl Roster {
    pub fn new(members: Vec<TeamMember>) -> Self {
        Self { members }
    }

    pub fn members(&self) -> &[TeamMember] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn get(&self, member_id: MemberId) -> Option<&TeamMember> {
        self.members
            .iter()
            .find(|member| member.member_id == member_id)
    }

    pub fn find_by_name(&self, display_name: &str) -> Option<&TeamMember> {
        self.members
            .iter()
            .find(|member| member.display_name == display_name)
    }

    pub fn contains_name(&self, display_name: &str) -> bool {
        self.find_by_name(display_name).is_some()
    }

    pub fn owner(&self) -> Option<&TeamMember> {
        self.members.iter().find(|member| member.is_owner())
    }

    /// Appends an entry. Uniqueness is checked by the membership coordinator.
    pub fn push(&mut self, member: TeamMember) {
        self.members.push(member);
    }

    /// Removes and returns the entry with `member_id`, if present.
    pub fn remove(&mut self, member_id: MemberId) -> Option<TeamMember> {
        let index = self
            .members
            .iter()
            .position(|member| member.member_id == member_id)?;
        Some(self.members.remove(index))
    }
}

/// Normalizes a member display name.
///
/// Returns `None` when the value is blank after trimming.
pub fn normalize_display_name(value: &str) -> Option<String> {
    let collapsed = WHITESPACE_RE.replace_all(value.trim(), " ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed.into_owned())
    }
}
