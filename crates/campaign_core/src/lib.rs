//! Campaign prospect scheduling and team allocation core.
//! This crate owns the allocation rules and the campaign consistency invariants.

pub mod config;
pub mod db;
pub mod engine;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, CoreConfig};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use engine::{ConflictError, EngineError, ProspectMutation, RosterChange, ValidationError};
pub use engine::membership::NewMember;
pub use engine::orphan::OrphanReport;
pub use logging::{default_log_level, init_logging, LoggingError};
pub use model::activity::{ActivityAction, ActivityEntry};
pub use model::campaign::{Campaign, CampaignGoals, CampaignId, CampaignState, MemberWorkload};
pub use model::member::{MemberId, MemberRole, Roster, TeamMember};
pub use model::prospect::{Prospect, ProspectId, ProspectStatus, Tier};
pub use model::week::{generate_weeks, Week};
pub use repo::campaign_repo::{
    CampaignCommit, CampaignRepository, RepoError, RepoResult, SqliteCampaignRepository,
};
pub use service::campaign_service::{
    CampaignService, CampaignServiceError, NewCampaign, NewProspect, OrphanResolution,
    RemovalOutcome, ServiceResult, TransferOutcome, WeeklyPlanCommitted, WeeklyPlanProposal,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
