//! Campaign domain model.
//!
//! # Responsibility
//! - Define canonical records used by engines, repository and service.
//! - Keep one versioned aggregate (`CampaignState`) per campaign.
//!
//! # Invariants
//! - Prospects reference members by display name, never by roster position.
//! - Engines never create or destroy prospects.

pub mod activity;
pub mod campaign;
pub mod member;
pub mod prospect;
pub mod week;
