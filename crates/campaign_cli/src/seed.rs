//! Demo campaign seed data.
//!
//! # Responsibility
//! - Build a small, deterministic campaign for local runs of the CLI.
//! - Include one prospect owned by a departed rep so orphan repair has work.

use campaign_core::{
    CampaignGoals, CampaignRepository, CampaignService, MemberRole, NewCampaign, NewMember,
    NewProspect, ServiceResult, Tier,
};

const DAY_MS: i64 = 24 * 60 * 60 * 1000;
/// 2026-01-05T00:00:00Z, a Monday.
const DEMO_START_MS: i64 = 1_767_571_200_000;
const DEMO_DAYS: i64 = 28;

const DEMO_PROSPECTS: &[(&str, Tier, u8, Option<&str>)] = &[
    ("Northwind Freight", Tier::A, 92, Some("Dana Reyes")),
    ("Blue Harbor Clinics", Tier::A, 81, Some("Dana Reyes")),
    ("Quarry Lane Builders", Tier::B, 67, Some("Dana Reyes")),
    ("Cedar Point Schools", Tier::C, 40, Some("Dana Reyes")),
    ("Orchid Dental Group", Tier::B, 74, Some("Sam Ortiz")),
    ("Lakeside Logistics", Tier::C, 35, Some("Sam Ortiz")),
    ("Ironwood Fabrication", Tier::A, 88, Some("Sam Ortiz")),
    ("Summit Ridge Hotels", Tier::B, 59, Some("Former Rep")),
    ("Maple Row Grocers", Tier::C, 22, None),
];

/// Creates the demo campaign with its roster and prospects.
pub fn seed_demo_campaign<R: CampaignRepository>(
    service: &CampaignService<R>,
) -> ServiceResult<campaign_core::CampaignId> {
    let state = service.create_campaign(&NewCampaign {
        name: "Q1 Facilities Outreach".to_string(),
        start_date: DEMO_START_MS,
        end_date: DEMO_START_MS + (DEMO_DAYS - 1) * DAY_MS,
        goals: CampaignGoals {
            touchpoints: 120,
            opportunities: 12,
            estimates: 8,
            awards: 3,
        },
        owner_name: "Dana Reyes".to_string(),
    })?;
    let campaign_id = state.campaign.id;

    service.add_member(
        campaign_id,
        &NewMember {
            display_name: "Sam Ortiz".to_string(),
            role: MemberRole::Member,
        },
    )?;
    service.add_member(
        campaign_id,
        &NewMember {
            display_name: "Lee Park".to_string(),
            role: MemberRole::Member,
        },
    )?;

    for &(company_name, tier, score, assigned_to) in DEMO_PROSPECTS {
        service.add_prospect(
            campaign_id,
            NewProspect {
                company_name: company_name.to_string(),
                tier,
                score,
                assigned_to: assigned_to.map(str::to_string),
                next_action: None,
            },
        )?;
    }

    Ok(campaign_id)
}
