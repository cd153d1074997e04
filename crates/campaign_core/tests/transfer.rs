use campaign_core::db::open_db_in_memory;
use campaign_core::{
    ActivityAction, CampaignGoals, CampaignId, CampaignService, CampaignServiceError,
    CampaignState, ConflictError, MemberId, MemberRole, NewCampaign, NewMember, NewProspect,
    ProspectId, SqliteCampaignRepository, Tier, ValidationError,
};
use rusqlite::Connection;
use uuid::Uuid;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;
const START_MS: i64 = 1_767_571_200_000;

type Service<'conn> = CampaignService<SqliteCampaignRepository<'conn>>;

struct Fixture {
    campaign_id: CampaignId,
    ann: MemberId,
    bob: MemberId,
    a90: ProspectId,
    b70: ProspectId,
    c40: ProspectId,
    a85: ProspectId,
}

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

fn seed(service: &Service<'_>) -> Fixture {
    let state = service
        .create_campaign(&NewCampaign {
            name: "Rebalance".to_string(),
            start_date: START_MS,
            end_date: START_MS + 13 * DAY_MS,
            goals: CampaignGoals::default(),
            owner_name: "Ann".to_string(),
        })
        .unwrap();
    let campaign_id = state.campaign.id;
    let ann = state.roster.owner().unwrap().member_id;
    let bob = service
        .add_member(
            campaign_id,
            &NewMember {
                display_name: "Bob".to_string(),
                role: MemberRole::Member,
            },
        )
        .unwrap()
        .member_id;

    let add = |name: &str, tier: Tier, score: u8| {
        service
            .add_prospect(
                campaign_id,
                NewProspect {
                    company_name: name.to_string(),
                    tier,
                    score,
                    assigned_to: Some("Ann".to_string()),
                    next_action: None,
                },
            )
            .unwrap()
            .id
    };
    let a90 = add("A90", Tier::A, 90);
    let b70 = add("B70", Tier::B, 70);
    let c40 = add("C40", Tier::C, 40);
    let a85 = add("A85", Tier::A, 85);

    Fixture {
        campaign_id,
        ann,
        bob,
        a90,
        b70,
        c40,
        a85,
    }
}

fn owned_by(state: &CampaignState, name: &str) -> Vec<ProspectId> {
    state
        .prospects
        .iter()
        .filter(|prospect| prospect.is_assigned_to(name))
        .map(|prospect| prospect.id)
        .collect()
}

#[test]
fn transfer_sheds_lowest_priority_prospect_first() {
    let conn = setup();
    let service = CampaignService::new(SqliteCampaignRepository::try_new(&conn).unwrap());
    let f = seed(&service);

    let outcome = service
        .transfer_prospects(f.campaign_id, f.ann, f.bob, 1)
        .unwrap();
    assert_eq!(outcome.moved, vec![f.c40]);

    let state = service.get_campaign(f.campaign_id).unwrap();
    assert_eq!(owned_by(&state, "Ann"), vec![f.a90, f.b70, f.a85]);
    assert_eq!(owned_by(&state, "Bob"), vec![f.c40]);
    assert_eq!(state.version(), outcome.version);

    let last = service.list_activity(f.campaign_id).unwrap().pop().unwrap();
    assert_eq!(last.action, ActivityAction::ProspectsTransferred);
    assert_eq!(last.version, outcome.version);
}

#[test]
fn transfer_moves_tier_c_then_b_then_lowest_score_a() {
    let conn = setup();
    let service = CampaignService::new(SqliteCampaignRepository::try_new(&conn).unwrap());
    let f = seed(&service);

    let outcome = service
        .transfer_prospects(f.campaign_id, f.ann, f.bob, 3)
        .unwrap();
    assert_eq!(outcome.moved, vec![f.c40, f.b70, f.a85]);

    let workload = service.member_workload(f.campaign_id).unwrap();
    let counts: Vec<(&str, usize)> = workload
        .iter()
        .map(|entry| (entry.display_name.as_str(), entry.prospect_count))
        .collect();
    assert_eq!(counts, vec![("Ann", 1), ("Bob", 3)]);
}

#[test]
fn transfer_keeps_existing_week_slots() {
    let conn = setup();
    let service = CampaignService::new(SqliteCampaignRepository::try_new(&conn).unwrap());
    let f = seed(&service);

    let proposal = service.request_weekly_plan(f.campaign_id).unwrap();
    service.confirm_weekly_plan(&proposal).unwrap();
    service
        .transfer_prospects(f.campaign_id, f.ann, f.bob, 1)
        .unwrap();

    let state = service.get_campaign(f.campaign_id).unwrap();
    let moved = state.prospect(f.c40).unwrap();
    assert_eq!(moved.assigned_to.as_deref(), Some("Bob"));
    assert_eq!(moved.target_week, Some(2));
}

#[test]
fn zero_count_is_a_validation_error_and_changes_nothing() {
    let conn = setup();
    let service = CampaignService::new(SqliteCampaignRepository::try_new(&conn).unwrap());
    let f = seed(&service);
    let before = service.get_campaign(f.campaign_id).unwrap();

    let err = service
        .transfer_prospects(f.campaign_id, f.ann, f.bob, 0)
        .unwrap_err();
    assert!(matches!(
        err,
        CampaignServiceError::Validation(ValidationError::NonPositiveTransferCount)
    ));
    assert_eq!(service.get_campaign(f.campaign_id).unwrap(), before);
}

#[test]
fn count_above_availability_is_rejected_and_changes_nothing() {
    let conn = setup();
    let service = CampaignService::new(SqliteCampaignRepository::try_new(&conn).unwrap());
    let f = seed(&service);
    let before = service.get_campaign(f.campaign_id).unwrap();

    let err = service
        .transfer_prospects(f.campaign_id, f.ann, f.bob, 5)
        .unwrap_err();
    match err {
        CampaignServiceError::Conflict(ConflictError::InsufficientProspects {
            member_id,
            requested,
            available,
        }) => {
            assert_eq!(member_id, f.ann);
            assert_eq!(requested, 5);
            assert_eq!(available, 4);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(service.get_campaign(f.campaign_id).unwrap(), before);
}

#[test]
fn transfer_requires_distinct_members_on_roster() {
    let conn = setup();
    let service = CampaignService::new(SqliteCampaignRepository::try_new(&conn).unwrap());
    let f = seed(&service);

    assert!(matches!(
        service.transfer_prospects(f.campaign_id, f.ann, f.ann, 1),
        Err(CampaignServiceError::Validation(
            ValidationError::SameSourceAndTarget(_)
        ))
    ));

    let stranger = Uuid::new_v4();
    assert!(matches!(
        service.transfer_prospects(f.campaign_id, f.ann, stranger, 1),
        Err(CampaignServiceError::Conflict(ConflictError::MemberNotOnRoster(id))) if id == stranger
    ));
}

#[test]
fn transfers_conserve_prospect_ids() {
    let conn = setup();
    let service = CampaignService::new(SqliteCampaignRepository::try_new(&conn).unwrap());
    let f = seed(&service);
    let ids_before: Vec<ProspectId> = service
        .get_campaign(f.campaign_id)
        .unwrap()
        .prospects
        .iter()
        .map(|p| p.id)
        .collect();

    service
        .transfer_prospects(f.campaign_id, f.ann, f.bob, 2)
        .unwrap();
    service
        .transfer_prospects(f.campaign_id, f.bob, f.ann, 1)
        .unwrap();

    let ids_after: Vec<ProspectId> = service
        .get_campaign(f.campaign_id)
        .unwrap()
        .prospects
        .iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(ids_before, ids_after);
    assert_eq!(ids_after.len(), 4);
}
