use campaign_core::db::open_db_in_memory;
use campaign_core::{
    ActivityAction, CampaignGoals, CampaignId, CampaignService, CampaignServiceError,
    ConflictError, MemberId, MemberRole, NewCampaign, NewMember, NewProspect,
    SqliteCampaignRepository, Tier, ValidationError,
};
use rusqlite::Connection;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;
const START_MS: i64 = 1_767_571_200_000;

type Service<'conn> = CampaignService<SqliteCampaignRepository<'conn>>;

struct Team {
    campaign_id: CampaignId,
    dave: MemberId,
    ann: MemberId,
    bob: MemberId,
}

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

fn member(service: &Service<'_>, campaign_id: CampaignId, name: &str) -> MemberId {
    service
        .add_member(
            campaign_id,
            &NewMember {
                display_name: name.to_string(),
                role: MemberRole::Member,
            },
        )
        .unwrap()
        .member_id
}

fn team(service: &Service<'_>) -> Team {
    let state = service
        .create_campaign(&NewCampaign {
            name: "Roster".to_string(),
            start_date: START_MS,
            end_date: START_MS + 13 * DAY_MS,
            goals: CampaignGoals::default(),
            owner_name: "Dave".to_string(),
        })
        .unwrap();
    let campaign_id = state.campaign.id;
    let dave = state.roster.owner().unwrap().member_id;
    let ann = member(service, campaign_id, "Ann");
    let bob = member(service, campaign_id, "Bob");
    Team {
        campaign_id,
        dave,
        ann,
        bob,
    }
}

fn give(service: &Service<'_>, campaign_id: CampaignId, owner: &str, count: usize) {
    for index in 0..count {
        service
            .add_prospect(
                campaign_id,
                NewProspect {
                    company_name: format!("{owner} Co {index}"),
                    tier: Tier::A,
                    score: 60,
                    assigned_to: Some(owner.to_string()),
                    next_action: None,
                },
            )
            .unwrap();
    }
}

#[test]
fn removing_member_reassigns_prospects_in_same_commit() {
    let conn = setup();
    let service = CampaignService::new(SqliteCampaignRepository::try_new(&conn).unwrap());
    let t = team(&service);
    give(&service, t.campaign_id, "Ann", 3);
    let version_before = service.get_campaign(t.campaign_id).unwrap().version();

    let outcome = service
        .remove_member(t.campaign_id, t.ann, Some(t.bob))
        .unwrap();
    assert_eq!(outcome.removed.display_name, "Ann");
    assert_eq!(outcome.reassigned_to.unwrap().display_name, "Bob");
    assert_eq!(outcome.reassigned.len(), 3);
    assert_eq!(outcome.version, version_before + 1);

    let state = service.get_campaign(t.campaign_id).unwrap();
    assert!(state.roster.get(t.ann).is_none());
    assert_eq!(state.assigned_count("Bob"), 3);
    assert!(service.list_orphans(t.campaign_id).unwrap().is_empty());

    let last = service.list_activity(t.campaign_id).unwrap().pop().unwrap();
    assert_eq!(last.action, ActivityAction::MemberRemoved);
}

#[test]
fn removal_without_target_is_blocked_while_prospects_remain() {
    let conn = setup();
    let service = CampaignService::new(SqliteCampaignRepository::try_new(&conn).unwrap());
    let t = team(&service);
    give(&service, t.campaign_id, "Ann", 2);
    let before = service.get_campaign(t.campaign_id).unwrap();

    let err = service.remove_member(t.campaign_id, t.ann, None).unwrap_err();
    match err {
        CampaignServiceError::Validation(ValidationError::MissingReassignmentTarget {
            member_id,
            prospect_count,
        }) => {
            assert_eq!(member_id, t.ann);
            assert_eq!(prospect_count, 2);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(service.get_campaign(t.campaign_id).unwrap(), before);
}

#[test]
fn idle_member_is_removed_immediately() {
    let conn = setup();
    let service = CampaignService::new(SqliteCampaignRepository::try_new(&conn).unwrap());
    let t = team(&service);

    let outcome = service
        .remove_member(t.campaign_id, t.bob, Some(t.ann))
        .unwrap();
    assert!(outcome.reassigned_to.is_none());
    assert!(outcome.reassigned.is_empty());
    assert_eq!(
        service.get_campaign(t.campaign_id).unwrap().roster.len(),
        2
    );
}

#[test]
fn owner_cannot_be_removed() {
    let conn = setup();
    let service = CampaignService::new(SqliteCampaignRepository::try_new(&conn).unwrap());
    let t = team(&service);

    assert!(matches!(
        service.remove_member(t.campaign_id, t.dave, Some(t.ann)),
        Err(CampaignServiceError::Validation(ValidationError::CannotRemoveOwner(id))) if id == t.dave
    ));
}

#[test]
fn removal_target_must_be_another_roster_member() {
    let conn = setup();
    let service = CampaignService::new(SqliteCampaignRepository::try_new(&conn).unwrap());
    let t = team(&service);
    give(&service, t.campaign_id, "Ann", 1);

    assert!(matches!(
        service.remove_member(t.campaign_id, t.ann, Some(t.ann)),
        Err(CampaignServiceError::Validation(
            ValidationError::SameSourceAndTarget(_)
        ))
    ));
    let stranger = uuid::Uuid::new_v4();
    assert!(matches!(
        service.remove_member(t.campaign_id, t.ann, Some(stranger)),
        Err(CampaignServiceError::Conflict(ConflictError::MemberNotOnRoster(id))) if id == stranger
    ));
}

#[test]
fn add_member_rejects_duplicates_second_owner_and_blank_names() {
    let conn = setup();
    let service = CampaignService::new(SqliteCampaignRepository::try_new(&conn).unwrap());
    let t = team(&service);

    let duplicate = NewMember {
        display_name: "  Ann ".to_string(),
        role: MemberRole::Viewer,
    };
    assert!(matches!(
        service.add_member(t.campaign_id, &duplicate),
        Err(CampaignServiceError::Conflict(ConflictError::MemberAlreadyOnRoster(name))) if name == "Ann"
    ));

    let second_owner = NewMember {
        display_name: "Eve".to_string(),
        role: MemberRole::Owner,
    };
    assert!(matches!(
        service.add_member(t.campaign_id, &second_owner),
        Err(CampaignServiceError::Validation(
            ValidationError::OwnerAlreadyAssigned
        ))
    ));

    let blank = NewMember {
        display_name: "   ".to_string(),
        role: MemberRole::Member,
    };
    assert!(matches!(
        service.add_member(t.campaign_id, &blank),
        Err(CampaignServiceError::Validation(ValidationError::BlankName))
    ));

    assert_eq!(service.get_campaign(t.campaign_id).unwrap().roster.len(), 3);
}

#[test]
fn viewer_can_receive_prospects() {
    let conn = setup();
    let service = CampaignService::new(SqliteCampaignRepository::try_new(&conn).unwrap());
    let t = team(&service);
    let viewer = service
        .add_member(
            t.campaign_id,
            &NewMember {
                display_name: "Vic".to_string(),
                role: MemberRole::Viewer,
            },
        )
        .unwrap();
    give(&service, t.campaign_id, "Ann", 1);

    let outcome = service
        .transfer_prospects(t.campaign_id, t.ann, viewer.member_id, 1)
        .unwrap();
    assert_eq!(outcome.moved.len(), 1);
}

#[test]
fn change_owner_swaps_roles_and_unblocks_removal() {
    let conn = setup();
    let service = CampaignService::new(SqliteCampaignRepository::try_new(&conn).unwrap());
    let t = team(&service);

    let version = service.change_owner(t.campaign_id, t.ann).unwrap();
    let state = service.get_campaign(t.campaign_id).unwrap();
    assert_eq!(state.version(), version);
    assert_eq!(state.roster.owner().unwrap().member_id, t.ann);
    assert_eq!(state.roster.get(t.dave).unwrap().role, MemberRole::Member);
    assert_eq!(state.roster.len(), 3);

    assert_eq!(service.change_owner(t.campaign_id, t.ann).unwrap(), version);

    service.remove_member(t.campaign_id, t.dave, None).unwrap();
    let last = service.list_activity(t.campaign_id).unwrap();
    assert!(last
        .iter()
        .any(|entry| entry.action == ActivityAction::OwnerChanged));
}

#[test]
fn workload_lists_every_roster_member() {
    let conn = setup();
    let service = CampaignService::new(SqliteCampaignRepository::try_new(&conn).unwrap());
    let t = team(&service);
    give(&service, t.campaign_id, "Bob", 2);
    give(&service, t.campaign_id, "Dave", 1);

    let workload = service.member_workload(t.campaign_id).unwrap();
    let counts: Vec<(MemberId, usize)> = workload
        .iter()
        .map(|entry| (entry.member_id, entry.prospect_count))
        .collect();
    assert_eq!(counts, vec![(t.dave, 1), (t.ann, 0), (t.bob, 2)]);
}
