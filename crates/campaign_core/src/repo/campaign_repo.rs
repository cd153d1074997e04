//! Campaign repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Load one campaign as a consistent `CampaignState` snapshot.
//! - Commit engine output (prospect mutations, roster changes, new
//!   prospects, activity entry) as a single transaction.
//!
//! # Invariants
//! - Every commit performs a compare-and-swap on `campaigns.version`; a stale
//!   `expected_version` aborts the whole commit.
//! - Assigned `target_week` values never exceed the campaign week count.
//! - The activity log is append-only.
//! - Prospects load in intake order: `sort_order ASC, uuid ASC`.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::engine::{ProspectMutation, RosterChange};
use crate::model::activity::{ActivityAction, ActivityEntry, NewActivity};
use crate::model::campaign::{Campaign, CampaignGoals, CampaignId, CampaignState};
use crate::model::member::{MemberId, MemberRole, Roster, TeamMember};
use crate::model::prospect::{
    Prospect, ProspectId, ProspectStatus, ProspectValidationError, Tier,
};
use crate::model::week::Week;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type RepoResult<T> = Result<T, RepoError>;

/// Errors from campaign persistence operations.
#[derive(Debug)]
pub enum RepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    CampaignNotFound(CampaignId),
    /// The campaign was committed by someone else since it was loaded.
    VersionConflict {
        campaign_id: CampaignId,
        expected: u64,
        actual: u64,
    },
    ProspectNotFound(ProspectId),
    MemberNotFound(MemberId),
    /// A target week would break the calendar bound.
    WeekOutOfRange { week: u32, week_count: u32 },
    Validation(ProspectValidationError),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted data cannot be converted to a valid model.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::CampaignNotFound(id) => write!(f, "campaign not found: {id}"),
            Self::VersionConflict {
                campaign_id,
                expected,
                actual,
            } => write!(
                f,
                "campaign {campaign_id} version conflict: expected {expected}, found {actual}"
            ),
            Self::ProspectNotFound(id) => write!(f, "prospect not found: {id}"),
            Self::MemberNotFound(id) => write!(f, "team member not found: {id}"),
            Self::WeekOutOfRange { week, week_count } => {
                write!(f, "target week {week} exceeds campaign week count {week_count}")
            }
            Self::Validation(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "campaign repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "campaign repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "campaign repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid campaign data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<ProspectValidationError> for RepoError {
    fn from(value: ProspectValidationError) -> Self {
        Self::Validation(value)
    }
}

/// One all-or-nothing write against a campaign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignCommit {
    pub campaign_id: CampaignId,
    /// Version of the snapshot the changes were computed from.
    pub expected_version: u64,
    /// Prospects appended after existing ones, in order.
    pub new_prospects: Vec<Prospect>,
    pub mutations: Vec<ProspectMutation>,
    /// Applied in order; demotions must precede promotions.
    pub roster_changes: Vec<RosterChange>,
    pub activity: NewActivity,
}

impl CampaignCommit {
    pub fn new(campaign_id: CampaignId, expected_version: u64, activity: NewActivity) -> Self {
        Self {
            campaign_id,
            expected_version,
            new_prospects: Vec::new(),
            mutations: Vec::new(),
            roster_changes: Vec::new(),
            activity,
        }
    }

    pub fn with_mutations(mut self, mutations: Vec<ProspectMutation>) -> Self {
        self.mutations = mutations;
        self
    }

    pub fn with_roster_changes(mut self, changes: Vec<RosterChange>) -> Self {
        self.roster_changes = changes;
        self
    }

    pub fn with_new_prospects(mut self, prospects: Vec<Prospect>) -> Self {
        self.new_prospects = prospects;
        self
    }
}

/// Repository interface for campaign aggregates.
pub trait CampaignRepository {
    /// Inserts a campaign at version 0 with its owner and week calendar.
    fn create_campaign(
        &self,
        campaign: &Campaign,
        owner: &TeamMember,
        weeks: &[Week],
    ) -> RepoResult<()>;
    /// Loads one campaign snapshot.
    fn load_campaign(&self, campaign_id: CampaignId) -> RepoResult<Option<CampaignState>>;
    /// Applies one commit and returns the new campaign version.
    fn commit(&self, commit: &CampaignCommit) -> RepoResult<u64>;
    /// Lists activity entries, oldest first.
    fn list_activity(&self, campaign_id: CampaignId) -> RepoResult<Vec<ActivityEntry>>;
}

/// SQLite-backed campaign repository.
pub struct SqliteCampaignRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCampaignRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_campaign_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl CampaignRepository for SqliteCampaignRepository<'_> {
    fn create_campaign(
        &self,
        campaign: &Campaign,
        owner: &TeamMember,
        weeks: &[Week],
    ) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let campaign_uuid = campaign.id.to_string();

        tx.execute(
            "INSERT INTO campaigns (
                uuid,
                name,
                start_date,
                end_date,
                goal_touchpoints,
                goal_opportunities,
                goal_estimates,
                goal_awards,
                version
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
            params![
                campaign_uuid.as_str(),
                campaign.name.as_str(),
                campaign.start_date,
                campaign.end_date,
                campaign.goals.touchpoints,
                campaign.goals.opportunities,
                campaign.goals.estimates,
                campaign.goals.awards,
                campaign.version as i64,
            ],
        )?;

        insert_member(&tx, &campaign_uuid, owner)?;

        for week in weeks {
            tx.execute(
                "INSERT INTO campaign_weeks (campaign_uuid, week_number, start_date, end_date, label)
                 VALUES (?1, ?2, ?3, ?4, ?5);",
                params![
                    campaign_uuid.as_str(),
                    week.week_number,
                    week.start_date,
                    week.end_date,
                    week.label.as_str(),
                ],
            )?;
        }

        insert_activity(
            &tx,
            &campaign_uuid,
            &NewActivity::new(
                ActivityAction::CampaignCreated,
                format!("campaign created with {} week(s)", weeks.len()),
            ),
            campaign.version,
        )?;

        tx.commit()?;
        Ok(())
    }

    fn load_campaign(&self, campaign_id: CampaignId) -> RepoResult<Option<CampaignState>> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Deferred)?;
        let campaign_uuid = campaign_id.to_string();

        let campaign = tx
            .query_row(
                "SELECT
                    uuid,
                    name,
                    start_date,
                    end_date,
                    goal_touchpoints,
                    goal_opportunities,
                    goal_estimates,
                    goal_awards,
                    version
                 FROM campaigns
                 WHERE uuid = ?1;",
                [campaign_uuid.as_str()],
                |row| Ok(parse_campaign_row(row)),
            )
            .optional()?
            .transpose()?;
        let Some(campaign) = campaign else {
            return Ok(None);
        };

        let roster = load_roster(&tx, &campaign_uuid)?;
        let prospects = load_prospects(&tx, &campaign_uuid)?;
        let weeks = load_weeks(&tx, &campaign_uuid)?;
        tx.commit()?;

        Ok(Some(CampaignState {
            campaign,
            roster,
            prospects,
            weeks,
        }))
    }

    fn commit(&self, commit: &CampaignCommit) -> RepoResult<u64> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let campaign_uuid = commit.campaign_id.to_string();
        let new_version = bump_version(&tx, commit.campaign_id, commit.expected_version)?;

        let mut next_order = next_prospect_order(&tx, &campaign_uuid)?;
        for prospect in &commit.new_prospects {
            insert_prospect(&tx, &campaign_uuid, prospect, next_order)?;
            next_order += 1;
        }

        let week_count = week_count(&tx, &campaign_uuid)?;
        for mutation in &commit.mutations {
            apply_mutation(&tx, &campaign_uuid, mutation, week_count)?;
        }

        for change in &commit.roster_changes {
            apply_roster_change(&tx, &campaign_uuid, change)?;
        }

        insert_activity(&tx, &campaign_uuid, &commit.activity, new_version)?;
        tx.commit()?;
        Ok(new_version)
    }

    fn list_activity(&self, campaign_id: CampaignId) -> RepoResult<Vec<ActivityEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, campaign_uuid, action, detail, version, created_at
             FROM campaign_activity_log
             WHERE campaign_uuid = ?1
             ORDER BY id ASC;",
        )?;
        let mut rows = stmt.query([campaign_id.to_string()])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(parse_activity_row(row)?);
        }
        Ok(entries)
    }
}

fn bump_version(tx: &Transaction<'_>, campaign_id: CampaignId, expected: u64) -> RepoResult<u64> {
    let campaign_uuid = campaign_id.to_string();
    let changed = tx.execute(
        "UPDATE campaigns
         SET version = version + 1,
             updated_at = (strftime('%s', 'now') * 1000)
         WHERE uuid = ?1
           AND version = ?2;",
        params![campaign_uuid.as_str(), expected as i64],
    )?;
    if changed == 1 {
        return Ok(expected + 1);
    }

    let actual: Option<i64> = tx
        .query_row(
            "SELECT version FROM campaigns WHERE uuid = ?1;",
            [campaign_uuid.as_str()],
            |row| row.get(0),
        )
        .optional()?;
    match actual {
        None => Err(RepoError::CampaignNotFound(campaign_id)),
        Some(actual) => Err(RepoError::VersionConflict {
            campaign_id,
            expected,
            actual: actual as u64,
        }),
    }
}

fn apply_mutation(
    tx: &Transaction<'_>,
    campaign_uuid: &str,
    mutation: &ProspectMutation,
    week_count: u32,
) -> RepoResult<()> {
    let changed = match mutation {
        ProspectMutation::SetTargetWeek { prospect_id, week } => {
            if *week == 0 || *week > week_count {
                return Err(RepoError::WeekOutOfRange {
                    week: *week,
                    week_count,
                });
            }
            tx.execute(
                "UPDATE campaign_companies
                 SET target_week = ?3,
                     updated_at = (strftime('%s', 'now') * 1000)
                 WHERE uuid = ?1
                   AND campaign_uuid = ?2;",
                params![prospect_id.to_string(), campaign_uuid, week],
            )?
        }
        ProspectMutation::Reassign {
            prospect_id,
            assigned_to,
        } => tx.execute(
            "UPDATE campaign_companies
             SET assigned_to = ?3,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1
               AND campaign_uuid = ?2;",
            params![prospect_id.to_string(), campaign_uuid, assigned_to.as_str()],
        )?,
    };

    if changed == 0 {
        return Err(RepoError::ProspectNotFound(mutation.prospect_id()));
    }
    Ok(())
}

fn apply_roster_change(
    tx: &Transaction<'_>,
    campaign_uuid: &str,
    change: &RosterChange,
) -> RepoResult<()> {
    let (member_id, changed) = match change {
        RosterChange::Add(member) => {
            insert_member(tx, campaign_uuid, member)?;
            return Ok(());
        }
        RosterChange::Remove(member_id) => (
            *member_id,
            tx.execute(
                "DELETE FROM campaign_team_members
                 WHERE campaign_uuid = ?1
                   AND member_uuid = ?2;",
                params![campaign_uuid, member_id.to_string()],
            )?,
        ),
        RosterChange::SetRole { member_id, role } => (
            *member_id,
            tx.execute(
                "UPDATE campaign_team_members
                 SET role = ?3
                 WHERE campaign_uuid = ?1
                   AND member_uuid = ?2;",
                params![campaign_uuid, member_id.to_string(), role.as_str()],
            )?,
        ),
    };

    if changed == 0 {
        return Err(RepoError::MemberNotFound(member_id));
    }
    Ok(())
}

fn insert_member(tx: &Transaction<'_>, campaign_uuid: &str, member: &TeamMember) -> RepoResult<()> {
    let sort_order: i64 = tx.query_row(
        "SELECT COALESCE(MAX(sort_order) + 1, 0)
         FROM campaign_team_members
         WHERE campaign_uuid = ?1;",
        [campaign_uuid],
        |row| row.get(0),
    )?;
    tx.execute(
        "INSERT INTO campaign_team_members (campaign_uuid, member_uuid, display_name, role, sort_order)
         VALUES (?1, ?2, ?3, ?4, ?5);",
        params![
            campaign_uuid,
            member.member_id.to_string(),
            member.display_name.as_str(),
            member.role.as_str(),
            sort_order,
        ],
    )?;
    Ok(())
}

fn insert_prospect(
    tx: &Transaction<'_>,
    campaign_uuid: &str,
    prospect: &Prospect,
    sort_order: i64,
) -> RepoResult<()> {
    prospect.validate()?;
    tx.execute(
        "INSERT INTO campaign_companies (
            uuid,
            campaign_uuid,
            company_name,
            status,
            next_action,
            tier,
            score,
            assigned_to,
            target_week,
            sort_order
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
        params![
            prospect.id.to_string(),
            campaign_uuid,
            prospect.company_name.as_str(),
            prospect.status.as_str(),
            prospect.next_action.as_deref(),
            prospect.tier.as_str(),
            prospect.score,
            prospect.assigned_to.as_deref(),
            prospect.target_week,
            sort_order,
        ],
    )?;
    Ok(())
}

fn insert_activity(
    tx: &Transaction<'_>,
    campaign_uuid: &str,
    activity: &NewActivity,
    version: u64,
) -> RepoResult<()> {
    tx.execute(
        "INSERT INTO campaign_activity_log (campaign_uuid, action, detail, version)
         VALUES (?1, ?2, ?3, ?4);",
        params![
            campaign_uuid,
            activity.action.as_str(),
            activity.detail.as_str(),
            version as i64,
        ],
    )?;
    Ok(())
}

fn next_prospect_order(tx: &Transaction<'_>, campaign_uuid: &str) -> RepoResult<i64> {
    let next: i64 = tx.query_row(
        "SELECT COALESCE(MAX(sort_order) + 1, 0)
         FROM campaign_companies
         WHERE campaign_uuid = ?1;",
        [campaign_uuid],
        |row| row.get(0),
    )?;
    Ok(next)
}

fn week_count(conn: &Connection, campaign_uuid: &str) -> RepoResult<u32> {
    let count: u32 = conn.query_row(
        "SELECT COUNT(*) FROM campaign_weeks WHERE campaign_uuid = ?1;",
        [campaign_uuid],
        |row| row.get(0),
    )?;
    Ok(count)
}

fn load_roster(conn: &Connection, campaign_uuid: &str) -> RepoResult<Roster> {
    let mut stmt = conn.prepare(
        "SELECT member_uuid, display_name, role
         FROM campaign_team_members
         WHERE campaign_uuid = ?1
         ORDER BY sort_order ASC, member_uuid ASC;",
    )?;
    let mut rows = stmt.query([campaign_uuid])?;
    let mut members = Vec::new();
    while let Some(row) = rows.next()? {
        let member_text: String = row.get("member_uuid")?;
        let role_text: String = row.get("role")?;
        let role = MemberRole::parse(&role_text).ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid role `{role_text}` in campaign_team_members.role"
            ))
        })?;
        members.push(TeamMember {
            member_id: parse_uuid(&member_text, "campaign_team_members.member_uuid")?,
            display_name: row.get("display_name")?,
            role,
        });
    }
    Ok(Roster::new(members))
}

fn load_prospects(conn: &Connection, campaign_uuid: &str) -> RepoResult<Vec<Prospect>> {
    let mut stmt = conn.prepare(
        "SELECT
            uuid,
            company_name,
            status,
            next_action,
            tier,
            score,
            assigned_to,
            target_week
         FROM campaign_companies
         WHERE campaign_uuid = ?1
         ORDER BY sort_order ASC, uuid ASC;",
    )?;
    let mut rows = stmt.query([campaign_uuid])?;
    let mut prospects = Vec::new();
    while let Some(row) = rows.next()? {
        prospects.push(parse_prospect_row(row)?);
    }
    Ok(prospects)
}

fn load_weeks(conn: &Connection, campaign_uuid: &str) -> RepoResult<Vec<Week>> {
    let mut stmt = conn.prepare(
        "SELECT week_number, start_date, end_date, label
         FROM campaign_weeks
         WHERE campaign_uuid = ?1
         ORDER BY week_number ASC;",
    )?;
    let mut rows = stmt.query([campaign_uuid])?;
    let mut weeks = Vec::new();
    while let Some(row) = rows.next()? {
        weeks.push(Week {
            week_number: row.get("week_number")?,
            start_date: row.get("start_date")?,
            end_date: row.get("end_date")?,
            label: row.get("label")?,
        });
    }
    Ok(weeks)
}

fn parse_campaign_row(row: &Row<'_>) -> RepoResult<Campaign> {
    let uuid_text: String = row.get("uuid")?;
    let version: i64 = row.get("version")?;
    if version < 0 {
        return Err(RepoError::InvalidData(format!(
            "invalid version `{version}` in campaigns.version"
        )));
    }

    Ok(Campaign {
        id: parse_uuid(&uuid_text, "campaigns.uuid")?,
        name: row.get("name")?,
        start_date: row.get("start_date")?,
        end_date: row.get("end_date")?,
        goals: CampaignGoals {
            touchpoints: row.get("goal_touchpoints")?,
            opportunities: row.get("goal_opportunities")?,
            estimates: row.get("goal_estimates")?,
            awards: row.get("goal_awards")?,
        },
        version: version as u64,
    })
}

fn parse_prospect_row(row: &Row<'_>) -> RepoResult<Prospect> {
    let uuid_text: String = row.get("uuid")?;

    let tier_text: String = row.get("tier")?;
    let tier = Tier::parse(&tier_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid tier `{tier_text}` in campaign_companies.tier"))
    })?;

    let status_text: String = row.get("status")?;
    let status = ProspectStatus::parse(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid status `{status_text}` in campaign_companies.status"
        ))
    })?;

    let score_value: i64 = row.get("score")?;
    let score = u8::try_from(score_value).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid score `{score_value}` in campaign_companies.score"
        ))
    })?;

    let target_week = match row.get::<_, Option<i64>>("target_week")? {
        Some(value) => Some(u32::try_from(value).map_err(|_| {
            RepoError::InvalidData(format!(
                "invalid target week `{value}` in campaign_companies.target_week"
            ))
        })?),
        None => None,
    };

    let prospect = Prospect {
        id: parse_uuid(&uuid_text, "campaign_companies.uuid")?,
        company_name: row.get("company_name")?,
        tier,
        score,
        assigned_to: row.get("assigned_to")?,
        target_week,
        status,
        next_action: row.get("next_action")?,
    };
    prospect.validate()?;
    Ok(prospect)
}

fn parse_activity_row(row: &Row<'_>) -> RepoResult<ActivityEntry> {
    let campaign_text: String = row.get("campaign_uuid")?;
    let action_text: String = row.get("action")?;
    let action = ActivityAction::parse(&action_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid action `{action_text}` in campaign_activity_log.action"
        ))
    })?;
    let version: i64 = row.get("version")?;

    Ok(ActivityEntry {
        id: row.get("id")?,
        campaign_id: parse_uuid(&campaign_text, "campaign_activity_log.campaign_uuid")?,
        action,
        detail: row.get("detail")?,
        version: version.max(0) as u64,
        created_at: row.get("created_at")?,
    })
}

fn parse_uuid(value: &str, column: &'static str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

const REQUIRED_COLUMNS: &[(&str, &[&str])] = &[
    (
        "campaigns",
        &["uuid", "name", "start_date", "end_date", "version"],
    ),
    (
        "campaign_team_members",
        &["campaign_uuid", "member_uuid", "display_name", "role", "sort_order"],
    ),
    (
        "campaign_weeks",
        &["campaign_uuid", "week_number", "start_date", "end_date", "label"],
    ),
    (
        "campaign_companies",
        &[
            "uuid",
            "campaign_uuid",
            "status",
            "next_action",
            "tier",
            "score",
            "assigned_to",
            "target_week",
            "sort_order",
        ],
    ),
    (
        "campaign_activity_log",
        &["id", "campaign_uuid", "action", "detail", "version", "created_at"],
    ),
];

fn ensure_campaign_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for &(table, columns) in REQUIRED_COLUMNS {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
        for &column in columns {
            if !table_has_column(conn, table, column)? {
                return Err(RepoError::MissingRequiredColumn { table, column });
            }
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
