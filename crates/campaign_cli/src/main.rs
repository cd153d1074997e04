//! Campaign CLI entry point.
//!
//! # Responsibility
//! - Wire config, logging and storage for the campaign core.
//! - Run a deterministic demo: seed, plan, rebalance and print the result.

mod seed;

use campaign_core::{
    init_logging, open_db, open_db_in_memory, CampaignId, CampaignRepository, CampaignService,
    CoreConfig, SqliteCampaignRepository,
};
use clap::{Parser, Subcommand};
use log::info;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "campaign_cli", version)]
#[command(about = "Campaign prospect scheduling and team allocation")]
struct Cli {
    /// JSON config file; `CAMPAIGN_*` environment variables override it
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print core health and version
    Ping,
    /// Seed a demo campaign, rebalance it and print the weekly plan (default)
    Demo,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    if let Some(Command::Ping) = cli.command {
        println!("campaign_core ping={}", campaign_core::ping());
        println!("campaign_core version={}", campaign_core::core_version());
        return Ok(());
    }

    let config = CoreConfig::load(cli.config.as_deref())?;
    init_logging(&config)?;

    let conn = match &config.db_path {
        Some(path) => open_db(path)?,
        None => open_db_in_memory()?,
    };
    let service = CampaignService::new(SqliteCampaignRepository::try_new(&conn)?);

    let campaign_id = seed::seed_demo_campaign(&service)?;
    info!("event=demo_seeded module=cli status=ok campaign={campaign_id}");
    run_demo(&service, campaign_id)
}

fn run_demo<R: CampaignRepository>(
    service: &CampaignService<R>,
    campaign_id: CampaignId,
) -> Result<(), Box<dyn Error>> {
    let orphans = service.list_orphans(campaign_id)?;
    if !orphans.is_empty() {
        let state = service.get_campaign(campaign_id)?;
        if let Some(owner) = state.roster.owner() {
            let resolution = service.resolve_orphans(campaign_id, owner.member_id)?;
            println!(
                "resolved {} orphan(s) from [{}] to {}",
                resolution.reassigned.len(),
                orphans.stale_names.join(", "),
                owner.display_name
            );
        }
    }

    let state = service.get_campaign(campaign_id)?;
    let busiest = state.roster.owner().map(|owner| owner.member_id);
    let idle = state
        .roster
        .find_by_name("Lee Park")
        .map(|member| member.member_id);
    if let (Some(from), Some(to)) = (busiest, idle) {
        let outcome = service.transfer_prospects(campaign_id, from, to, 2)?;
        println!("transferred {} prospect(s) to Lee Park", outcome.moved.len());
    }

    let proposal = service.request_weekly_plan(campaign_id)?;
    println!(
        "weekly plan over {} week(s): {} change(s), {} overwritten",
        proposal.week_count(),
        proposal.changed_count(),
        proposal.overwritten_count()
    );
    let committed = service.confirm_weekly_plan(&proposal)?;
    println!("plan committed at version {}", committed.version);

    let state = service.get_campaign(campaign_id)?;
    for week in &state.weeks {
        println!("{}", week.label);
        for prospect in state
            .prospects
            .iter()
            .filter(|prospect| prospect.target_week == Some(week.week_number))
        {
            println!(
                "  [{}:{:>3}] {:<24} {}",
                prospect.tier.as_str(),
                prospect.score,
                prospect.company_name,
                prospect.assigned_to.as_deref().unwrap_or("Unassigned")
            );
        }
    }

    println!("workload:");
    for workload in service.member_workload(campaign_id)? {
        println!("  {:<12} {}", workload.display_name, workload.prospect_count);
    }
    println!("activity entries: {}", service.list_activity(campaign_id)?.len());
    Ok(())
}
