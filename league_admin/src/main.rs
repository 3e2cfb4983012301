//! Operator tool for league standings maintenance.
//!
//! Runs one standings operation against the league database and prints the
//! outcome as JSON on stdout.

mod cli;
mod config;
mod logging;

use std::sync::Arc;

use anyhow::Error;
use cli::Command;
use config::AdminConfig;
use league_standings::{
    ApplyReport, Database, PgStandingsStore, StandingsManager, StandingsResult,
    WithdrawalOutcome,
    standings::{EventParticipation, Match},
};
use pico_args::Arguments;
use serde::Serialize;

const HELP: &str = "\
Maintain league event standings

USAGE:
  league_admin [OPTIONS] <COMMAND> [COMMAND OPTIONS]

COMMANDS:
  recompute      --event ID                   Recompute and store standings
  withdraw       --event ID --team ID         Withdraw a team, voiding its matches
                 [--recompute]                  and optionally recompute afterwards
  repair-withdrawal
                 --event ID --team ID         Void matches a withdrawn team still has open
                                                (fixes inconsistent snapshot errors)
  standings      --event ID                   Print stored standings, best first
  enroll         --event ID --team ID         Enroll a team in an event
  schedule       --event ID --pair A:B ...    Create matches for new pairings
  record-result  --match ID --date YYYY-MM-DD --team1-sets N --team2-sets N
                 [--winner ID] [--score TEXT] [--unfinished]

OPTIONS:
  --db-url     URL         Database connection string  [default: env DATABASE_URL]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  DATABASE_URL             PostgreSQL connection string
  DB_MAX_CONNECTIONS       Maximum pool size
  SCORING_MID_BONUS        Mid bonus value (default: 2)
  RUST_LOG                 Log filter (default: info,sqlx=warn)

EXIT STATUS:
  0 success, 1 rejected request, 2 storage failure (safe to retry)
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = match cli::parse(pargs) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {e}\n\n{HELP}");
            std::process::exit(1);
        }
    };

    logging::init();

    let config = AdminConfig::from_env(args.database_url);
    config.validate()?;

    let db = Database::new(&config.database)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect to database: {}", e))?;
    tracing::debug!("Database connected");

    let manager = StandingsManager::with_rules(Arc::new(db.standings_store()), config.scoring);

    let outcome = run(&manager, args.command).await;
    db.close().await;

    match outcome {
        Ok(output) => {
            println!("{}", serde_json::to_string_pretty(&output)?);
            if output.has_failed_writes() {
                std::process::exit(2);
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("Error: {}", e.client_message());
            std::process::exit(if e.is_persistence_failure() { 2 } else { 1 });
        }
    }
}

/// Command result printed on stdout
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Output {
    Recompute(ApplyReport),
    Withdraw {
        withdrawal: WithdrawalOutcome,
        #[serde(skip_serializing_if = "Option::is_none")]
        recompute: Option<ApplyReport>,
    },
    Repair(WithdrawalOutcome),
    Standings(Vec<EventParticipation>),
    Enroll(EventParticipation),
    Schedule(Vec<Match>),
    RecordResult(Match),
}

impl Output {
    /// Whether a recompute left some teams unwritten
    fn has_failed_writes(&self) -> bool {
        match self {
            Output::Recompute(report)
            | Output::Withdraw {
                recompute: Some(report),
                ..
            } => !report.is_complete(),
            _ => false,
        }
    }
}

/// Execute one command
async fn run(
    manager: &StandingsManager<PgStandingsStore>,
    command: Command,
) -> StandingsResult<Output> {
    let output = match command {
        Command::Recompute { event_id } => {
            let report = manager.recompute(event_id).await?;
            logging::log_recompute(event_id, report.applied.len(), &report.failed_team_ids());
            Output::Recompute(report)
        }
        Command::Withdraw {
            event_id,
            team_id,
            recompute,
        } => {
            let withdrawal = manager.withdraw(event_id, team_id).await?;
            let recompute = if recompute {
                let report = manager.recompute(event_id).await?;
                logging::log_recompute(event_id, report.applied.len(), &report.failed_team_ids());
                Some(report)
            } else {
                None
            };
            Output::Withdraw {
                withdrawal,
                recompute,
            }
        }
        Command::RepairWithdrawal { event_id, team_id } => {
            Output::Repair(manager.repair_withdrawal(event_id, team_id).await?)
        }
        Command::Standings { event_id } => Output::Standings(manager.standings_view(event_id).await?),
        Command::Enroll { event_id, team_id } => {
            Output::Enroll(manager.enroll_team(event_id, team_id).await?)
        }
        Command::Schedule { event_id, pairs } => {
            Output::Schedule(manager.schedule_matches(event_id, &pairs).await?)
        }
        Command::RecordResult { match_id, result } => {
            Output::RecordResult(manager.record_result(match_id, &result).await?)
        }
    };

    Ok(output)
}
