//! Command line parsing.

use chrono::NaiveDate;
use league_standings::standings::{EventId, MatchId, MatchResult, TeamId};
use pico_args::Arguments;

/// Operation requested on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Recompute {
        event_id: EventId,
    },
    Withdraw {
        event_id: EventId,
        team_id: TeamId,
        recompute: bool,
    },
    RepairWithdrawal {
        event_id: EventId,
        team_id: TeamId,
    },
    Standings {
        event_id: EventId,
    },
    Enroll {
        event_id: EventId,
        team_id: TeamId,
    },
    Schedule {
        event_id: EventId,
        pairs: Vec<(TeamId, TeamId)>,
    },
    RecordResult {
        match_id: MatchId,
        result: MatchResult,
    },
}

/// Parsed arguments
#[derive(Debug)]
pub struct Args {
    pub database_url: Option<String>,
    pub command: Command,
}

/// Parse arguments after the help flag has been handled
pub fn parse(mut pargs: Arguments) -> Result<Args, pico_args::Error> {
    let database_url = pargs.opt_value_from_str("--db-url")?;

    let subcommand = pargs
        .subcommand()?
        .ok_or(pico_args::Error::MissingArgument)?;

    let command = match subcommand.as_str() {
        "recompute" => Command::Recompute {
            event_id: pargs.value_from_str("--event")?,
        },
        "withdraw" => Command::Withdraw {
            recompute: pargs.contains("--recompute"),
            event_id: pargs.value_from_str("--event")?,
            team_id: pargs.value_from_str("--team")?,
        },
        "repair-withdrawal" => Command::RepairWithdrawal {
            event_id: pargs.value_from_str("--event")?,
            team_id: pargs.value_from_str("--team")?,
        },
        "standings" => Command::Standings {
            event_id: pargs.value_from_str("--event")?,
        },
        "enroll" => Command::Enroll {
            event_id: pargs.value_from_str("--event")?,
            team_id: pargs.value_from_str("--team")?,
        },
        "schedule" => {
            let event_id = pargs.value_from_str("--event")?;
            let pairs = pargs.values_from_fn("--pair", parse_pair)?;
            if pairs.is_empty() {
                return Err(pico_args::Error::MissingOption(
                    pico_args::Keys::from("--pair"),
                ));
            }
            Command::Schedule { event_id, pairs }
        }
        "record-result" => {
            let finished = !pargs.contains("--unfinished");
            let match_id = pargs.value_from_str("--match")?;
            let match_date: NaiveDate = pargs.value_from_str("--date")?;
            let team1_sets = pargs.value_from_str("--team1-sets")?;
            let team2_sets = pargs.value_from_str("--team2-sets")?;
            let winner_id = pargs.opt_value_from_str("--winner")?;
            let winner_score = pargs.opt_value_from_str("--score")?;
            Command::RecordResult {
                match_id,
                result: MatchResult {
                    match_date,
                    finished,
                    winner_id,
                    team1_sets,
                    team2_sets,
                    winner_score,
                },
            }
        }
        other => {
            return Err(pico_args::Error::Utf8ArgumentParsingFailed {
                value: other.to_string(),
                cause: "unknown command".to_string(),
            });
        }
    };

    let remaining = pargs.finish();
    if !remaining.is_empty() {
        return Err(pico_args::Error::Utf8ArgumentParsingFailed {
            value: remaining
                .iter()
                .map(|a| a.to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join(" "),
            cause: "unexpected arguments".to_string(),
        });
    }

    Ok(Args {
        database_url,
        command,
    })
}

/// Parse a `TEAM1:TEAM2` pairing
fn parse_pair(s: &str) -> Result<(TeamId, TeamId), String> {
    let (a, b) = s
        .split_once(':')
        .ok_or_else(|| format!("expected TEAM1:TEAM2, got '{s}'"))?;
    let a = a.trim().parse().map_err(|e| format!("bad team id '{a}': {e}"))?;
    let b = b.trim().parse().map_err(|e| format!("bad team id '{b}': {e}"))?;
    Ok((a, b))
}
