//! Persists computed standings team by team.

use super::models::{ApplyReport, EventId, TeamStanding, TeamWriteFailure};
use crate::db::repository::ParticipationRepository;
use log::{info, warn};

/// Write each standing to its participation row
///
/// A failed team does not stop the batch; it is listed in
/// [`ApplyReport::failed`] and every other team is still written. Writing the
/// same standings twice leaves the stored rows unchanged.
pub async fn apply_standings<R>(
    repo: &R,
    event_id: EventId,
    standings: &[TeamStanding],
) -> ApplyReport
where
    R: ParticipationRepository + ?Sized,
{
    let mut report = ApplyReport::default();

    for standing in standings {
        if standing.event_id != event_id {
            report.failed.push(TeamWriteFailure {
                team_id: standing.team_id,
                reason: format!(
                    "standing belongs to event {}, not {}",
                    standing.event_id, event_id
                ),
            });
            continue;
        }

        match repo.write_standing(standing).await {
            Ok(Some(row)) => report.applied.push(row),
            Ok(None) => report.failed.push(TeamWriteFailure {
                team_id: standing.team_id,
                reason: "participation not found".to_string(),
            }),
            Err(e) => report.failed.push(TeamWriteFailure {
                team_id: standing.team_id,
                reason: e.to_string(),
            }),
        }
    }

    for failure in &report.failed {
        warn!(
            "Standings write failed for team {} in event {}: {}",
            failure.team_id, event_id, failure.reason
        );
    }
    info!(
        "Applied standings for event {}: {} written, {} failed",
        event_id,
        report.applied.len(),
        report.failed.len()
    );

    report
}
