//! Per-sport roster sizes and the validation gates for committing a team
//! to a match and announcing its result.

use crate::models::{GameMatch, GameType, Team, UnknownGameTypeError, ValidationError};
use chrono::{DateTime, Utc};

/// Required roster size per game type. Unknown types are an error, never a
/// default: a misspelled sport on an event must not quietly become a
/// 2-player rule.
pub fn required_roster_size(game_type: &GameType) -> Result<usize, UnknownGameTypeError> {
    match game_type {
        GameType::Football => Ok(11),
        GameType::Cricket => Ok(11),
        GameType::Basketball => Ok(5),
        GameType::Volleyball => Ok(6),
        GameType::Tennis => Ok(2),
        GameType::Badminton => Ok(2),
        GameType::TableTennis => Ok(2),
        GameType::Swimming => Ok(1),
        GameType::Unknown(name) => Err(UnknownGameTypeError(name.clone())),
    }
}

/// A team may enter a match only with a complete roster (exactly the
/// required size; size 1 means individual participation).
pub fn validate_team_for_commit(team: &Team) -> Result<(), ValidationError> {
    let required = required_roster_size(&team.game_type)?;
    let actual = team.participants.len();
    if actual != required {
        return Err(ValidationError::IncompleteRoster {
            game_type: team.game_type.clone(),
            required,
            actual,
        });
    }
    Ok(())
}

/// Whether two teams can be paired into a match: distinct teams of the same
/// event, both fully rostered, no participant on both sides.
pub fn validate_pairing(team1: &Team, team2: &Team) -> Result<(), ValidationError> {
    if team1.id == team2.id {
        return Err(ValidationError::SameTeam);
    }
    if team1.event_id != team2.event_id {
        return Err(ValidationError::CrossEvent);
    }
    validate_team_for_commit(team1)?;
    validate_team_for_commit(team2)?;
    if let Some(shared) = team1
        .participants
        .iter()
        .find(|id| team2.participants.contains(id))
    {
        return Err(ValidationError::DuplicateRoster(shared.clone()));
    }
    Ok(())
}

/// Gate for announcing a result: none announced yet, and the scheduled
/// time has been reached (a result cannot predate the match).
pub fn validate_announce(game_match: &GameMatch, now: DateTime<Utc>) -> Result<(), ValidationError> {
    if game_match.result.is_some() {
        return Err(ValidationError::AlreadyAnnounced);
    }
    if now < game_match.match_date_time {
        return Err(ValidationError::MatchNotYetPlayable {
            scheduled_for: game_match.match_date_time,
        });
    }
    Ok(())
}
