//! Team records, the denormalized per-user team summary, and roster
//! assignment errors.

use crate::models::event::EventId;
use crate::models::game::{GameType, MatchId, UnknownGameTypeError};
use crate::models::user::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a team (store document id).
pub type TeamId = String;

/// A team built from an event's participants. Event name and game type are
/// denormalized from the event; `match_date_time` and `match_id` stay absent
/// until the team is scheduled into a match.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub event_id: EventId,
    pub event_name: String,
    pub game_type: GameType,
    pub coach_id: UserId,
    pub participants: Vec<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_date_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_id: Option<MatchId>,
    pub created_at: DateTime<Utc>,
}

/// Denormalized team membership written onto each member's user document,
/// so profile views render without fetching the team.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamSummary {
    pub team_id: TeamId,
    pub team_name: String,
    pub event_id: EventId,
    pub event_name: String,
    pub game_type: GameType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_date_time: Option<DateTime<Utc>>,
    pub coach_id: UserId,
}

impl TeamSummary {
    /// Summary for a freshly created (not yet scheduled) team.
    pub fn of(team: &Team) -> Self {
        Self {
            team_id: team.id.clone(),
            team_name: team.name.clone(),
            event_id: team.event_id.clone(),
            event_name: team.event_name.clone(),
            game_type: team.game_type.clone(),
            match_date_time: team.match_date_time,
            coach_id: team.coach_id.clone(),
        }
    }
}

/// Errors raised when assigning a participant to a team roster.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AssignmentError {
    /// The participant is already on a team for this event, or is not an
    /// event participant at all.
    AlreadyAssigned(UserId),
    /// Adding another participant would exceed the game type's roster size.
    CapacityExceeded { game_type: GameType, required: usize },
    /// The event's game type has no roster-size rule.
    UnknownGameType(UnknownGameTypeError),
}

impl std::fmt::Display for AssignmentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssignmentError::AlreadyAssigned(id) => write!(
                f,
                "Participant {} is already on a team for this event or is not part of the event",
                id
            ),
            AssignmentError::CapacityExceeded { game_type, required } => {
                write!(f, "A {} team can only have {} player(s)", game_type, required)
            }
            AssignmentError::UnknownGameType(e) => e.fmt(f),
        }
    }
}

impl From<UnknownGameTypeError> for AssignmentError {
    fn from(e: UnknownGameTypeError) -> Self {
        AssignmentError::UnknownGameType(e)
    }
}
