//! Event records and the errors raised when joining or leaving one.

use crate::models::game::GameType;
use crate::models::user::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for an event (store document id).
pub type EventId = String;

/// A club event owned by one coach. `participants` holds joiners in join
/// order; uniqueness comes from the store's array-union write.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: EventId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub location: String,
    pub game_type: GameType,
    pub event_date: DateTime<Utc>,
    pub max_participants: u32,
    pub coach_id: UserId,
    #[serde(default)]
    pub participants: Vec<UserId>,
    pub created_at: DateTime<Utc>,
}

impl Event {
    pub fn is_full(&self) -> bool {
        self.participants.len() >= self.max_participants as usize
    }
}

/// Errors raised when a user tries to join or leave an event.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum JoinError {
    /// Only players join events.
    NotAPlayer,
    /// The player did not register for this event's game type.
    GameNotSelected(GameType),
    /// The player already joined this event.
    AlreadyJoined,
    /// The event reached its participant cap.
    EventFull { max_participants: u32 },
    /// The user is not a participant of this event (leave only).
    NotAParticipant,
}

impl std::fmt::Display for JoinError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JoinError::NotAPlayer => write!(f, "Only players can join events"),
            JoinError::GameNotSelected(game) => {
                write!(f, "You are not registered for {}", game)
            }
            JoinError::AlreadyJoined => write!(f, "You have already joined this event"),
            JoinError::EventFull { max_participants } => {
                write!(f, "This event is full ({} participants)", max_participants)
            }
            JoinError::NotAParticipant => {
                write!(f, "You are not a participant of this event")
            }
        }
    }
}
