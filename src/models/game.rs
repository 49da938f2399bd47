//! Match records, game types, and the validation errors raised when
//! building or resolving a match.

use crate::models::event::EventId;
use crate::models::team::TeamId;
use crate::models::user::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a match (store document id).
pub type MatchId = String;

/// Sports offered by the club. Stored documents carry the display name
/// (`"Table Tennis"` includes the space), so (de)serialization goes through
/// the string form. Names outside the fixed set decode as `Unknown` and are
/// rejected wherever a roster-size rule is needed.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum GameType {
    Football,
    Cricket,
    Basketball,
    Volleyball,
    Tennis,
    Badminton,
    TableTennis,
    Swimming,
    /// Game type present in stored data but not offered by the club.
    Unknown(String),
}

/// All game types the club offers, in display order.
pub const ALL_GAME_TYPES: [GameType; 8] = [
    GameType::Football,
    GameType::Cricket,
    GameType::Basketball,
    GameType::Volleyball,
    GameType::Tennis,
    GameType::Badminton,
    GameType::TableTennis,
    GameType::Swimming,
];

impl GameType {
    /// Display name, identical to the stored document value.
    pub fn name(&self) -> &str {
        match self {
            GameType::Football => "Football",
            GameType::Cricket => "Cricket",
            GameType::Basketball => "Basketball",
            GameType::Volleyball => "Volleyball",
            GameType::Tennis => "Tennis",
            GameType::Badminton => "Badminton",
            GameType::TableTennis => "Table Tennis",
            GameType::Swimming => "Swimming",
            GameType::Unknown(name) => name,
        }
    }
}

impl From<String> for GameType {
    fn from(name: String) -> Self {
        match name.as_str() {
            "Football" => GameType::Football,
            "Cricket" => GameType::Cricket,
            "Basketball" => GameType::Basketball,
            "Volleyball" => GameType::Volleyball,
            "Tennis" => GameType::Tennis,
            "Badminton" => GameType::Badminton,
            "Table Tennis" => GameType::TableTennis,
            "Swimming" => GameType::Swimming,
            _ => GameType::Unknown(name),
        }
    }
}

impl From<GameType> for String {
    fn from(game: GameType) -> Self {
        game.name().to_string()
    }
}

impl std::fmt::Display for GameType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Which side of a match a team plays (and which side won).
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeamSide {
    Team1,
    Team2,
}

impl TeamSide {
    pub fn other(self) -> TeamSide {
        match self {
            TeamSide::Team1 => TeamSide::Team2,
            TeamSide::Team2 => TeamSide::Team1,
        }
    }
}

/// Stored lifecycle of a match document. The richer display status
/// (upcoming/today/finished) is derived, not stored.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchState {
    Scheduled,
    Completed,
}

/// Announced outcome of a match. Written exactly once; never edited.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub winner: TeamSide,
    pub winner_team_name: String,
    pub loser_team_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub announced_by: UserId,
    pub announced_at: DateTime<Utc>,
}

/// A scheduled match between two teams of the same event.
///
/// Team names, event name, and game type are denormalized onto the match so
/// list views render without extra lookups. `participants` is the ordered
/// union of both rosters (team 1 first) and is what player-facing queries
/// filter on.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameMatch {
    pub id: MatchId,
    pub event_id: EventId,
    pub event_name: String,
    pub game_type: GameType,
    pub team1_id: TeamId,
    pub team2_id: TeamId,
    pub team1_name: String,
    pub team2_name: String,
    pub team1_participants: Vec<UserId>,
    pub team2_participants: Vec<UserId>,
    pub participants: Vec<UserId>,
    pub match_date_time: DateTime<Utc>,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: MatchState,
    /// Coach who scheduled the match (team 1's coach).
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<MatchResult>,
}

impl GameMatch {
    /// Roster of the given side.
    pub fn side_participants(&self, side: TeamSide) -> &[UserId] {
        match side {
            TeamSide::Team1 => &self.team1_participants,
            TeamSide::Team2 => &self.team2_participants,
        }
    }

    /// Team name of the given side.
    pub fn side_name(&self, side: TeamSide) -> &str {
        match side {
            TeamSide::Team1 => &self.team1_name,
            TeamSide::Team2 => &self.team2_name,
        }
    }
}

/// A game type with no configured roster size. Raised instead of silently
/// defaulting, so data-entry errors surface at the rule lookup.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UnknownGameTypeError(pub String);

impl std::fmt::Display for UnknownGameTypeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "No roster size is configured for game type '{}'", self.0)
    }
}

/// Errors raised while validating team composition, match pairing, or
/// result announcement.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ValidationError {
    /// Team name is empty (after trimming).
    MissingTeamName,
    /// Roster does not match the required size for the game type.
    IncompleteRoster {
        game_type: GameType,
        required: usize,
        actual: usize,
    },
    /// Both sides of the pairing are the same team.
    SameTeam,
    /// The two teams belong to different events.
    CrossEvent,
    /// The two teams share a participant.
    DuplicateRoster(UserId),
    /// The match already has an announced result.
    AlreadyAnnounced,
    /// The match cannot have a result before its scheduled time.
    MatchNotYetPlayable { scheduled_for: DateTime<Utc> },
    /// Validation needed a roster-size rule that does not exist.
    UnknownGameType(UnknownGameTypeError),
}

impl From<UnknownGameTypeError> for ValidationError {
    fn from(e: UnknownGameTypeError) -> Self {
        ValidationError::UnknownGameType(e)
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::MissingTeamName => write!(f, "Please enter a team name"),
            ValidationError::IncompleteRoster {
                game_type,
                required,
                actual,
            } => write!(
                f,
                "{} teams require exactly {} player(s); this roster has {}",
                game_type, required, actual
            ),
            ValidationError::SameTeam => write!(f, "A team cannot play against itself"),
            ValidationError::CrossEvent => {
                write!(f, "Both teams must belong to the same event")
            }
            ValidationError::DuplicateRoster(id) => {
                write!(f, "Participant {} is on both teams", id)
            }
            ValidationError::AlreadyAnnounced => {
                write!(f, "A result has already been announced for this match")
            }
            ValidationError::MatchNotYetPlayable { scheduled_for } => write!(
                f,
                "The match is scheduled for {} and has not been played yet",
                scheduled_for
            ),
            ValidationError::UnknownGameType(e) => e.fmt(f),
        }
    }
}
