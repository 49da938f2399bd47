//! User records and the registration-time errors.

use crate::models::game::GameType;
use crate::models::team::TeamSummary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stable unique identifier for a user (`uniqueId` in the document; the
/// document itself is keyed by email).
pub type UserId = String;

/// Role of a registered user.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Player,
    Coach,
    Admin,
}

/// Approval state of a registration or game request.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Declined,
}

/// Per-game approval entry kept on the user while the request is open.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingApproval {
    pub game: GameType,
    pub status: ApprovalStatus,
    pub requested_at: DateTime<Utc>,
}

/// A registered club member. Documents live in `users`, keyed by email;
/// `unique_id` is the id other records reference.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub unique_id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub user_type: UserType,
    pub status: ApprovalStatus,
    pub selected_games: Vec<GameType>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub approved_games: Vec<GameType>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pending_approvals: Vec<PendingApproval>,
    /// Denormalized summaries of the teams this user is on.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub teams: Vec<TeamSummary>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Request to an approved coach to take on a player for one game.
/// Documents live in `approvalRequests`, keyed by `request_id`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalRequest {
    pub request_id: String,
    pub player_email: String,
    pub coach_email: String,
    pub game: GameType,
    pub status: ApprovalStatus,
    pub created_at: DateTime<Utc>,
}

/// Errors raised while registering a new user.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RegistrationError {
    /// First name, last name, or email is empty.
    MissingField(&'static str),
    /// A user document already exists for this email.
    EmailTaken(String),
    /// No game selected.
    NoGamesSelected,
    /// A player may select at most two games.
    TooManyGames { selected: usize },
    /// A coach must select exactly one game.
    CoachSelectsOneGame { selected: usize },
    /// The selected game is not offered to this user type (players need an
    /// approved coach for it; coaches cannot double-book a coached game).
    GameNotSelectable(GameType),
}

impl std::fmt::Display for RegistrationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistrationError::MissingField(field) => {
                write!(f, "Please enter your {}", field)
            }
            RegistrationError::EmailTaken(email) => {
                write!(f, "An account already exists for {}", email)
            }
            RegistrationError::NoGamesSelected => {
                write!(f, "Please select at least one game")
            }
            RegistrationError::TooManyGames { selected } => {
                write!(f, "Players can select at most 2 games (selected {})", selected)
            }
            RegistrationError::CoachSelectsOneGame { selected } => {
                write!(f, "Coaches must select exactly 1 game (selected {})", selected)
            }
            RegistrationError::GameNotSelectable(game) => {
                write!(f, "{} is not available for registration", game)
            }
        }
    }
}
