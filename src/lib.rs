//! Sports club web app: models, pure club logic, the document store the
//! records live in, and the async services that tie them together.

pub mod logic;
pub mod models;
pub mod service;
pub mod store;

pub use logic::{
    assign, assigned_participants, available_participants, can_assign, can_join_event,
    countdown_to, derive_event_status, derive_status, required_roster_size, selectable_games,
    sort_key_for_display, sort_matches_by_announcement, sort_matches_for_display,
    validate_announce, validate_game_selection, validate_pairing, validate_team_for_commit,
    Countdown, EventStatus, MatchStatus,
};
pub use models::{
    ApprovalRequest, ApprovalStatus, AssignmentError, Event, EventId, GameMatch, GameType,
    JoinError, MatchId, MatchResult, MatchState, PendingApproval, RegistrationError, Team, TeamId,
    TeamSide, TeamSummary, UnknownGameTypeError, User, UserId, UserType, ValidationError,
    ALL_GAME_TYPES,
};
