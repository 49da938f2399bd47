//! Data structures for the sports club: users, events, teams, matches.

mod event;
mod game;
mod team;
mod user;

pub use event::{Event, EventId, JoinError};
pub use game::{
    GameMatch, GameType, MatchId, MatchResult, MatchState, TeamSide, UnknownGameTypeError,
    ValidationError, ALL_GAME_TYPES,
};
pub use team::{AssignmentError, Team, TeamId, TeamSummary};
pub use user::{
    ApprovalRequest, ApprovalStatus, PendingApproval, RegistrationError, User, UserId, UserType,
};
