//! Club business logic: roster assignment, team/match rules, status
//! derivation, membership eligibility.

mod membership;
mod roster;
mod rules;
mod status;

pub use membership::{can_join_event, selectable_games, validate_game_selection};
pub use roster::{assign, assigned_participants, available_participants, can_assign};
pub use rules::{
    required_roster_size, validate_announce, validate_pairing, validate_team_for_commit,
};
pub use status::{
    countdown_to, derive_event_status, derive_status, sort_key_for_display,
    sort_matches_by_announcement, sort_matches_for_display, Countdown, EventStatus, MatchStatus,
};
