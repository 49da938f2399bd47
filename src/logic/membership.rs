//! Event membership eligibility and registration-time game selection.

use crate::models::{
    Event, GameType, JoinError, RegistrationError, User, UserType, ALL_GAME_TYPES,
};
use std::collections::HashSet;

/// Whether a user may join an event: players only, registered for the
/// event's game type, not already joined, event not full. Each failed check
/// has its own error so the caller can show the precise reason.
pub fn can_join_event(user: &User, event: &Event) -> Result<(), JoinError> {
    if user.user_type != UserType::Player {
        return Err(JoinError::NotAPlayer);
    }
    if !user.selected_games.contains(&event.game_type) {
        return Err(JoinError::GameNotSelected(event.game_type.clone()));
    }
    if event.participants.iter().any(|id| id == &user.unique_id) {
        return Err(JoinError::AlreadyJoined);
    }
    if event.is_full() {
        return Err(JoinError::EventFull {
            max_participants: event.max_participants,
        });
    }
    Ok(())
}

/// Games offered at registration, given which games already have an
/// approved coach: players may only pick coached games, coaches may only
/// pick games still without one.
pub fn selectable_games(user_type: UserType, coached_games: &HashSet<GameType>) -> Vec<GameType> {
    ALL_GAME_TYPES
        .iter()
        .filter(|game| match user_type {
            UserType::Player => coached_games.contains(game),
            UserType::Coach | UserType::Admin => !coached_games.contains(game),
        })
        .cloned()
        .collect()
}

/// Registration game-selection rules: at least one game, coaches exactly
/// one, players at most two, and every pick currently selectable for the
/// role.
pub fn validate_game_selection(
    user_type: UserType,
    selected: &[GameType],
    coached_games: &HashSet<GameType>,
) -> Result<(), RegistrationError> {
    if selected.is_empty() {
        return Err(RegistrationError::NoGamesSelected);
    }
    match user_type {
        UserType::Coach => {
            if selected.len() != 1 {
                return Err(RegistrationError::CoachSelectsOneGame {
                    selected: selected.len(),
                });
            }
        }
        UserType::Player => {
            if selected.len() > 2 {
                return Err(RegistrationError::TooManyGames {
                    selected: selected.len(),
                });
            }
        }
        UserType::Admin => {}
    }
    let allowed = selectable_games(user_type, coached_games);
    if let Some(game) = selected.iter().find(|game| !allowed.contains(game)) {
        return Err(RegistrationError::GameNotSelectable(game.clone()));
    }
    Ok(())
}
