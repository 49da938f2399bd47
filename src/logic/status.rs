//! Lifecycle status derivation for matches and events, and the display
//! orderings built on it. All functions take `now` explicitly so they stay
//! pure and testable at fixed instants.

use crate::models::GameMatch;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Derived display status of a match. Only `scheduled`/`completed` is
/// stored; the time-based split is recomputed at read time.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Upcoming,
    Today,
    /// Scheduled time has passed but no result was announced yet
    /// ("finished" on the match cards).
    PastAwaitingResult,
    Completed,
}

impl MatchStatus {
    /// Card label shown to users.
    pub fn label(&self) -> &'static str {
        match self {
            MatchStatus::Upcoming => "Upcoming",
            MatchStatus::Today => "Match Today",
            MatchStatus::PastAwaitingResult => "Awaiting Result",
            MatchStatus::Completed => "Result Declared",
        }
    }
}

/// Status of a match at `now`. A result dominates every time-based check;
/// after that, a due match (`now >= matchDateTime`) awaits its result, a
/// same-UTC-day match is today's, and everything else is upcoming.
pub fn derive_status(game_match: &GameMatch, now: DateTime<Utc>) -> MatchStatus {
    if game_match.result.is_some() {
        return MatchStatus::Completed;
    }
    if now >= game_match.match_date_time {
        return MatchStatus::PastAwaitingResult;
    }
    if now.date_naive() == game_match.match_date_time.date_naive() {
        return MatchStatus::Today;
    }
    MatchStatus::Upcoming
}

/// Sort key for match lists: action-needed first (awaiting result, then
/// today, then upcoming, completed last), ties by ascending scheduled time.
pub fn sort_key_for_display(game_match: &GameMatch, now: DateTime<Utc>) -> (u8, DateTime<Utc>) {
    let rank = match derive_status(game_match, now) {
        MatchStatus::PastAwaitingResult => 1,
        MatchStatus::Today => 2,
        MatchStatus::Upcoming => 3,
        MatchStatus::Completed => 4,
    };
    (rank, game_match.match_date_time)
}

/// Order matches for display (see [`sort_key_for_display`]).
pub fn sort_matches_for_display(matches: &mut [GameMatch], now: DateTime<Utc>) {
    matches.sort_by_key(|m| sort_key_for_display(m, now));
}

/// Order completed matches newest announcement first. Matches without a
/// result (none, in a history listing) sort last.
pub fn sort_matches_by_announcement(matches: &mut [GameMatch]) {
    matches.sort_by_key(|m| std::cmp::Reverse(m.result.as_ref().map(|r| r.announced_at)));
}

/// Derived temporal status of an event (events have no results; they only
/// age out).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Upcoming,
    Today,
    Past,
}

/// Status of an event at `now`: past once the start time has passed,
/// otherwise today on the same UTC calendar day, otherwise upcoming.
pub fn derive_event_status(event_date: DateTime<Utc>, now: DateTime<Utc>) -> EventStatus {
    if now > event_date {
        return EventStatus::Past;
    }
    if now.date_naive() == event_date.date_naive() {
        return EventStatus::Today;
    }
    EventStatus::Upcoming
}

/// Countdown to an event as shown on dashboard cards.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Countdown {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
    pub total_hours: i64,
    pub is_past: bool,
}

/// Time remaining until `event_date`, broken into card fields. Past events
/// report zeros with `is_past` set.
pub fn countdown_to(event_date: DateTime<Utc>, now: DateTime<Utc>) -> Countdown {
    let remaining = event_date.signed_duration_since(now);
    if remaining < Duration::zero() {
        return Countdown {
            days: 0,
            hours: 0,
            minutes: 0,
            seconds: 0,
            total_hours: 0,
            is_past: true,
        };
    }
    Countdown {
        days: remaining.num_days(),
        hours: remaining.num_hours() % 24,
        minutes: remaining.num_minutes() % 60,
        seconds: remaining.num_seconds() % 60,
        total_hours: remaining.num_hours(),
        is_past: false,
    }
}
