//! Roster assignment: which event participants are free for a new team,
//! and drafting a roster without double-assigning anyone.

use crate::logic::rules::required_roster_size;
use crate::models::{AssignmentError, Event, Team, UserId};
use std::collections::HashSet;

/// Union of every team's roster: the participants already taken for this
/// event. Pure; order-free.
pub fn assigned_participants(teams: &[Team]) -> HashSet<UserId> {
    teams
        .iter()
        .flat_map(|t| t.participants.iter().cloned())
        .collect()
}

/// Event participants not yet on any team, in join order.
pub fn available_participants(event: &Event, teams: &[Team]) -> Vec<UserId> {
    let assigned = assigned_participants(teams);
    event
        .participants
        .iter()
        .filter(|id| !assigned.contains(*id))
        .cloned()
        .collect()
}

/// Whether the participant belongs to the event and is still unassigned.
pub fn can_assign(participant_id: &str, event: &Event, teams: &[Team]) -> bool {
    event.participants.iter().any(|id| id == participant_id)
        && !assigned_participants(teams).contains(participant_id)
}

/// Add a participant to a draft roster.
///
/// `teams` are the committed teams of the event (the draft itself is not
/// among them). Adding an id already in the draft is a no-op so the
/// operation is idempotent; the capacity check uses the event's roster-size
/// rule.
pub fn assign(
    draft: &mut Team,
    participant_id: &str,
    event: &Event,
    teams: &[Team],
) -> Result<(), AssignmentError> {
    if !can_assign(participant_id, event, teams) {
        return Err(AssignmentError::AlreadyAssigned(participant_id.to_string()));
    }
    if draft.participants.iter().any(|id| id == participant_id) {
        return Ok(());
    }
    let required = required_roster_size(&event.game_type)?;
    if draft.participants.len() >= required {
        return Err(AssignmentError::CapacityExceeded {
            game_type: event.game_type.clone(),
            required,
        });
    }
    draft.participants.push(participant_id.to_string());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GameType;
    use chrono::{TimeZone, Utc};

    fn event(participants: &[&str]) -> Event {
        Event {
            id: "e1".to_string(),
            title: "Open Day".to_string(),
            description: None,
            location: "Main Hall".to_string(),
            game_type: GameType::Tennis,
            event_date: Utc.with_ymd_and_hms(2025, 7, 1, 10, 0, 0).unwrap(),
            max_participants: 20,
            coach_id: "coach".to_string(),
            participants: participants.iter().map(|s| s.to_string()).collect(),
            created_at: Utc.with_ymd_and_hms(2025, 5, 1, 8, 0, 0).unwrap(),
        }
    }

    fn team(id: &str, roster: &[&str]) -> Team {
        Team {
            id: id.to_string(),
            name: format!("Team {id}"),
            event_id: "e1".to_string(),
            event_name: "Open Day".to_string(),
            game_type: GameType::Tennis,
            coach_id: "coach".to_string(),
            participants: roster.iter().map(|s| s.to_string()).collect(),
            match_date_time: None,
            match_id: None,
            created_at: Utc.with_ymd_and_hms(2025, 5, 1, 8, 0, 0).unwrap(),
        }
    }

    #[test]
    fn available_keeps_join_order_minus_assigned() {
        let event = event(&["p1", "p2", "p3", "p4", "p5"]);
        let teams = vec![team("t1", &["p2", "p4"])];
        assert_eq!(available_participants(&event, &teams), vec!["p1", "p3", "p5"]);
    }

    #[test]
    fn can_assign_requires_membership_and_freedom() {
        let event = event(&["p1", "p2"]);
        let teams = vec![team("t1", &["p2"])];
        assert!(can_assign("p1", &event, &teams));
        assert!(!can_assign("p2", &event, &teams));
        assert!(!can_assign("stranger", &event, &teams));
    }

    #[test]
    fn assign_is_idempotent_within_the_draft() {
        let event = event(&["p1", "p2"]);
        let mut draft = team("t1", &[]);
        assign(&mut draft, "p1", &event, &[]).unwrap();
        assign(&mut draft, "p1", &event, &[]).unwrap();
        assert_eq!(draft.participants, vec!["p1"]);
    }

    #[test]
    fn assign_rejects_taken_and_foreign_participants() {
        let event = event(&["p1", "p2"]);
        let teams = vec![team("t1", &["p1"])];
        let mut draft = team("t2", &[]);
        assert_eq!(
            assign(&mut draft, "p1", &event, &teams),
            Err(AssignmentError::AlreadyAssigned("p1".to_string()))
        );
        assert_eq!(
            assign(&mut draft, "stranger", &event, &teams),
            Err(AssignmentError::AlreadyAssigned("stranger".to_string()))
        );
        assert!(draft.participants.is_empty());
    }

    #[test]
    fn assign_stops_at_the_roster_size_for_the_game() {
        // Tennis rosters hold 2.
        let event = event(&["p1", "p2", "p3"]);
        let mut draft = team("t1", &[]);
        assign(&mut draft, "p1", &event, &[]).unwrap();
        assign(&mut draft, "p2", &event, &[]).unwrap();
        let err = assign(&mut draft, "p3", &event, &[]).unwrap_err();
        assert!(matches!(
            err,
            AssignmentError::CapacityExceeded { required: 2, .. }
        ));
        assert_eq!(draft.participants, vec!["p1", "p2"]);
    }
}
