//! Team building: roster assignment against live event/team snapshots,
//! revision-guarded creation, and the membership fan-out to user documents.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;

use crate::logic;
use crate::models::{Event, EventId, Team, TeamSummary, UserId, ValidationError};
use crate::service::{
    fetch_required, find_user_by_unique_id, ClubError, PartialFailure, WriteRef, COMMIT_RETRIES,
};
use crate::store::{collections, encode, DocumentStore, Filter, Patch, StoreError};

/// Fields a coach supplies when creating a team.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTeam {
    pub name: String,
    pub event_id: EventId,
    pub participant_ids: Vec<UserId>,
}

pub struct TeamService {
    store: Arc<dyn DocumentStore>,
}

impl TeamService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Teams already created for an event.
    pub async fn teams_for_event(&self, event_id: &str) -> Result<Vec<Team>, ClubError> {
        let snap = self
            .store
            .query(collections::TEAMS, &[Filter::eq("eventId", event_id)])
            .await?;
        Ok(snap.decode_all()?)
    }

    /// Teams created by one coach.
    pub async fn teams_for_coach(&self, coach_id: &str) -> Result<Vec<Team>, ClubError> {
        let snap = self
            .store
            .query(collections::TEAMS, &[Filter::eq("coachId", coach_id)])
            .await?;
        Ok(snap.decode_all()?)
    }

    /// Teams a player is rostered on.
    pub async fn teams_for_player(&self, user_id: &str) -> Result<Vec<Team>, ClubError> {
        let snap = self
            .store
            .query(
                collections::TEAMS,
                &[Filter::array_contains("participants", user_id)],
            )
            .await?;
        Ok(snap.decode_all()?)
    }

    /// One team by id.
    pub async fn team(&self, team_id: &str) -> Result<Team, ClubError> {
        fetch_required(self.store.as_ref(), collections::TEAMS, team_id).await
    }

    /// Event participants not yet on any of the event's teams, in join
    /// order.
    pub async fn available_participants(&self, event_id: &str) -> Result<Vec<UserId>, ClubError> {
        let event: Event =
            fetch_required(self.store.as_ref(), collections::EVENTS, event_id).await?;
        let teams = self.teams_for_event(event_id).await?;
        Ok(logic::available_participants(&event, &teams))
    }

    /// Create a team from unassigned event participants, then write a
    /// membership summary onto each member's user document.
    ///
    /// The team write is guarded by the teams-collection revision read while
    /// planning: when a racing coach takes one of the same participants
    /// first, the commit conflicts and the re-validation against the fresh
    /// snapshot reports the participant as already assigned. A success for
    /// both racers can therefore never double-assign anyone.
    ///
    /// The member updates run after the team lands; any that fail are
    /// reported as a partial failure carrying both lists of writes.
    pub async fn create_team(&self, coach_id: &str, input: NewTeam) -> Result<Team, ClubError> {
        if input.name.trim().is_empty() {
            return Err(ValidationError::MissingTeamName.into());
        }
        if input.participant_ids.is_empty() {
            return Err(ClubError::InvalidInput(
                "Please add participants to the team".into(),
            ));
        }

        let mut attempts = 0;
        let (team_id, draft) = loop {
            attempts += 1;
            let event: Event =
                fetch_required(self.store.as_ref(), collections::EVENTS, &input.event_id).await?;
            let snap = self
                .store
                .query(
                    collections::TEAMS,
                    &[Filter::eq("eventId", input.event_id.as_str())],
                )
                .await?;
            let committed_teams: Vec<Team> = snap.decode_all()?;

            let mut draft = Team {
                id: String::new(),
                name: input.name.trim().to_string(),
                event_id: event.id.clone(),
                event_name: event.title.clone(),
                game_type: event.game_type.clone(),
                coach_id: coach_id.to_string(),
                participants: Vec::new(),
                match_date_time: None,
                match_id: None,
                created_at: Utc::now(),
            };
            for participant in &input.participant_ids {
                logic::assign(&mut draft, participant, &event, &committed_teams)?;
            }

            let data = encode(&draft)?;
            match self
                .store
                .put_checked(collections::TEAMS, None, data, snap.revision)
                .await
            {
                Ok(id) => break (id, draft),
                Err(StoreError::Conflict { .. }) if attempts < COMMIT_RETRIES => continue,
                Err(e) => return Err(e.into()),
            }
        };
        let team = Team {
            id: team_id.clone(),
            ..draft
        };

        // Fan the membership summary out to each member's user document.
        let summary = serde_json::to_value(TeamSummary::of(&team)).map_err(StoreError::Encode)?;
        let mut committed = vec![WriteRef::new(collections::TEAMS, team_id.clone())];
        let mut failed = Vec::new();
        for participant in &team.participants {
            let email = match find_user_by_unique_id(self.store.as_ref(), participant).await {
                Ok(Some(user)) => user.email,
                Ok(None) => {
                    failed.push((
                        WriteRef::new(collections::USERS, participant.clone()),
                        StoreError::Missing {
                            collection: collections::USERS.to_string(),
                            id: participant.clone(),
                        },
                    ));
                    continue;
                }
                Err(e) => {
                    failed.push((WriteRef::new(collections::USERS, participant.clone()), e));
                    continue;
                }
            };
            let patch = Patch::new().array_union("teams", vec![summary.clone()]);
            match self.store.update(collections::USERS, &email, patch).await {
                Ok(()) => committed.push(WriteRef::new(collections::USERS, email)),
                Err(e) => failed.push((WriteRef::new(collections::USERS, email), e)),
            }
        }
        if !failed.is_empty() {
            log::warn!(
                "Team '{}' ({}) created but {} member update(s) failed",
                team.name,
                team_id,
                failed.len()
            );
            return Err(PartialFailure {
                operation: "create team",
                committed,
                failed,
            }
            .into());
        }

        log::info!(
            "Coach {} created team '{}' ({}) with {} player(s) for event '{}'",
            coach_id,
            team.name,
            team_id,
            team.participants.len(),
            team.event_name
        );
        Ok(team)
    }
}
