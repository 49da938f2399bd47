//! Match scheduling, result announcement, and the list views with derived
//! statuses attached.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::logic::{self, MatchStatus};
use crate::models::{GameMatch, MatchResult, MatchState, Team, TeamId, TeamSide, UserId};
use crate::service::{
    fetch_required, fetch_required_at, ClubError, PartialFailure, WriteRef, COMMIT_RETRIES,
};
use crate::store::{collections, encode, DocumentStore, Filter, Patch, StoreError};

/// Fields a coach supplies when pairing two teams into a match.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMatch {
    pub team1_id: TeamId,
    pub team2_id: TeamId,
    pub match_date_time: DateTime<Utc>,
    pub location: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Result submission for a played match.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultInput {
    pub winner: TeamSide,
    #[serde(default)]
    pub score: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    pub announced_by: UserId,
}

/// A match together with its derived display status.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchView {
    pub status: MatchStatus,
    pub status_label: &'static str,
    #[serde(rename = "match")]
    pub game_match: GameMatch,
}

impl MatchView {
    pub fn new(game_match: GameMatch, now: DateTime<Utc>) -> Self {
        let status = logic::derive_status(&game_match, now);
        Self {
            status,
            status_label: status.label(),
            game_match,
        }
    }
}

pub struct MatchService {
    store: Arc<dyn DocumentStore>,
}

impl MatchService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Pair two committed teams into a scheduled match, then stamp the
    /// schedule and the match back-reference onto both team documents.
    ///
    /// The match document denormalizes everything the list views render, so
    /// the team stamps that follow are conveniences; losing one is reported
    /// as a partial failure rather than masked.
    pub async fn schedule_match(&self, input: NewMatch) -> Result<GameMatch, ClubError> {
        if input.location.trim().is_empty() {
            return Err(ClubError::InvalidInput("Please enter a location".into()));
        }
        let team1: Team =
            fetch_required(self.store.as_ref(), collections::TEAMS, &input.team1_id).await?;
        let team2: Team =
            fetch_required(self.store.as_ref(), collections::TEAMS, &input.team2_id).await?;
        logic::validate_pairing(&team1, &team2)?;

        let participants = [team1.participants.clone(), team2.participants.clone()].concat();
        let draft = GameMatch {
            id: String::new(),
            event_id: team1.event_id.clone(),
            event_name: team1.event_name.clone(),
            game_type: team1.game_type.clone(),
            team1_id: team1.id.clone(),
            team2_id: team2.id.clone(),
            team1_name: team1.name.clone(),
            team2_name: team2.name.clone(),
            team1_participants: team1.participants.clone(),
            team2_participants: team2.participants.clone(),
            participants,
            match_date_time: input.match_date_time,
            location: input.location.trim().to_string(),
            description: input.description.clone(),
            status: MatchState::Scheduled,
            created_by: team1.coach_id.clone(),
            created_at: Utc::now(),
            result: None,
        };
        let match_id = self
            .store
            .put(collections::MATCHES, None, encode(&draft)?)
            .await?;

        let mut committed = vec![WriteRef::new(collections::MATCHES, match_id.clone())];
        let mut failed = Vec::new();
        for team in [&team1, &team2] {
            let patch = Patch::new()
                .set("matchDateTime", json!(input.match_date_time))
                .set("matchId", json!(match_id));
            match self.store.update(collections::TEAMS, &team.id, patch).await {
                Ok(()) => committed.push(WriteRef::new(collections::TEAMS, team.id.clone())),
                Err(e) => failed.push((WriteRef::new(collections::TEAMS, team.id.clone()), e)),
            }
        }
        if !failed.is_empty() {
            log::warn!(
                "Match {} created but {} team update(s) failed",
                match_id,
                failed.len()
            );
            return Err(PartialFailure {
                operation: "schedule match",
                committed,
                failed,
            }
            .into());
        }

        log::info!(
            "Scheduled match {} ({} vs {}) for {}",
            match_id,
            draft.team1_name,
            draft.team2_name,
            draft.match_date_time
        );
        Ok(GameMatch {
            id: match_id,
            ..draft
        })
    }

    /// Announce the result of a played match. Guarded by the matches
    /// collection revision: when two coaches race to announce, the loser's
    /// re-read finds the result already present and fails loudly instead of
    /// overwriting it.
    pub async fn announce_result(
        &self,
        match_id: &str,
        input: ResultInput,
    ) -> Result<GameMatch, ClubError> {
        let mut attempts = 0;
        loop {
            attempts += 1;
            let (current, revision): (GameMatch, u64) =
                fetch_required_at(self.store.as_ref(), collections::MATCHES, match_id).await?;
            let now = Utc::now();
            logic::validate_announce(&current, now)?;

            let result = MatchResult {
                winner: input.winner,
                winner_team_name: current.side_name(input.winner).to_string(),
                loser_team_name: current.side_name(input.winner.other()).to_string(),
                score: input.score.clone(),
                notes: input.notes.clone(),
                announced_by: input.announced_by.clone(),
                announced_at: now,
            };
            let patch = Patch::new()
                .set(
                    "result",
                    serde_json::to_value(&result).map_err(StoreError::Encode)?,
                )
                .set("status", json!(MatchState::Completed));
            match self
                .store
                .update_checked(collections::MATCHES, match_id, patch, revision)
                .await
            {
                Ok(()) => {
                    log::info!(
                        "Result announced for match {}: {} won",
                        match_id,
                        result.winner_team_name
                    );
                    return fetch_required(self.store.as_ref(), collections::MATCHES, match_id)
                        .await;
                }
                Err(StoreError::Conflict { .. }) if attempts < COMMIT_RETRIES => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// One match by id.
    pub async fn match_by_id(&self, match_id: &str) -> Result<GameMatch, ClubError> {
        fetch_required(self.store.as_ref(), collections::MATCHES, match_id).await
    }

    /// Matches scheduled by a coach, action-needed first.
    pub async fn matches_for_coach(
        &self,
        coach_id: &str,
        event_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Vec<MatchView>, ClubError> {
        let snap = self
            .store
            .query(collections::MATCHES, &[Filter::eq("createdBy", coach_id)])
            .await?;
        Ok(views(snap.decode_all()?, event_id, now))
    }

    /// Matches a player is rostered in, action-needed first.
    pub async fn matches_for_player(
        &self,
        user_id: &str,
        event_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Vec<MatchView>, ClubError> {
        let snap = self
            .store
            .query(
                collections::MATCHES,
                &[Filter::array_contains("participants", user_id)],
            )
            .await?;
        Ok(views(snap.decode_all()?, event_id, now))
    }

    /// Completed matches, newest announcement first.
    pub async fn history(&self) -> Result<Vec<GameMatch>, ClubError> {
        let snap = self
            .store
            .query(collections::MATCHES, &[Filter::eq("status", "completed")])
            .await?;
        let mut matches: Vec<GameMatch> = snap.decode_all()?;
        logic::sort_matches_by_announcement(&mut matches);
        Ok(matches)
    }
}

fn views(
    mut matches: Vec<GameMatch>,
    event_id: Option<&str>,
    now: DateTime<Utc>,
) -> Vec<MatchView> {
    if let Some(event_id) = event_id {
        matches.retain(|m| m.event_id == event_id);
    }
    logic::sort_matches_for_display(&mut matches, now);
    matches
        .into_iter()
        .map(|m| MatchView::new(m, now))
        .collect()
}
