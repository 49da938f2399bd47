//! Event lifecycle: coach-owned create/update/delete, player join and
//! leave, and the listings the pages read.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::logic;
use crate::models::{Event, GameType, JoinError};
use crate::service::{
    fetch_required, fetch_required_at, require_user_by_unique_id, ClubError, COMMIT_RETRIES,
};
use crate::store::{collections, encode, DocumentStore, Filter, Patch, StoreError, Subscription};

/// Fields a coach supplies when creating or editing an event.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventInput {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub location: String,
    pub game_type: GameType,
    pub event_date: DateTime<Utc>,
    pub max_participants: u32,
}

impl EventInput {
    fn validate(&self) -> Result<(), ClubError> {
        if self.title.trim().is_empty() {
            return Err(ClubError::InvalidInput(
                "Please enter an event title".into(),
            ));
        }
        if self.location.trim().is_empty() {
            return Err(ClubError::InvalidInput("Please enter a location".into()));
        }
        if self.max_participants == 0 {
            return Err(ClubError::InvalidInput(
                "Maximum participants must be at least 1".into(),
            ));
        }
        // Misspelled sports fail here, not when the first team is built.
        logic::required_roster_size(&self.game_type)?;
        Ok(())
    }
}

pub struct EventService {
    store: Arc<dyn DocumentStore>,
}

impl EventService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Create an event owned by `coach_id`.
    pub async fn create_event(
        &self,
        coach_id: &str,
        input: EventInput,
    ) -> Result<Event, ClubError> {
        input.validate()?;
        let event = Event {
            id: String::new(),
            title: input.title.trim().to_string(),
            description: input.description,
            location: input.location.trim().to_string(),
            game_type: input.game_type,
            event_date: input.event_date,
            max_participants: input.max_participants,
            coach_id: coach_id.to_string(),
            participants: Vec::new(),
            created_at: Utc::now(),
        };
        let id = self
            .store
            .put(collections::EVENTS, None, encode(&event)?)
            .await?;
        log::info!("Coach {} created event '{}' ({})", coach_id, event.title, id);
        Ok(Event { id, ..event })
    }

    /// Rewrite the editable fields of an event. Only the owning coach may;
    /// the participant list is untouched.
    pub async fn update_event(
        &self,
        coach_id: &str,
        event_id: &str,
        input: EventInput,
    ) -> Result<Event, ClubError> {
        input.validate()?;
        let current: Event =
            fetch_required(self.store.as_ref(), collections::EVENTS, event_id).await?;
        if current.coach_id != coach_id {
            return Err(ClubError::NotOwner {
                collection: collections::EVENTS,
                id: event_id.to_string(),
            });
        }
        let description = match &input.description {
            Some(text) => json!(text),
            None => Value::Null,
        };
        let patch = Patch::new()
            .set("title", json!(input.title.trim()))
            .set("description", description)
            .set("location", json!(input.location.trim()))
            .set("gameType", json!(input.game_type))
            .set("eventDate", json!(input.event_date))
            .set("maxParticipants", json!(input.max_participants));
        self.store
            .update(collections::EVENTS, event_id, patch)
            .await?;
        log::info!("Coach {} updated event {}", coach_id, event_id);
        fetch_required(self.store.as_ref(), collections::EVENTS, event_id).await
    }

    /// Remove an event document. Teams and matches already derived from it
    /// keep their denormalized copies.
    pub async fn delete_event(&self, coach_id: &str, event_id: &str) -> Result<(), ClubError> {
        let current: Event =
            fetch_required(self.store.as_ref(), collections::EVENTS, event_id).await?;
        if current.coach_id != coach_id {
            return Err(ClubError::NotOwner {
                collection: collections::EVENTS,
                id: event_id.to_string(),
            });
        }
        self.store.delete(collections::EVENTS, event_id).await?;
        log::info!(
            "Coach {} deleted event '{}' ({})",
            coach_id,
            current.title,
            event_id
        );
        Ok(())
    }

    /// Join a player onto an event. The participant write is guarded by the
    /// events-collection revision: when two players race for the last spot,
    /// the loser re-reads and sees the event full.
    pub async fn join_event(&self, event_id: &str, user_id: &str) -> Result<Event, ClubError> {
        let user = require_user_by_unique_id(self.store.as_ref(), user_id).await?;
        let mut attempts = 0;
        loop {
            attempts += 1;
            let (event, revision): (Event, u64) =
                fetch_required_at(self.store.as_ref(), collections::EVENTS, event_id).await?;
            logic::can_join_event(&user, &event)?;
            let patch = Patch::new().array_union("participants", vec![json!(user_id)]);
            match self
                .store
                .update_checked(collections::EVENTS, event_id, patch, revision)
                .await
            {
                Ok(()) => {
                    log::info!("Player {} joined event '{}'", user_id, event.title);
                    return fetch_required(self.store.as_ref(), collections::EVENTS, event_id)
                        .await;
                }
                Err(StoreError::Conflict { .. }) if attempts < COMMIT_RETRIES => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Remove a player from an event they joined.
    pub async fn leave_event(&self, event_id: &str, user_id: &str) -> Result<Event, ClubError> {
        let event: Event =
            fetch_required(self.store.as_ref(), collections::EVENTS, event_id).await?;
        if !event.participants.iter().any(|p| p == user_id) {
            return Err(JoinError::NotAParticipant.into());
        }
        let patch = Patch::new().array_remove("participants", vec![json!(user_id)]);
        self.store
            .update(collections::EVENTS, event_id, patch)
            .await?;
        log::info!("Player {} left event '{}'", user_id, event.title);
        fetch_required(self.store.as_ref(), collections::EVENTS, event_id).await
    }

    /// One event by id.
    pub async fn event(&self, event_id: &str) -> Result<Event, ClubError> {
        fetch_required(self.store.as_ref(), collections::EVENTS, event_id).await
    }

    /// Every event in the club.
    pub async fn all_events(&self) -> Result<Vec<Event>, ClubError> {
        let snap = self.store.query(collections::EVENTS, &[]).await?;
        Ok(snap.decode_all()?)
    }

    /// Events owned by one coach.
    pub async fn events_for_coach(&self, coach_id: &str) -> Result<Vec<Event>, ClubError> {
        let snap = self
            .store
            .query(collections::EVENTS, &[Filter::eq("coachId", coach_id)])
            .await?;
        Ok(snap.decode_all()?)
    }

    /// Events a player has joined.
    pub async fn events_joined_by(&self, user_id: &str) -> Result<Vec<Event>, ClubError> {
        let snap = self
            .store
            .query(
                collections::EVENTS,
                &[Filter::array_contains("participants", user_id)],
            )
            .await?;
        Ok(snap.decode_all()?)
    }

    /// Live feed of a coach's events: the current snapshot immediately, a
    /// fresh one after every write that touches the set.
    pub async fn watch_events_for_coach(&self, coach_id: &str) -> Result<Subscription, ClubError> {
        Ok(self
            .store
            .subscribe(collections::EVENTS, vec![Filter::eq("coachId", coach_id)])
            .await?)
    }
}
