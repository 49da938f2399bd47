//! Registration: user creation keyed by email, the selectable-games
//! listing, and the approval-request fan-out for players.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::logic;
use crate::models::{
    ApprovalRequest, ApprovalStatus, GameType, PendingApproval, RegistrationError, User, UserType,
};
use crate::service::{ClubError, PartialFailure, WriteRef};
use crate::store::{collections, encode, DocumentStore, Filter};

/// Fields supplied by the registration form.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRegistration {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub user_type: UserType,
    pub selected_games: Vec<GameType>,
}

pub struct RegistrationService {
    store: Arc<dyn DocumentStore>,
}

impl RegistrationService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Games currently offered to a registrant of the given role: players
    /// see coached games, coaches see games still without a coach.
    pub async fn selectable_games(&self, user_type: UserType) -> Result<Vec<GameType>, ClubError> {
        let coached = self.coached_games().await?;
        Ok(logic::selectable_games(user_type, &coached))
    }

    /// Games covered by at least one approved coach.
    async fn coached_games(&self) -> Result<HashSet<GameType>, ClubError> {
        let snap = self
            .store
            .query(
                collections::USERS,
                &[
                    Filter::eq("userType", "coach"),
                    Filter::eq("status", "approved"),
                ],
            )
            .await?;
        let coaches: Vec<User> = snap.decode_all()?;
        Ok(coaches.into_iter().flat_map(|c| c.selected_games).collect())
    }

    /// Register a new member. The user document is keyed by email and
    /// starts pending; a player additionally gets one approval request per
    /// approved coach sharing a selected game, so those coaches find the
    /// player on their dashboards.
    pub async fn register(&self, input: NewRegistration) -> Result<User, ClubError> {
        let first_name = input.first_name.trim();
        if first_name.is_empty() {
            return Err(RegistrationError::MissingField("first name").into());
        }
        let last_name = input.last_name.trim();
        if last_name.is_empty() {
            return Err(RegistrationError::MissingField("last name").into());
        }
        let email = input.email.trim().to_lowercase();
        if email.is_empty() {
            return Err(RegistrationError::MissingField("email").into());
        }
        if self.store.get(collections::USERS, &email).await?.is_some() {
            return Err(RegistrationError::EmailTaken(email).into());
        }

        let coached = self.coached_games().await?;
        logic::validate_game_selection(input.user_type, &input.selected_games, &coached)?;

        let now = Utc::now();
        let user = User {
            unique_id: Uuid::new_v4().to_string(),
            email: email.clone(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            user_type: input.user_type,
            status: ApprovalStatus::Pending,
            selected_games: input.selected_games.clone(),
            approved_games: Vec::new(),
            pending_approvals: input
                .selected_games
                .iter()
                .map(|game| PendingApproval {
                    game: game.clone(),
                    status: ApprovalStatus::Pending,
                    requested_at: now,
                })
                .collect(),
            teams: Vec::new(),
            created_at: now,
        };
        self.store
            .put(collections::USERS, Some(&email), encode(&user)?)
            .await?;

        if input.user_type == UserType::Player {
            self.fan_out_approvals(&user).await?;
        }
        log::info!("Registered {} ({})", user.full_name(), user.email);
        Ok(user)
    }

    /// One approval request per approved coach sharing one of the player's
    /// selected games. The user document already landed, so a lost request
    /// write is reported as a partial failure, not masked.
    async fn fan_out_approvals(&self, user: &User) -> Result<(), ClubError> {
        let games: Vec<Value> = user.selected_games.iter().map(|g| json!(g)).collect();
        let snap = self
            .store
            .query(
                collections::USERS,
                &[
                    Filter::eq("userType", "coach"),
                    Filter::eq("status", "approved"),
                    Filter::array_contains_any("selectedGames", games),
                ],
            )
            .await?;
        let coaches: Vec<User> = snap.decode_all()?;

        let mut committed = vec![WriteRef::new(collections::USERS, user.email.clone())];
        let mut failed = Vec::new();
        for coach in &coaches {
            for game in coach
                .selected_games
                .iter()
                .filter(|game| user.selected_games.contains(game))
            {
                let request = ApprovalRequest {
                    request_id: Uuid::new_v4().to_string(),
                    player_email: user.email.clone(),
                    coach_email: coach.email.clone(),
                    game: game.clone(),
                    status: ApprovalStatus::Pending,
                    created_at: Utc::now(),
                };
                let write = match encode(&request) {
                    Ok(data) => self
                        .store
                        .put(
                            collections::APPROVAL_REQUESTS,
                            Some(&request.request_id),
                            data,
                        )
                        .await
                        .map(|_| ()),
                    Err(e) => Err(e),
                };
                let target = WriteRef::new(collections::APPROVAL_REQUESTS, request.request_id);
                match write {
                    Ok(()) => committed.push(target),
                    Err(e) => failed.push((target, e)),
                }
            }
        }
        if !failed.is_empty() {
            log::warn!(
                "Registered {} but {} approval request(s) failed",
                user.email,
                failed.len()
            );
            return Err(PartialFailure {
                operation: "register player",
                committed,
                failed,
            }
            .into());
        }
        log::info!(
            "Queued {} approval request(s) for {}",
            committed.len() - 1,
            user.email
        );
        Ok(())
    }
}
