//! Asynchronous orchestration over the document store: load fresh
//! snapshots, run the pure rules, commit with revision guards.

mod events;
mod matches;
mod registration;
mod teams;

pub use events::{EventInput, EventService};
pub use matches::{MatchService, MatchView, NewMatch, ResultInput};
pub use registration::{NewRegistration, RegistrationService};
pub use teams::{NewTeam, TeamService};

use crate::models::{
    AssignmentError, JoinError, RegistrationError, UnknownGameTypeError, User, ValidationError,
};
use crate::store::{collections, DocumentStore, Filter, StoreError};
use serde::de::DeserializeOwned;

/// Attempts for a revision-guarded commit before giving up. Every retry
/// re-reads and re-validates, so a lost precondition surfaces as its domain
/// error rather than as a raw conflict.
pub(crate) const COMMIT_RETRIES: usize = 5;

/// Reference to one persisted write, for partial-failure reporting.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WriteRef {
    pub collection: &'static str,
    pub id: String,
}

impl WriteRef {
    pub(crate) fn new(collection: &'static str, id: impl Into<String>) -> Self {
        Self {
            collection,
            id: id.into(),
        }
    }
}

impl std::fmt::Display for WriteRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

/// A multi-document flow landed its primary write but lost secondary ones.
/// Carries exactly which writes committed and which failed, so the caller
/// can compensate or retry instead of trusting a false success.
#[derive(Debug)]
pub struct PartialFailure {
    pub operation: &'static str,
    pub committed: Vec<WriteRef>,
    pub failed: Vec<(WriteRef, StoreError)>,
}

impl std::fmt::Display for PartialFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} write(s) landed but {} failed",
            self.operation,
            self.committed.len(),
            self.failed.len()
        )?;
        for (target, error) in &self.failed {
            write!(f, "; {} ({})", target, error)?;
        }
        Ok(())
    }
}

/// Top-level service error. Domain failures keep their typed payloads so
/// callers can render the precise message; store failures pass through
/// unchanged.
#[derive(Debug)]
pub enum ClubError {
    /// Malformed or missing argument (empty title, empty roster, ...).
    InvalidInput(String),
    Assignment(AssignmentError),
    Validation(ValidationError),
    Join(JoinError),
    Registration(RegistrationError),
    UnknownGameType(UnknownGameTypeError),
    /// A referenced document does not exist.
    NotFound {
        collection: &'static str,
        id: String,
    },
    /// Only the owning coach may change this record.
    NotOwner {
        collection: &'static str,
        id: String,
    },
    Persistence(StoreError),
    Partial(PartialFailure),
}

impl std::fmt::Display for ClubError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClubError::InvalidInput(message) => f.write_str(message),
            ClubError::Assignment(e) => e.fmt(f),
            ClubError::Validation(e) => e.fmt(f),
            ClubError::Join(e) => e.fmt(f),
            ClubError::Registration(e) => e.fmt(f),
            ClubError::UnknownGameType(e) => e.fmt(f),
            ClubError::NotFound { collection, id } => {
                write!(f, "No document {} in '{}'", id, collection)
            }
            ClubError::NotOwner { collection, id } => {
                write!(f, "Only the owning coach can change {}/{}", collection, id)
            }
            ClubError::Persistence(e) => e.fmt(f),
            ClubError::Partial(e) => e.fmt(f),
        }
    }
}

impl From<AssignmentError> for ClubError {
    fn from(e: AssignmentError) -> Self {
        ClubError::Assignment(e)
    }
}

impl From<ValidationError> for ClubError {
    fn from(e: ValidationError) -> Self {
        ClubError::Validation(e)
    }
}

impl From<JoinError> for ClubError {
    fn from(e: JoinError) -> Self {
        ClubError::Join(e)
    }
}

impl From<RegistrationError> for ClubError {
    fn from(e: RegistrationError) -> Self {
        ClubError::Registration(e)
    }
}

impl From<UnknownGameTypeError> for ClubError {
    fn from(e: UnknownGameTypeError) -> Self {
        ClubError::UnknownGameType(e)
    }
}

impl From<StoreError> for ClubError {
    fn from(e: StoreError) -> Self {
        ClubError::Persistence(e)
    }
}

impl From<PartialFailure> for ClubError {
    fn from(e: PartialFailure) -> Self {
        ClubError::Partial(e)
    }
}

/// Fetch and decode a document, failing with `NotFound` when absent.
pub(crate) async fn fetch_required<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    collection: &'static str,
    id: &str,
) -> Result<T, ClubError> {
    let doc = store
        .get(collection, id)
        .await?
        .ok_or_else(|| ClubError::NotFound {
            collection,
            id: id.to_string(),
        })?;
    Ok(doc.decode()?)
}

/// Fetch a document together with the collection revision it was read at,
/// for revision-guarded rewrites.
pub(crate) async fn fetch_required_at<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    collection: &'static str,
    id: &str,
) -> Result<(T, u64), ClubError> {
    let snap = store.query(collection, &[]).await?;
    let doc = snap
        .docs
        .iter()
        .find(|d| d.id == id)
        .ok_or_else(|| ClubError::NotFound {
            collection,
            id: id.to_string(),
        })?;
    Ok((doc.decode()?, snap.revision))
}

/// Resolve a user by their stable unique id (user documents are keyed by
/// email, so this is a query, not a get).
pub(crate) async fn find_user_by_unique_id(
    store: &dyn DocumentStore,
    user_id: &str,
) -> Result<Option<User>, StoreError> {
    let snap = store
        .query(collections::USERS, &[Filter::eq("uniqueId", user_id)])
        .await?;
    match snap.docs.first() {
        Some(doc) => Ok(Some(doc.decode()?)),
        None => Ok(None),
    }
}

/// Like [`find_user_by_unique_id`], but absent users are an error.
pub(crate) async fn require_user_by_unique_id(
    store: &dyn DocumentStore,
    user_id: &str,
) -> Result<User, ClubError> {
    find_user_by_unique_id(store, user_id)
        .await?
        .ok_or_else(|| ClubError::NotFound {
            collection: collections::USERS,
            id: user_id.to_string(),
        })
}
