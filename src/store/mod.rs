//! Persistence collaborator: a document database reduced to the handful of
//! operations the club code uses, plus the in-memory implementation that
//! backs the binary and the tests.

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::mpsc;

/// Collection names used by the club.
pub mod collections {
    pub const USERS: &str = "users";
    pub const EVENTS: &str = "events";
    pub const TEAMS: &str = "teams";
    pub const MATCHES: &str = "matches";
    pub const APPROVAL_REQUESTS: &str = "approvalRequests";
}

/// Errors from the persistence boundary. Surfaced to callers unchanged;
/// nothing here retries.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Update target does not exist.
    #[error("document {collection}/{id} does not exist")]
    Missing { collection: String, id: String },
    /// A checked write lost the race: the collection moved past the
    /// revision the caller planned against.
    #[error("write conflict on '{collection}': expected revision {expected}, found {actual}")]
    Conflict {
        collection: String,
        expected: u64,
        actual: u64,
    },
    /// A stored document does not deserialize into the expected record.
    #[error("failed to decode document {id}: {source}")]
    Decode {
        id: String,
        #[source]
        source: serde_json::Error,
    },
    /// A record does not serialize into document data.
    #[error("failed to encode record: {0}")]
    Encode(#[source] serde_json::Error),
    /// Anything the backend itself reports (I/O, lock poisoning, ...).
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// One stored document: its id plus the JSON object it holds.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Map<String, Value>,
}

impl Document {
    /// Decode into a typed record. The document id is exposed to the record
    /// under `"id"`, the way fetched records carry their document id.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        let mut data = self.data.clone();
        data.insert("id".to_string(), Value::String(self.id.clone()));
        serde_json::from_value(Value::Object(data)).map_err(|source| StoreError::Decode {
            id: self.id.clone(),
            source,
        })
    }
}

/// Encode a typed record as document data. A top-level `"id"` field is
/// dropped: the id lives in the document key, not in the data.
pub fn encode<T: Serialize>(record: &T) -> Result<Map<String, Value>, StoreError> {
    match serde_json::to_value(record).map_err(StoreError::Encode)? {
        Value::Object(mut map) => {
            map.remove("id");
            Ok(map)
        }
        _ => Err(StoreError::Encode(serde::ser::Error::custom(
            "record must serialize to a JSON object",
        ))),
    }
}

/// Comparison applied by a [`Filter`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FilterOp {
    /// Field equals the value.
    Eq,
    /// Array field contains the value.
    ArrayContains,
    /// Array field shares at least one element with the (array) value.
    ArrayContainsAny,
}

/// One `(field, op, value)` predicate of a query. All filters of a query
/// must match (AND). Missing fields never match.
#[derive(Clone, Debug, PartialEq)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::Eq,
            value: value.into(),
        }
    }

    pub fn array_contains(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::ArrayContains,
            value: value.into(),
        }
    }

    pub fn array_contains_any(field: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::ArrayContainsAny,
            value: Value::Array(values),
        }
    }

    /// Whether a document's data satisfies this filter.
    pub fn matches(&self, data: &Map<String, Value>) -> bool {
        let Some(actual) = data.get(&self.field) else {
            return false;
        };
        match self.op {
            FilterOp::Eq => actual == &self.value,
            FilterOp::ArrayContains => actual
                .as_array()
                .is_some_and(|array| array.contains(&self.value)),
            FilterOp::ArrayContainsAny => match (actual.as_array(), self.value.as_array()) {
                (Some(array), Some(wanted)) => wanted.iter().any(|v| array.contains(v)),
                _ => false,
            },
        }
    }
}

/// One field operation of a [`Patch`].
#[derive(Clone, Debug, PartialEq)]
pub enum FieldOp {
    /// Replace (or create) the field.
    Set(Value),
    /// Append values not already present to an array field. Creates the
    /// array when the field is missing; replaces a non-array value.
    ArrayUnion(Vec<Value>),
    /// Remove every equal value from an array field.
    ArrayRemove(Vec<Value>),
}

/// Ordered field operations applied by `update`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Patch {
    ops: Vec<(String, FieldOp)>,
}

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.ops.push((field.into(), FieldOp::Set(value.into())));
        self
    }

    pub fn array_union(mut self, field: impl Into<String>, values: Vec<Value>) -> Self {
        self.ops.push((field.into(), FieldOp::ArrayUnion(values)));
        self
    }

    pub fn array_remove(mut self, field: impl Into<String>, values: Vec<Value>) -> Self {
        self.ops.push((field.into(), FieldOp::ArrayRemove(values)));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Apply the operations to document data, in insertion order.
    pub fn apply(&self, data: &mut Map<String, Value>) {
        for (field, op) in &self.ops {
            match op {
                FieldOp::Set(value) => {
                    data.insert(field.clone(), value.clone());
                }
                FieldOp::ArrayUnion(values) => {
                    let entry = data
                        .entry(field.clone())
                        .or_insert_with(|| Value::Array(Vec::new()));
                    if !entry.is_array() {
                        *entry = Value::Array(Vec::new());
                    }
                    if let Some(array) = entry.as_array_mut() {
                        for value in values {
                            if !array.contains(value) {
                                array.push(value.clone());
                            }
                        }
                    }
                }
                FieldOp::ArrayRemove(values) => {
                    if let Some(array) = data.get_mut(field).and_then(Value::as_array_mut) {
                        array.retain(|v| !values.contains(v));
                    }
                }
            }
        }
    }
}

/// Query result: the matching documents plus the collection revision they
/// were read at. The revision is the token for the checked writes.
#[derive(Clone, Debug)]
pub struct QuerySnapshot {
    pub docs: Vec<Document>,
    pub revision: u64,
}

impl QuerySnapshot {
    /// Decode every document into a typed record.
    pub fn decode_all<T: DeserializeOwned>(&self) -> Result<Vec<T>, StoreError> {
        self.docs.iter().map(Document::decode).collect()
    }
}

/// Live query handle: yields the current matching set immediately, then a
/// fresh snapshot after every write that touches it. Dropping the handle
/// unsubscribes.
pub struct Subscription {
    rx: mpsc::UnboundedReceiver<QuerySnapshot>,
}

impl Subscription {
    pub(crate) fn new(rx: mpsc::UnboundedReceiver<QuerySnapshot>) -> Self {
        Self { rx }
    }

    /// Next snapshot, or `None` once the store is gone.
    pub async fn recv(&mut self) -> Option<QuerySnapshot> {
        self.rx.recv().await
    }
}

/// The document database as the club code sees it.
///
/// `put_checked`/`update_checked` are the optimistic-concurrency guards for
/// read-then-write flows: they fail with [`StoreError::Conflict`] when the
/// collection has been written since the caller's read, so the caller can
/// re-read and re-validate instead of clobbering a racing writer.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch one document; `Ok(None)` when absent.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// All documents matching every filter.
    async fn query(
        &self,
        collection: &str,
        filters: &[Filter],
    ) -> Result<QuerySnapshot, StoreError>;

    /// Create or replace a document; mints an id when none is given.
    /// Returns the document id.
    async fn put(
        &self,
        collection: &str,
        id: Option<&str>,
        data: Map<String, Value>,
    ) -> Result<String, StoreError>;

    /// Like `put`, but only if the collection revision still equals
    /// `expected_revision`.
    async fn put_checked(
        &self,
        collection: &str,
        id: Option<&str>,
        data: Map<String, Value>,
        expected_revision: u64,
    ) -> Result<String, StoreError>;

    /// Apply a patch to an existing document. Missing documents fail with
    /// [`StoreError::Missing`].
    async fn update(&self, collection: &str, id: &str, patch: Patch) -> Result<(), StoreError>;

    /// Like `update`, with the revision guard of `put_checked`.
    async fn update_checked(
        &self,
        collection: &str,
        id: &str,
        patch: Patch,
        expected_revision: u64,
    ) -> Result<(), StoreError>;

    /// Delete a document. Deleting an absent document is a no-op.
    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    /// Watch a query for changes.
    async fn subscribe(
        &self,
        collection: &str,
        filters: Vec<Filter>,
    ) -> Result<Subscription, StoreError>;
}
