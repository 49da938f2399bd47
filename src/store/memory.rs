//! In-memory document store: backs the single-process binary and doubles
//! as the test store.

use crate::store::{
    Document, DocumentStore, Filter, Patch, QuerySnapshot, StoreError, Subscription,
};
use async_trait::async_trait;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::mpsc;

/// Minted document ids look like the backend's: 20 alphanumeric chars.
const DOC_ID_LEN: usize = 20;

#[derive(Default)]
struct Collection {
    docs: BTreeMap<String, Map<String, Value>>,
    revision: u64,
}

struct Watcher {
    collection: String,
    filters: Vec<Filter>,
    tx: mpsc::UnboundedSender<QuerySnapshot>,
}

#[derive(Default)]
struct Shared {
    collections: HashMap<String, Collection>,
    watchers: Vec<Watcher>,
}

/// In-memory [`DocumentStore`]: JSON documents per collection behind one
/// `RwLock`, a monotonic revision per collection, and watcher channels fed
/// on every write that touches their query.
#[derive(Default)]
pub struct MemoryStore {
    shared: RwLock<Shared>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn mint_doc_id() -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(DOC_ID_LEN)
            .map(char::from)
            .collect()
    }

    fn read_shared(&self) -> Result<RwLockReadGuard<'_, Shared>, StoreError> {
        self.shared
            .read()
            .map_err(|_| StoreError::Backend("store lock poisoned".to_string()))
    }

    fn write_shared(&self) -> Result<RwLockWriteGuard<'_, Shared>, StoreError> {
        self.shared
            .write()
            .map_err(|_| StoreError::Backend("store lock poisoned".to_string()))
    }

    fn put_inner(
        &self,
        collection: &str,
        id: Option<&str>,
        data: Map<String, Value>,
        expected_revision: Option<u64>,
    ) -> Result<String, StoreError> {
        let mut shared = self.write_shared()?;
        let col = shared.collections.entry(collection.to_string()).or_default();
        if let Some(expected) = expected_revision {
            if col.revision != expected {
                return Err(StoreError::Conflict {
                    collection: collection.to_string(),
                    expected,
                    actual: col.revision,
                });
            }
        }
        let id = match id {
            Some(id) => id.to_string(),
            None => Self::mint_doc_id(),
        };
        let before = col.docs.insert(id.clone(), data.clone());
        col.revision += 1;
        notify_watchers(&mut shared, collection, before.as_ref(), Some(&data));
        Ok(id)
    }

    fn update_inner(
        &self,
        collection: &str,
        id: &str,
        patch: Patch,
        expected_revision: Option<u64>,
    ) -> Result<(), StoreError> {
        let mut shared = self.write_shared()?;
        let col = shared.collections.entry(collection.to_string()).or_default();
        if let Some(expected) = expected_revision {
            if col.revision != expected {
                return Err(StoreError::Conflict {
                    collection: collection.to_string(),
                    expected,
                    actual: col.revision,
                });
            }
        }
        let Some(data) = col.docs.get_mut(id) else {
            return Err(StoreError::Missing {
                collection: collection.to_string(),
                id: id.to_string(),
            });
        };
        let before = data.clone();
        patch.apply(data);
        let after = data.clone();
        col.revision += 1;
        notify_watchers(&mut shared, collection, Some(&before), Some(&after));
        Ok(())
    }
}

fn matches_all(filters: &[Filter], data: &Map<String, Value>) -> bool {
    filters.iter().all(|f| f.matches(data))
}

fn snapshot_for(col: Option<&Collection>, filters: &[Filter]) -> QuerySnapshot {
    match col {
        Some(col) => QuerySnapshot {
            docs: col
                .docs
                .iter()
                .filter(|(_, data)| matches_all(filters, data))
                .map(|(id, data)| Document {
                    id: id.clone(),
                    data: data.clone(),
                })
                .collect(),
            revision: col.revision,
        },
        None => QuerySnapshot {
            docs: Vec::new(),
            revision: 0,
        },
    }
}

/// Push a fresh snapshot to every watcher whose query is touched by a write
/// (the document matched before, or matches now). Watchers whose receiver
/// is gone are dropped here.
fn notify_watchers(
    shared: &mut Shared,
    collection: &str,
    before: Option<&Map<String, Value>>,
    after: Option<&Map<String, Value>>,
) {
    let Shared {
        collections,
        watchers,
    } = shared;
    let col = collections.get(collection);
    watchers.retain(|w| {
        if w.collection != collection {
            return true;
        }
        let touched = before.is_some_and(|data| matches_all(&w.filters, data))
            || after.is_some_and(|data| matches_all(&w.filters, data));
        if !touched {
            return true;
        }
        w.tx.send(snapshot_for(col, &w.filters)).is_ok()
    });
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let shared = self.read_shared()?;
        Ok(shared
            .collections
            .get(collection)
            .and_then(|col| col.docs.get(id))
            .map(|data| Document {
                id: id.to_string(),
                data: data.clone(),
            }))
    }

    async fn query(
        &self,
        collection: &str,
        filters: &[Filter],
    ) -> Result<QuerySnapshot, StoreError> {
        let shared = self.read_shared()?;
        Ok(snapshot_for(shared.collections.get(collection), filters))
    }

    async fn put(
        &self,
        collection: &str,
        id: Option<&str>,
        data: Map<String, Value>,
    ) -> Result<String, StoreError> {
        self.put_inner(collection, id, data, None)
    }

    async fn put_checked(
        &self,
        collection: &str,
        id: Option<&str>,
        data: Map<String, Value>,
        expected_revision: u64,
    ) -> Result<String, StoreError> {
        self.put_inner(collection, id, data, Some(expected_revision))
    }

    async fn update(&self, collection: &str, id: &str, patch: Patch) -> Result<(), StoreError> {
        self.update_inner(collection, id, patch, None)
    }

    async fn update_checked(
        &self,
        collection: &str,
        id: &str,
        patch: Patch,
        expected_revision: u64,
    ) -> Result<(), StoreError> {
        self.update_inner(collection, id, patch, Some(expected_revision))
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let mut shared = self.write_shared()?;
        let Some(col) = shared.collections.get_mut(collection) else {
            return Ok(());
        };
        let Some(before) = col.docs.remove(id) else {
            return Ok(());
        };
        col.revision += 1;
        notify_watchers(&mut shared, collection, Some(&before), None);
        Ok(())
    }

    async fn subscribe(
        &self,
        collection: &str,
        filters: Vec<Filter>,
    ) -> Result<Subscription, StoreError> {
        let mut shared = self.write_shared()?;
        let (tx, rx) = mpsc::unbounded_channel();
        let initial = snapshot_for(shared.collections.get(collection), &filters);
        let _ = tx.send(initial);
        shared.watchers.push(Watcher {
            collection: collection.to_string(),
            filters,
            tx,
        });
        Ok(Subscription::new(rx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("test data must be an object"),
        }
    }

    #[tokio::test]
    async fn put_mints_distinct_document_ids() {
        let store = MemoryStore::new();
        let a = store
            .put("events", None, data(json!({"title": "A"})))
            .await
            .unwrap();
        let b = store
            .put("events", None, data(json!({"title": "B"})))
            .await
            .unwrap();
        assert_eq!(a.len(), DOC_ID_LEN);
        assert_ne!(a, b);

        let doc = store.get("events", &a).await.unwrap().unwrap();
        assert_eq!(doc.data["title"], json!("A"));
    }

    #[tokio::test]
    async fn query_applies_all_filters() {
        let store = MemoryStore::new();
        store
            .put(
                "users",
                Some("a@club.test"),
                data(json!({"userType": "coach", "status": "approved", "selectedGames": ["Tennis"]})),
            )
            .await
            .unwrap();
        store
            .put(
                "users",
                Some("b@club.test"),
                data(json!({"userType": "coach", "status": "pending", "selectedGames": ["Football"]})),
            )
            .await
            .unwrap();
        store
            .put(
                "users",
                Some("c@club.test"),
                data(json!({"userType": "player", "status": "approved", "selectedGames": ["Tennis"]})),
            )
            .await
            .unwrap();

        let approved_coaches = store
            .query(
                "users",
                &[
                    Filter::eq("userType", "coach"),
                    Filter::eq("status", "approved"),
                ],
            )
            .await
            .unwrap();
        assert_eq!(approved_coaches.docs.len(), 1);
        assert_eq!(approved_coaches.docs[0].id, "a@club.test");

        let tennis = store
            .query("users", &[Filter::array_contains("selectedGames", "Tennis")])
            .await
            .unwrap();
        assert_eq!(tennis.docs.len(), 2);

        let any = store
            .query(
                "users",
                &[Filter::array_contains_any(
                    "selectedGames",
                    vec![json!("Tennis"), json!("Football")],
                )],
            )
            .await
            .unwrap();
        assert_eq!(any.docs.len(), 3);
    }

    #[tokio::test]
    async fn update_misses_loudly_and_patches_in_order() {
        let store = MemoryStore::new();
        let missing = store
            .update("teams", "nope", Patch::new().set("name", "X"))
            .await;
        assert!(matches!(missing, Err(StoreError::Missing { .. })));

        let id = store
            .put("teams", None, data(json!({"name": "A", "participants": ["p1"]})))
            .await
            .unwrap();
        store
            .update(
                "teams",
                &id,
                Patch::new()
                    .set("name", "B")
                    .array_union("participants", vec![json!("p2"), json!("p1")])
                    .array_remove("participants", vec![json!("p1")]),
            )
            .await
            .unwrap();
        let doc = store.get("teams", &id).await.unwrap().unwrap();
        assert_eq!(doc.data["name"], json!("B"));
        assert_eq!(doc.data["participants"], json!(["p2"]));
    }

    #[tokio::test]
    async fn array_union_skips_values_already_present() {
        let store = MemoryStore::new();
        let id = store
            .put("events", None, data(json!({"participants": ["p1"]})))
            .await
            .unwrap();
        store
            .update(
                "events",
                &id,
                Patch::new().array_union("participants", vec![json!("p1")]),
            )
            .await
            .unwrap();
        let doc = store.get("events", &id).await.unwrap().unwrap();
        assert_eq!(doc.data["participants"], json!(["p1"]));
    }

    #[tokio::test]
    async fn checked_writes_fail_once_the_collection_moves() {
        let store = MemoryStore::new();
        let read = store.query("teams", &[]).await.unwrap();
        assert_eq!(read.revision, 0);

        store
            .put("teams", None, data(json!({"name": "A"})))
            .await
            .unwrap();

        let stale = store
            .put_checked("teams", None, data(json!({"name": "B"})), read.revision)
            .await;
        assert!(matches!(
            stale,
            Err(StoreError::Conflict {
                expected: 0,
                actual: 1,
                ..
            })
        ));

        let fresh = store.query("teams", &[]).await.unwrap();
        let ok = store
            .put_checked("teams", None, data(json!({"name": "B"})), fresh.revision)
            .await;
        assert!(ok.is_ok());
    }

    #[tokio::test]
    async fn subscriptions_see_the_initial_set_and_matching_writes() {
        let store = MemoryStore::new();
        store
            .put("matches", Some("m1"), data(json!({"status": "scheduled"})))
            .await
            .unwrap();

        let mut sub = store
            .subscribe("matches", vec![Filter::eq("status", "scheduled")])
            .await
            .unwrap();
        let initial = sub.recv().await.unwrap();
        assert_eq!(initial.docs.len(), 1);

        // A write leaving the matched set still notifies (set shrinks).
        store
            .update("matches", "m1", Patch::new().set("status", "completed"))
            .await
            .unwrap();
        let after = sub.recv().await.unwrap();
        assert!(after.docs.is_empty());

        // A write never touching the matched set stays silent.
        store
            .put("matches", Some("m2"), data(json!({"status": "completed"})))
            .await
            .unwrap();
        store
            .put("matches", Some("m3"), data(json!({"status": "scheduled"})))
            .await
            .unwrap();
        let next = sub.recv().await.unwrap();
        assert_eq!(next.docs.len(), 1);
        assert_eq!(next.docs[0].id, "m3");
    }
}
