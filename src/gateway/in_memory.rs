use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;

use super::{Commit, Fields, Filter, Record, RecordId, Snapshot, Subscription, SyncError, SyncGateway};

struct Doc {
    version: u64,
    fields: Fields,
}

struct Subscriber {
    collection: String,
    filter: Filter,
    tx: mpsc::UnboundedSender<Snapshot>,
}

#[derive(Default)]
struct Store {
    collections: HashMap<String, BTreeMap<RecordId, Doc>>,
    subscribers: Vec<Subscriber>,
    next_id: u64,
    writes: u64,
    pending_conflicts: u32,
    offline: bool,
}

impl Store {
    fn check_online(&self) -> Result<(), SyncError> {
        if self.offline {
            Err(SyncError::Transport("store is offline".to_string()))
        } else {
            Ok(())
        }
    }

    fn doc_mut(&mut self, collection: &str, id: &str) -> Result<&mut Doc, SyncError> {
        self.collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or(SyncError::NotFound)
    }

    fn snapshot(&self, collection: &str, filter: &Filter) -> Snapshot {
        self.collections
            .get(collection)
            .into_iter()
            .flat_map(|docs| docs.iter())
            .map(|(id, doc)| Record {
                id: id.clone(),
                fields: doc.fields.clone(),
            })
            .filter(|record| filter.matches(record))
            .collect()
    }

    /// Push a fresh snapshot to every subscriber of `collection`, dropping
    /// subscribers whose receiver is gone.
    fn notify(&mut self, collection: &str) {
        self.writes += 1;
        let subscribers = std::mem::take(&mut self.subscribers);
        self.subscribers = subscribers
            .into_iter()
            .filter(|sub| {
                if sub.collection != collection {
                    return true;
                }
                sub.tx.send(self.snapshot(collection, &sub.filter)).is_ok()
            })
            .collect();
    }
}

fn merge(target: &mut Fields, fields: Fields) {
    for (key, value) in fields {
        target.insert(key, value);
    }
}

/// Document store kept in process memory. Clones share the same store, so
/// one instance can stand in for the remote database of several clients.
#[derive(Clone, Default)]
pub struct InMemoryGateway {
    store: Arc<Mutex<Store>>,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Store>, SyncError> {
        self.store
            .lock()
            .map_err(|_| SyncError::Transport("store lock poisoned".to_string()))
    }

    /// Make the next `n` transaction commits fail as if another writer got
    /// there first.
    pub fn inject_conflicts(&self, n: u32) {
        if let Ok(mut store) = self.lock() {
            store.pending_conflicts = n;
        }
    }

    /// While offline every call fails with [`SyncError::Transport`].
    pub fn set_offline(&self, offline: bool) {
        if let Ok(mut store) = self.lock() {
            store.offline = offline;
        }
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> u64 {
        self.lock().map(|store| store.writes).unwrap_or(0)
    }

    /// Live subscriptions across all collections.
    pub fn subscriber_count(&self) -> usize {
        self.lock()
            .map(|store| store.subscribers.iter().filter(|s| !s.tx.is_closed()).count())
            .unwrap_or(0)
    }
}

#[async_trait::async_trait]
impl SyncGateway for InMemoryGateway {
    async fn get_record(&self, collection: &str, id: &str) -> Result<Record, SyncError> {
        let mut store = self.lock()?;
        store.check_online()?;
        let doc = store.doc_mut(collection, id)?;
        Ok(Record {
            id: id.to_string(),
            fields: doc.fields.clone(),
        })
    }

    async fn put_record(&self, collection: &str, fields: Fields) -> Result<RecordId, SyncError> {
        let mut store = self.lock()?;
        store.check_online()?;
        store.next_id += 1;
        let id = format!("{}-{}", collection, store.next_id);
        store
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), Doc { version: 0, fields });
        log::debug!("gateway: created {}/{}", collection, id);
        store.notify(collection);
        Ok(id)
    }

    async fn update_record(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> Result<(), SyncError> {
        let mut store = self.lock()?;
        store.check_online()?;
        let doc = store.doc_mut(collection, id)?;
        merge(&mut doc.fields, fields);
        doc.version += 1;
        log::debug!("gateway: updated {}/{}", collection, id);
        store.notify(collection);
        Ok(())
    }

    async fn delete_record(&self, collection: &str, id: &str) -> Result<(), SyncError> {
        let mut store = self.lock()?;
        store.check_online()?;
        store
            .collections
            .get_mut(collection)
            .and_then(|docs| docs.remove(id))
            .ok_or(SyncError::NotFound)?;
        log::debug!("gateway: deleted {}/{}", collection, id);
        store.notify(collection);
        Ok(())
    }

    async fn run_atomic(
        &self,
        collection: &str,
        id: &str,
        update: &mut (dyn for<'f> FnMut(&'f Fields) -> Option<Fields> + Send),
    ) -> Result<Commit, SyncError> {
        let (version, current) = {
            let mut store = self.lock()?;
            store.check_online()?;
            let doc = store.doc_mut(collection, id)?;
            (doc.version, doc.fields.clone())
        };

        let Some(fields) = update(&current) else {
            return Ok(Commit::Aborted);
        };

        let mut store = self.lock()?;
        store.check_online()?;
        if store.pending_conflicts > 0 {
            store.pending_conflicts -= 1;
            store.doc_mut(collection, id)?.version += 1;
            log::debug!("gateway: injected conflict on {}/{}", collection, id);
            return Err(SyncError::Conflict);
        }
        let doc = store.doc_mut(collection, id)?;
        if doc.version != version {
            return Err(SyncError::Conflict);
        }
        merge(&mut doc.fields, fields);
        doc.version += 1;
        log::debug!("gateway: committed {}/{} at version {}", collection, id, doc.version);
        store.notify(collection);
        Ok(Commit::Applied)
    }

    async fn subscribe(&self, collection: &str, filter: Filter) -> Result<Subscription, SyncError> {
        let mut store = self.lock()?;
        store.check_online()?;
        let (tx, rx) = mpsc::unbounded_channel();
        // The receiver is alive, so the first send cannot fail.
        let _ = tx.send(store.snapshot(collection, &filter));
        store.subscribers.push(Subscriber {
            collection: collection.to_string(),
            filter,
            tx,
        });
        Ok(Subscription::new(rx))
    }
}
