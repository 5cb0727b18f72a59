//! Contract of the document store the engine persists matches through.
//!
//! The store keeps schemaless records in named collections, supports
//! conditional read-modify-write transactions and pushes full collection
//! snapshots to subscribers.

use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::mpsc;

pub mod in_memory;

/// Field map of one schemaless record.
pub type Fields = Map<String, Value>;

/// Id assigned by the store when a record is created.
pub type RecordId = String;

/// A record together with its id.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: RecordId,
    pub fields: Fields,
}

/// Every record of a collection that matches a subscription's filter.
pub type Snapshot = Vec<Record>;

/// Which records a subscription reports.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    All,
    /// Only the record with this id.
    Id(RecordId),
    /// Records whose `field` equals `value`.
    Equals { field: String, value: Value },
}

impl Filter {
    pub fn equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Equals {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Filter::All => true,
            Filter::Id(id) => record.id == *id,
            Filter::Equals { field, value } => record.fields.get(field) == Some(value),
        }
    }
}

/// Errors reported by a gateway.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// The record changed between the read and the commit of a transaction.
    #[error("record was modified concurrently")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("transport failure: {0}")]
    Transport(String),
}

/// How a transaction ended when the store itself did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commit {
    /// The update was written.
    Applied,
    /// The update function declined to write.
    Aborted,
}

/// Stream of snapshots for one subscription. Dropping it cancels the
/// subscription.
#[derive(Debug)]
pub struct Subscription {
    rx: mpsc::UnboundedReceiver<Snapshot>,
}

impl Subscription {
    pub fn new(rx: mpsc::UnboundedReceiver<Snapshot>) -> Self {
        Self { rx }
    }

    /// Wait for the next snapshot. `None` once the store closed the stream.
    pub async fn next(&mut self) -> Option<Snapshot> {
        self.rx.recv().await
    }

    /// Next queued snapshot, without waiting.
    pub fn try_next(&mut self) -> Option<Snapshot> {
        self.rx.try_recv().ok()
    }

    /// Skip to the most recent queued snapshot, without waiting.
    pub fn latest(&mut self) -> Option<Snapshot> {
        let mut last = None;
        while let Ok(snapshot) = self.rx.try_recv() {
            last = Some(snapshot);
        }
        last
    }
}

/// Document store used by the engine.
///
/// Implementations never retry on their own; [`SyncError::Conflict`] is
/// returned to the caller, who decides whether to re-run the transaction.
#[async_trait::async_trait]
pub trait SyncGateway: Send + Sync {
    async fn get_record(&self, collection: &str, id: &str) -> Result<Record, SyncError>;

    /// Create a record and return the id the store assigned to it.
    async fn put_record(&self, collection: &str, fields: Fields) -> Result<RecordId, SyncError>;

    /// Merge `fields` into an existing record.
    async fn update_record(&self, collection: &str, id: &str, fields: Fields)
        -> Result<(), SyncError>;

    async fn delete_record(&self, collection: &str, id: &str) -> Result<(), SyncError>;

    /// Read the record, pass its fields to `update` and commit the returned
    /// fields (merged) only if the record did not change meanwhile. `update`
    /// returning `None` aborts without writing.
    async fn run_atomic(
        &self,
        collection: &str,
        id: &str,
        update: &mut (dyn for<'f> FnMut(&'f Fields) -> Option<Fields> + Send),
    ) -> Result<Commit, SyncError>;

    /// Subscribe to a collection. The current snapshot is delivered first,
    /// then a fresh one after every change.
    async fn subscribe(&self, collection: &str, filter: Filter) -> Result<Subscription, SyncError>;
}
