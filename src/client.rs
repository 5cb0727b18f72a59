//! One player's view of one match, kept in sync with the shared store.
//!
//! Every mutating call runs as a single atomic transaction: the current record
//! is decoded, the pure [`Match`] operation is applied and the re-encoded
//! record is committed. A rejected action aborts the transaction, so nothing is
//! written. Only a store-level conflict is retried, by re-reading and
//! re-evaluating the action, up to [`ClientConfig::max_commit_attempts`].

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::common::{MatchError, ShotOutcome};
use crate::config::{ClientConfig, GAMES_COLLECTION};
use crate::game::{Match, MatchId, Placed, Readiness};
use crate::gateway::{Commit, Fields, Filter, Record, Subscription, SyncError, SyncGateway};
use crate::player::PlayerId;
use crate::record::RecordError;

/// Errors surfaced by [`MatchClient`] and [`crate::Lobby`].
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("rejected: {0}")]
    Rejected(#[from] MatchError),
    #[error("store error: {0}")]
    Sync(#[from] SyncError),
    #[error("bad record: {0}")]
    Record(#[from] RecordError),
    #[error("the match kept changing ({attempts} attempts), try again")]
    TryAgain { attempts: u32 },
}

impl ClientError {
    /// The engine refused the action itself, as opposed to a store failure.
    pub fn rejection(&self) -> Option<&MatchError> {
        match self {
            ClientError::Rejected(err) => Some(err),
            _ => None,
        }
    }
}

pub struct MatchClient {
    gateway: Arc<dyn SyncGateway>,
    me: PlayerId,
    match_id: MatchId,
    config: ClientConfig,
    projection: Option<Match>,
}

impl fmt::Debug for MatchClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatchClient")
            .field("me", &self.me)
            .field("match_id", &self.match_id)
            .field("config", &self.config)
            .field("projection", &self.projection)
            .finish_non_exhaustive()
    }
}

impl MatchClient {
    pub fn new(
        gateway: Arc<dyn SyncGateway>,
        me: PlayerId,
        match_id: MatchId,
        config: ClientConfig,
    ) -> Self {
        Self {
            gateway,
            me,
            match_id,
            config,
            projection: None,
        }
    }

    pub fn me(&self) -> &PlayerId {
        &self.me
    }

    pub fn match_id(&self) -> &MatchId {
        &self.match_id
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Latest known state of the match. May lag behind the store.
    pub fn projection(&self) -> Option<&Match> {
        self.projection.as_ref()
    }

    /// Re-read the match from the store.
    pub async fn refresh(&mut self) -> Result<&Match, ClientError> {
        let record = self
            .gateway
            .get_record(GAMES_COLLECTION, self.match_id.as_str())
            .await?;
        let decoded = Match::from_fields(self.match_id.clone(), &record.fields)?;
        Ok(self.projection.insert(decoded))
    }

    /// Subscribe to changes of this match.
    pub async fn subscribe(&self) -> Result<Subscription, ClientError> {
        let filter = Filter::Id(self.match_id.to_string());
        Ok(self.gateway.subscribe(GAMES_COLLECTION, filter).await?)
    }

    /// Fold a pushed snapshot into the projection. Returns `None` when the
    /// match is no longer in the snapshot, i.e. it was declined or removed.
    pub fn reconcile(&mut self, snapshot: &[Record]) -> Result<Option<&Match>, ClientError> {
        match snapshot.iter().find(|r| r.id == self.match_id.as_str()) {
            Some(record) => {
                let decoded = Match::from_fields(self.match_id.clone(), &record.fields)?;
                Ok(Some(self.projection.insert(decoded)))
            }
            None => {
                self.projection = None;
                Ok(None)
            }
        }
    }

    /// Wait for the next pushed snapshot and reconcile it.
    pub async fn next_update(
        &mut self,
        subscription: &mut Subscription,
    ) -> Result<Option<&Match>, ClientError> {
        let snapshot = subscription
            .next()
            .await
            .ok_or_else(|| SyncError::Transport("subscription closed".to_string()))?;
        self.reconcile(&snapshot)
    }

    /// Accept the invite this match represents.
    pub async fn accept(&mut self) -> Result<(), ClientError> {
        self.commit("accept", |m, me| m.accept(me)).await
    }

    /// Decline the invite; the match record is deleted.
    ///
    /// The store has no conditional delete, so unlike the other actions this
    /// is a fresh read followed by a separate delete. Only the invitee may
    /// decline and only the invitee can leave the invite phase, so the one
    /// write that can slip in between is the invitee's own accept from
    /// another session.
    pub async fn decline(&mut self) -> Result<(), ClientError> {
        let me = self.me.clone();
        self.refresh().await?.check_decline(&me)?;
        self.gateway
            .delete_record(GAMES_COLLECTION, self.match_id.as_str())
            .await?;
        log::info!("{} declined match {}", self.me, self.match_id);
        self.projection = None;
        Ok(())
    }

    /// Place the next ship of the fleet on the run from `start` to `end`.
    pub async fn place(&mut self, start: usize, end: usize) -> Result<Placed, ClientError> {
        let rules = self.config.rules;
        self.commit("place", move |m, me| m.place(me, start, end, rules))
            .await
    }

    /// Signal that the fleet is final. Safe to repeat.
    pub async fn set_ready(&mut self) -> Result<Readiness, ClientError> {
        self.commit("set_ready", |m, me| m.set_ready(me)).await
    }

    /// Fire at `index` on the opponent's board.
    pub async fn fire(&mut self, index: usize) -> Result<ShotOutcome, ClientError> {
        self.commit("fire", move |m, me| m.fire(me, index)).await
    }

    async fn commit<T, F>(&mut self, what: &'static str, mut action: F) -> Result<T, ClientError>
    where
        T: Send,
        F: FnMut(&mut Match, &PlayerId) -> Result<T, MatchError> + Send,
    {
        // The projection may be stale; the action is only ever judged against
        // the record read inside the transaction.
        let attempts = self.config.max_commit_attempts.max(1);
        for attempt in 1..=attempts {
            let match_id = self.match_id.clone();
            let me = self.me.clone();
            let mut outcome: Option<Result<(T, Match), ClientError>> = None;
            let mut update = |fields: &Fields| -> Option<Fields> {
                let applied = Match::from_fields(match_id.clone(), fields)
                    .map_err(ClientError::from)
                    .and_then(|mut m| {
                        let value = action(&mut m, &me)?;
                        let fields = m.to_fields()?;
                        Ok((value, m, fields))
                    });
                match applied {
                    Ok((value, m, fields)) => {
                        outcome = Some(Ok((value, m)));
                        Some(fields)
                    }
                    Err(err) => {
                        outcome = Some(Err(err));
                        None
                    }
                }
            };

            let committed = self
                .gateway
                .run_atomic(GAMES_COLLECTION, self.match_id.as_str(), &mut update)
                .await;
            match committed {
                Ok(Commit::Applied) => {
                    let (value, m) = outcome
                        .ok_or_else(|| SyncError::Transport("commit without an update".to_string()))??;
                    log::debug!("{} {} committed on {}", self.me, what, self.match_id);
                    self.projection = Some(m);
                    return Ok(value);
                }
                Ok(Commit::Aborted) => {
                    let err = match outcome {
                        Some(Err(err)) => err,
                        _ => SyncError::Transport("transaction aborted by the store".to_string()).into(),
                    };
                    log::warn!("{} {} rejected: {}", self.me, what, err);
                    return Err(err);
                }
                Err(SyncError::Conflict) => {
                    log::info!(
                        "{} {} conflicted on {} (attempt {}/{})",
                        self.me,
                        what,
                        self.match_id,
                        attempt,
                        attempts
                    );
                }
                Err(err) => return Err(err.into()),
            }
        }
        Err(ClientError::TryAgain { attempts })
    }
}
