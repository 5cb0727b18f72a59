//! Player registration, presence and challenges.

use std::sync::Arc;

use serde_json::Value;

use crate::client::{ClientError, MatchClient};
use crate::config::{ClientConfig, GAMES_COLLECTION, PLAYERS_COLLECTION};
use crate::common::MatchError;
use crate::game::{Match, MatchId, Phase};
use crate::gateway::{Filter, Record, Subscription, SyncError, SyncGateway};
use crate::player::{Player, PlayerId};
use crate::record::{from_fields, to_fields, PlayerRecord, RecordError};

/// An open invite addressed to the local player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invite {
    pub match_id: MatchId,
    pub challenger: PlayerId,
}

/// Lobby session of one registered player.
pub struct Lobby {
    gateway: Arc<dyn SyncGateway>,
    player: Player,
    config: ClientConfig,
}

impl Lobby {
    /// Sign in as `name`: reuse the player record with that name if there is
    /// one, otherwise create it. Either way the player is marked online.
    pub async fn register(
        gateway: Arc<dyn SyncGateway>,
        name: &str,
        config: ClientConfig,
    ) -> Result<Self, ClientError> {
        let existing = lookup(
            gateway.as_ref(),
            PLAYERS_COLLECTION,
            Filter::equals("name", name),
        )
        .await?;

        let record = PlayerRecord {
            name: name.to_string(),
            is_online: true,
        };
        let id = match existing.first() {
            Some(found) => {
                gateway
                    .update_record(PLAYERS_COLLECTION, &found.id, to_fields(&record)?)
                    .await?;
                log::info!("{} signed back in as {}", name, found.id);
                found.id.clone()
            }
            None => {
                let id = gateway.put_record(PLAYERS_COLLECTION, to_fields(&record)?).await?;
                log::info!("registered {} as {}", name, id);
                id
            }
        };
        Ok(Self {
            gateway,
            player: Player::from_record(PlayerId::new(id), record),
            config,
        })
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn id(&self) -> &PlayerId {
        &self.player.id
    }

    /// Publish presence.
    pub async fn set_online(&mut self, online: bool) -> Result<(), ClientError> {
        let mut fields = crate::gateway::Fields::new();
        fields.insert("isOnline".to_string(), Value::Bool(online));
        self.gateway
            .update_record(PLAYERS_COLLECTION, self.player.id.as_str(), fields)
            .await?;
        self.player.online = online;
        Ok(())
    }

    /// Stream of online players.
    pub async fn subscribe_online(&self) -> Result<Subscription, ClientError> {
        Ok(self
            .gateway
            .subscribe(PLAYERS_COLLECTION, Filter::equals("isOnline", true))
            .await?)
    }

    /// Online players in `snapshot` other than the local one.
    pub fn online_players(&self, snapshot: &[Record]) -> Result<Vec<Player>, RecordError> {
        let mut players = Vec::new();
        for record in snapshot {
            if record.id == self.player.id.as_str() {
                continue;
            }
            let decoded: PlayerRecord = from_fields(&record.fields)?;
            if decoded.is_online {
                players.push(Player::from_record(PlayerId::new(record.id.clone()), decoded));
            }
        }
        Ok(players)
    }

    /// Unfinished match between the local player and `opponent`, in either
    /// seat. Records that fail to decode are skipped.
    pub async fn active_match_with(
        &self,
        opponent: &PlayerId,
    ) -> Result<Option<MatchId>, ClientError> {
        for (challenger, invitee) in [(self.id(), opponent), (opponent, self.id())] {
            let filter = Filter::equals("playerId1", challenger.as_str());
            let snapshot = lookup(self.gateway.as_ref(), GAMES_COLLECTION, filter).await?;
            let found = decode_matches(&snapshot)
                .find(|m| m.player_b() == invitee && !m.is_finished())
                .map(|m| m.id().clone());
            if found.is_some() {
                return Ok(found);
            }
        }
        Ok(None)
    }

    /// Invite `opponent` to a new match. The caller becomes player A. Refused
    /// while the two already share an unfinished match.
    pub async fn challenge(&self, opponent: &PlayerId) -> Result<MatchClient, ClientError> {
        self.gateway
            .get_record(PLAYERS_COLLECTION, opponent.as_str())
            .await?;
        if let Some(existing) = self.active_match_with(opponent).await? {
            log::info!("{} already plays {} in {}", self.player.id, opponent, existing);
            return Err(MatchError::AlreadyInGame.into());
        }
        let invite = Match::invite(MatchId::new(""), self.player.id.clone(), opponent.clone())?;
        let id = self
            .gateway
            .put_record(GAMES_COLLECTION, invite.to_fields()?)
            .await?;
        log::info!("{} challenged {} in {}", self.player.id, opponent, id);
        Ok(self.join(MatchId::new(id)))
    }

    /// Stream of match records where the local player is the invitee.
    pub async fn subscribe_invites(&self) -> Result<Subscription, ClientError> {
        let filter = Filter::equals("playerId2", self.player.id.as_str());
        Ok(self.gateway.subscribe(GAMES_COLLECTION, filter).await?)
    }

    /// Open invites addressed to the local player in `snapshot`. Records that
    /// fail to decode are skipped.
    pub fn pending_invites(&self, snapshot: &[Record]) -> Vec<Invite> {
        decode_matches(snapshot)
            .filter(|m| *m.phase() == Phase::Invite && m.player_b() == self.id())
            .map(|m| Invite {
                match_id: m.id().clone(),
                challenger: m.player_a().clone(),
            })
            .collect()
    }

    /// Client for an existing match.
    pub fn join(&self, match_id: MatchId) -> MatchClient {
        MatchClient::new(
            self.gateway.clone(),
            self.player.id.clone(),
            match_id,
            self.config,
        )
    }
}

/// Current snapshot of `collection` restricted to `filter`.
async fn lookup(
    gateway: &dyn SyncGateway,
    collection: &str,
    filter: Filter,
) -> Result<Vec<Record>, ClientError> {
    let mut subscription = gateway.subscribe(collection, filter).await?;
    let snapshot = subscription
        .next()
        .await
        .ok_or_else(|| SyncError::Transport("subscription closed".to_string()))?;
    Ok(snapshot)
}

fn decode_matches(snapshot: &[Record]) -> impl Iterator<Item = Match> + '_ {
    snapshot.iter().filter_map(|record| {
        let id = MatchId::new(record.id.clone());
        match Match::from_fields(id, &record.fields) {
            Ok(m) => Some(m),
            Err(err) => {
                log::warn!("skipping match record {}: {}", record.id, err);
                None
            }
        }
    })
}
