//! Logical shapes of the records kept in the document store, and their
//! conversion to and from engine types.
//!
//! The store is schemaless; records travel as JSON objects ([`Fields`]) and
//! are decoded here with strict validation: board sizes and cell codes, each
//! fleet being a roster prefix laid out as straight runs, ready players and the
//! phase agreeing with both boards. Placement spacing is not re-checked, since
//! it depends on the rules the players used.

use std::collections::BTreeSet;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::board::Board;
use crate::config::{ships_placed_for, FLEET};
use crate::game::{Match, MatchId, Phase, Seat};
use crate::gateway::Fields;
use crate::player::{Player, PlayerId};

/// Why a persisted record could not be turned into engine state.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("record fields do not match the expected shape: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("record is not a JSON object")]
    NotAnObject,
    #[error("{which} has the wrong size or an unknown cell code")]
    BadBoard { which: &'static str },
    #[error("{which} holds ships that are not a prefix of the fleet")]
    BadFleet { which: &'static str },
    #[error("ready player {0} is not part of the match")]
    UnknownReadyPlayer(PlayerId),
    #[error("inconsistent match record: {0}")]
    Inconsistent(&'static str),
}

/// Persisted phase, with the turn owner or winner folded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameState {
    Invite,
    Placing,
    Player1Turn,
    Player2Turn,
    Player1Won,
    Player2Won,
}

/// Record in the `players` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRecord {
    pub name: String,
    #[serde(default)]
    pub is_online: bool,
}

/// Record in the `games` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecord {
    pub game_state: GameState,
    pub player_id1: PlayerId,
    pub player_id2: PlayerId,
    pub board1: Vec<u8>,
    pub board2: Vec<u8>,
    #[serde(default)]
    pub ready_players: Vec<PlayerId>,
}

/// Serialize a record into store fields.
pub fn to_fields<T: Serialize>(record: &T) -> Result<Fields, RecordError> {
    match serde_json::to_value(record)? {
        Value::Object(fields) => Ok(fields),
        _ => Err(RecordError::NotAnObject),
    }
}

/// Deserialize store fields into a record.
pub fn from_fields<T: DeserializeOwned>(fields: &Fields) -> Result<T, RecordError> {
    Ok(serde_json::from_value(Value::Object(fields.clone()))?)
}

/// Number of roster ships on `board`, provided its ship cells form exactly
/// that prefix of the fleet as straight runs.
fn placed_fleet(board: &Board) -> Option<usize> {
    let placed = ships_placed_for(board.ship_cells())?;
    board.holds_fleet(&FLEET[..placed]).then_some(placed)
}

impl Player {
    pub fn from_record(id: PlayerId, record: PlayerRecord) -> Self {
        Player {
            id,
            display_name: record.name,
            online: record.is_online,
        }
    }

    pub fn to_record(&self) -> PlayerRecord {
        PlayerRecord {
            name: self.display_name.clone(),
            is_online: self.online,
        }
    }
}

impl Match {
    /// Persisted form of this match.
    pub fn to_record(&self) -> MatchRecord {
        let game_state = match self.phase() {
            Phase::Invite => GameState::Invite,
            Phase::Placing => GameState::Placing,
            Phase::Battle { turn } => match self.seat_of_holder(turn) {
                Seat::A => GameState::Player1Turn,
                Seat::B => GameState::Player2Turn,
            },
            Phase::Finished { winner } => match self.seat_of_holder(winner) {
                Seat::A => GameState::Player1Won,
                Seat::B => GameState::Player2Won,
            },
        };
        MatchRecord {
            game_state,
            player_id1: self.player_a().clone(),
            player_id2: self.player_b().clone(),
            board1: self.board(Seat::A).to_codes(),
            board2: self.board(Seat::B).to_codes(),
            ready_players: self.ready_players().iter().cloned().collect(),
        }
    }

    /// Decode and validate a persisted match.
    pub fn from_record(id: MatchId, record: MatchRecord) -> Result<Self, RecordError> {
        let MatchRecord {
            game_state,
            player_id1,
            player_id2,
            board1,
            board2,
            ready_players,
        } = record;
        if player_id1 == player_id2 {
            return Err(RecordError::Inconsistent("both seats hold the same player"));
        }
        let board_a = Board::from_codes(&board1).ok_or(RecordError::BadBoard { which: "board1" })?;
        let board_b = Board::from_codes(&board2).ok_or(RecordError::BadBoard { which: "board2" })?;
        let placed = [
            placed_fleet(&board_a).ok_or(RecordError::BadFleet { which: "board1" })?,
            placed_fleet(&board_b).ok_or(RecordError::BadFleet { which: "board2" })?,
        ];
        let players = [player_id1, player_id2];

        let mut ready = BTreeSet::new();
        for player in ready_players {
            let Some(seat) = players.iter().position(|p| *p == player) else {
                return Err(RecordError::UnknownReadyPlayer(player));
            };
            if placed[seat] != FLEET.len() {
                return Err(RecordError::Inconsistent("ready player has an incomplete fleet"));
            }
            ready.insert(player);
        }

        let phase = match game_state {
            GameState::Invite => Phase::Invite,
            GameState::Placing => Phase::Placing,
            GameState::Player1Turn => Phase::Battle { turn: players[0].clone() },
            GameState::Player2Turn => Phase::Battle { turn: players[1].clone() },
            GameState::Player1Won => Phase::Finished { winner: players[0].clone() },
            GameState::Player2Won => Phase::Finished { winner: players[1].clone() },
        };
        let both_ready = ready.len() == 2;
        let shots = board_a.shots_taken() + board_b.shots_taken();
        match &phase {
            Phase::Invite | Phase::Placing if both_ready => {
                return Err(RecordError::Inconsistent("both players ready outside of battle"));
            }
            Phase::Invite | Phase::Placing if shots > 0 => {
                return Err(RecordError::Inconsistent("shots recorded before battle"));
            }
            Phase::Invite if placed != [0, 0] => {
                return Err(RecordError::Inconsistent("ships placed before the invite was accepted"));
            }
            Phase::Battle { .. } | Phase::Finished { .. } if !both_ready => {
                return Err(RecordError::Inconsistent("battle without both players ready"));
            }
            Phase::Battle { .. }
                if board_a.remaining_ship_cells() == 0 || board_b.remaining_ship_cells() == 0 =>
            {
                return Err(RecordError::Inconsistent("battle continues after a fleet was sunk"));
            }
            Phase::Finished { winner } => {
                let loser = if *winner == players[0] { &board_b } else { &board_a };
                if loser.remaining_ship_cells() != 0 {
                    return Err(RecordError::Inconsistent("winner declared while ships remain"));
                }
            }
            _ => {}
        }

        Ok(Match::from_parts(id, players, [board_a, board_b], placed, phase, ready))
    }

    /// Decode a match straight from store fields.
    pub fn from_fields(id: MatchId, fields: &Fields) -> Result<Self, RecordError> {
        Self::from_record(id, from_fields(fields)?)
    }

    /// Store fields for this match.
    pub fn to_fields(&self) -> Result<Fields, RecordError> {
        to_fields(&self.to_record())
    }
}
