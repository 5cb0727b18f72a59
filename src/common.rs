//! Common types for the match engine: shot results and the typed rejections
//! returned by boards and matches.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ship::ShipDef;

/// What a single shot did to the cell it landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShotResult {
    Hit,
    Miss,
}

/// Result of a resolved shot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShotOutcome {
    pub result: ShotResult,
    /// The shot removed the last Ship cell of the board.
    pub all_sunk: bool,
}

/// Why a placement was rejected. Checked in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PlacementError {
    #[error("cell index is outside the board")]
    OutOfBounds,
    #[error("start and end are not in the same row or column")]
    WrongOrientation,
    #[error("run length does not match the ship length")]
    WrongLength,
    #[error("a target cell is already occupied by a ship")]
    Overlap,
    #[error("the ship would touch another ship")]
    TooClose,
}

/// Why a shot was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ShotError {
    #[error("cell index is outside the board")]
    OutOfBounds,
    #[error("this cell was already fired upon")]
    AlreadyShot,
    #[error("it is not this player's turn")]
    NotYourTurn,
    #[error("the match is not in battle")]
    MatchNotActive,
}

/// Rejection of a match-level action. Nothing is mutated when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    #[error("invalid placement: {0}")]
    Placement(#[from] PlacementError),
    #[error("invalid shot: {0}")]
    Shot(#[from] ShotError),
    #[error("player is not part of this match")]
    NotAParticipant,
    #[error("only the invited player may answer the invite")]
    NotInvitee,
    #[error("a player cannot challenge themselves")]
    SelfChallenge,
    #[error("already in a game with this player")]
    AlreadyInGame,
    #[error("action is not allowed in the current phase")]
    WrongPhase,
    #[error("player is ready, the fleet can no longer change")]
    AlreadyReady,
    #[error("fleet is incomplete, next ship is {}", .next.name())]
    FleetIncomplete { next: ShipDef },
}
