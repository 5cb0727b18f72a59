//! Commonly used types and utilities for ease of import.

pub use crate::{
    Board, Cell, ClientConfig, ClientError, InMemoryGateway, Lobby, Match, MatchClient, MatchError,
    Phase, PlacementRules, PlacementSession, PlayerId, ShotResult, SyncGateway, FLEET,
};
