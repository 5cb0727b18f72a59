//! Two-player Battleship match engine shared through a document store.
//!
//! The pure engine ([`Board`], [`Match`], [`PlacementSession`]) is synchronous
//! and free of I/O. [`MatchClient`] and [`Lobby`] drive it through a
//! [`SyncGateway`], applying every action as one atomic transaction.

mod bitboard;
mod board;
pub mod client;
mod common;
mod config;
mod game;
pub mod gateway;
pub mod lobby;
mod logging;
mod placement;
mod player;
pub mod prelude;
pub mod record;
mod ship;

pub use bitboard::{BitBoard, BitBoardError};
pub use board::*;
pub use client::{ClientError, MatchClient};
pub use common::*;
pub use config::*;
pub use game::*;
pub use gateway::in_memory::InMemoryGateway;
pub use gateway::{SyncError, SyncGateway};
pub use lobby::{Invite, Lobby};
pub use logging::{init_logging, log_level};
pub use placement::*;
pub use player::*;
pub use record::{GameState, MatchRecord, PlayerRecord, RecordError};
pub use ship::{Orientation, Run, ShipDef};
