#![allow(dead_code)]

use battleship_sync::{Board, Match, MatchId, PlacementRules, PlayerId, FLEET};

/// Start/end cells for each roster ship, in roster order. No two ships touch.
pub const LAYOUT: [(usize, usize); 6] = [(0, 3), (20, 22), (40, 41), (60, 61), (80, 80), (85, 85)];

/// Every cell covered by `LAYOUT`.
pub const SHIP_CELLS: [usize; 13] = [0, 1, 2, 3, 20, 21, 22, 40, 41, 60, 61, 80, 85];

pub fn alice() -> PlayerId {
    PlayerId::new("alice")
}

pub fn bob() -> PlayerId {
    PlayerId::new("bob")
}

pub fn full_board() -> Board {
    let mut board = Board::new();
    for (ship, (start, end)) in FLEET.iter().zip(LAYOUT) {
        board.place(*ship, start, end, PlacementRules::default()).unwrap();
    }
    board
}

/// A match between alice (A) and bob (B) with both fleets placed per `LAYOUT`.
pub fn battle_match() -> Match {
    let mut m = Match::invite(MatchId::new("m1"), alice(), bob()).unwrap();
    m.accept(&bob()).unwrap();
    for player in [alice(), bob()] {
        for (start, end) in LAYOUT {
            m.place(&player, start, end, PlacementRules::default()).unwrap();
        }
    }
    m
}
