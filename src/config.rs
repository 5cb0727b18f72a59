use serde::{Deserialize, Serialize};

use crate::ship::ShipDef;

pub const BOARD_SIZE: usize = 10;
pub const CELL_COUNT: usize = BOARD_SIZE * BOARD_SIZE;
pub const NUM_SHIPS: usize = 6;
pub const FLEET: [ShipDef; NUM_SHIPS] = [
    ShipDef::new("Carrier", 4),
    ShipDef::new("Battleship", 3),
    ShipDef::new("Submarine1", 2),
    ShipDef::new("Submarine2", 2),
    ShipDef::new("Destroyer1", 1),
    ShipDef::new("Destroyer2", 1),
];

/// Total number of ship segments in the canonical fleet.
pub const TOTAL_SHIP_CELLS: usize = 4 + 3 + 2 + 2 + 1 + 1;

/// Document store collection holding player records.
pub const PLAYERS_COLLECTION: &str = "players";
/// Document store collection holding match records.
pub const GAMES_COLLECTION: &str = "games";

/// Number of roster ships whose lengths add up to `ship_cells`, or `None` if
/// no prefix of the fleet covers exactly that many cells.
pub fn ships_placed_for(ship_cells: usize) -> Option<usize> {
    let mut total = 0;
    if ship_cells == 0 {
        return Some(0);
    }
    for (i, def) in FLEET.iter().enumerate() {
        total += def.length();
        if total == ship_cells {
            return Some(i + 1);
        }
    }
    None
}

/// Look up a roster ship by name.
pub fn ship_by_name(name: &str) -> Option<ShipDef> {
    FLEET.iter().copied().find(|def| def.name() == name)
}

/// Rules applied when validating a placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlacementRules {
    /// Reject placements that touch another ship, diagonals included.
    pub strict_adjacency: bool,
}

impl Default for PlacementRules {
    fn default() -> Self {
        Self {
            strict_adjacency: true,
        }
    }
}

impl PlacementRules {
    /// Overlap is still rejected, touching ships are allowed.
    pub const fn lax() -> Self {
        Self {
            strict_adjacency: false,
        }
    }
}

/// Settings for a [`crate::MatchClient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClientConfig {
    pub rules: PlacementRules,
    /// Attempts per atomic commit before reporting a conflict to the caller.
    pub max_commit_attempts: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            rules: PlacementRules::default(),
            max_commit_attempts: 3,
        }
    }
}
