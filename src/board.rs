//! One player's 10×10 grid: their ship placements plus the opponent's shots.

use core::fmt;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::common::{PlacementError, ShotError, ShotOutcome, ShotResult};
use crate::config::{PlacementRules, BOARD_SIZE, CELL_COUNT};
use crate::ship::{Orientation, Run, ShipDef, BB};

/// State of one grid cell. Hit and Miss are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Cell {
    #[default]
    Empty,
    Ship,
    Hit,
    Miss,
}

impl Cell {
    /// Integer code used in persisted boards.
    pub fn code(self) -> u8 {
        match self {
            Cell::Empty => 0,
            Cell::Ship => 1,
            Cell::Hit => 2,
            Cell::Miss => 3,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Cell::Empty),
            1 => Some(Cell::Ship),
            2 => Some(Cell::Hit),
            3 => Some(Cell::Miss),
            _ => None,
        }
    }

    /// The cell has been fired upon.
    pub fn is_resolved(self) -> bool {
        matches!(self, Cell::Hit | Cell::Miss)
    }
}

/// Grid of cells, row-major.
#[derive(Clone, PartialEq, Eq)]
pub struct Board {
    cells: [Cell; CELL_COUNT],
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// Create an empty board.
    pub fn new() -> Self {
        Board {
            cells: [Cell::Empty; CELL_COUNT],
        }
    }

    /// Rebuild a board from its cells.
    pub fn from_cells(cells: [Cell; CELL_COUNT]) -> Self {
        Board { cells }
    }

    pub fn cells(&self) -> &[Cell; CELL_COUNT] {
        &self.cells
    }

    /// Cell at `index`, or `None` when out of bounds.
    pub fn cell(&self, index: usize) -> Option<Cell> {
        self.cells.get(index).copied()
    }

    /// Cells still holding an unhit ship segment.
    pub fn remaining_ship_cells(&self) -> usize {
        self.cells.iter().filter(|c| **c == Cell::Ship).count()
    }

    /// Cells that hold or held a ship segment.
    pub fn ship_cells(&self) -> usize {
        self.cells
            .iter()
            .filter(|c| matches!(c, Cell::Ship | Cell::Hit))
            .count()
    }

    /// Cells fired upon so far.
    pub fn shots_taken(&self) -> usize {
        self.cells.iter().filter(|c| c.is_resolved()).count()
    }

    /// Occupancy mask of every ship segment, hit or not.
    fn ship_mask(&self) -> BB {
        let mut mask = BB::new();
        for (idx, cell) in self.cells.iter().enumerate() {
            if matches!(cell, Cell::Ship | Cell::Hit) {
                let _ = mask.set(idx);
            }
        }
        mask
    }

    /// Check a run against the ships already on the board.
    fn check_run(&self, run: &Run, rules: PlacementRules) -> Result<(), PlacementError> {
        let ships = self.ship_mask();
        let mask = run.mask();
        if !(ships & mask).is_empty() {
            return Err(PlacementError::Overlap);
        }
        if rules.strict_adjacency && !(ships & mask.dilate()).is_empty() {
            return Err(PlacementError::TooClose);
        }
        Ok(())
    }

    /// Validate the run from `start` to `end` for `ship` without placing it.
    pub fn check_placement(
        &self,
        ship: ShipDef,
        start: usize,
        end: usize,
        rules: PlacementRules,
    ) -> Result<Run, PlacementError> {
        let run = Run::for_ship(ship, start, end)?;
        self.check_run(&run, rules)?;
        Ok(run)
    }

    /// Place `ship` on the run from `start` to `end`. The board is unchanged
    /// on error.
    pub fn place(
        &mut self,
        ship: ShipDef,
        start: usize,
        end: usize,
        rules: PlacementRules,
    ) -> Result<Run, PlacementError> {
        let run = self.check_placement(ship, start, end, rules)?;
        for idx in run.cells() {
            self.cells[idx] = Cell::Ship;
        }
        Ok(run)
    }

    /// Pick a random valid run for `ship`, or `None` after 200 failed tries.
    pub fn random_placement<R: Rng>(
        &self,
        rng: &mut R,
        ship: ShipDef,
        rules: PlacementRules,
    ) -> Option<Run> {
        for _ in 0..200 {
            let orient = if rng.random() {
                Orientation::Horizontal
            } else {
                Orientation::Vertical
            };
            let origin = rng.random_range(0..CELL_COUNT);
            let Some(run) = Run::from_origin(origin, ship.length(), orient) else {
                continue;
            };
            if self.check_run(&run, rules).is_ok() {
                return Some(run);
            }
        }
        None
    }

    /// Whether the cells that hold or held a ship split exactly into straight
    /// runs, one per entry of `ships`.
    pub fn holds_fleet(&self, ships: &[ShipDef]) -> bool {
        fits(self.ship_mask(), ships)
    }

    /// Resolve a shot at `index`.
    pub fn fire_at(&mut self, index: usize) -> Result<ShotOutcome, ShotError> {
        let cell = self.cells.get_mut(index).ok_or(ShotError::OutOfBounds)?;
        let result = match *cell {
            Cell::Hit | Cell::Miss => return Err(ShotError::AlreadyShot),
            Cell::Ship => {
                *cell = Cell::Hit;
                ShotResult::Hit
            }
            Cell::Empty => {
                *cell = Cell::Miss;
                ShotResult::Miss
            }
        };
        let all_sunk = result == ShotResult::Hit && self.remaining_ship_cells() == 0;
        Ok(ShotOutcome { result, all_sunk })
    }

    /// Persisted form: one integer code per cell.
    pub fn to_codes(&self) -> Vec<u8> {
        self.cells.iter().map(|c| c.code()).collect()
    }

    /// Parse persisted codes. Returns `None` on a wrong length or unknown code.
    pub fn from_codes(codes: &[u8]) -> Option<Self> {
        if codes.len() != CELL_COUNT {
            return None;
        }
        let mut cells = [Cell::Empty; CELL_COUNT];
        for (cell, code) in cells.iter_mut().zip(codes) {
            *cell = Cell::from_code(*code)?;
        }
        Some(Board { cells })
    }
}

/// Exact cover of `cells` by `ships`. The lowest set cell is always the
/// origin of the run that covers it.
fn fits(cells: BB, ships: &[ShipDef]) -> bool {
    let Some(origin) = cells.iter_set_bits().next() else {
        return ships.is_empty();
    };
    for (i, ship) in ships.iter().enumerate() {
        if ships[..i].iter().any(|s| s.length() == ship.length()) {
            continue;
        }
        for orientation in [Orientation::Horizontal, Orientation::Vertical] {
            let Some(run) = Run::from_origin(origin, ship.length(), orientation) else {
                continue;
            };
            let mask = run.mask();
            if !(mask & !cells).is_empty() {
                continue;
            }
            let mut rest = ships.to_vec();
            rest.remove(i);
            if fits(cells & !mask, &rest) {
                return true;
            }
        }
    }
    false
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Board {{")?;
        for row in self.cells.chunks(BOARD_SIZE) {
            write!(f, "  ")?;
            for cell in row {
                let c = match cell {
                    Cell::Empty => '.',
                    Cell::Ship => 'S',
                    Cell::Hit => 'X',
                    Cell::Miss => 'o',
                };
                write!(f, "{}", c)?;
            }
            writeln!(f)?;
        }
        write!(f, "}}")
    }
}
