//! Two-click fleet placement on a local board: the first click picks where a
//! ship starts, the second where it ends.

use crate::board::Board;
use crate::common::PlacementError;
use crate::config::{PlacementRules, FLEET};
use crate::ship::{Run, ShipDef};

/// What a click did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Click {
    /// The clicked cell is now the pending start of the next ship.
    StartSelected { ship: ShipDef, start: usize },
    /// The next ship was placed.
    Placed {
        ship: ShipDef,
        run: Run,
        fleet_complete: bool,
    },
    /// The whole fleet is already on the board; the click was ignored.
    FleetComplete,
}

/// Walks the canonical fleet one ship at a time.
#[derive(Debug, Clone, Default)]
pub struct PlacementSession {
    next: usize,
    pending_start: Option<usize>,
}

impl PlacementSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume after `placed` roster ships are already on the board.
    pub fn resume(placed: usize) -> Self {
        Self {
            next: placed.min(FLEET.len()),
            pending_start: None,
        }
    }

    /// Ship the next completed selection will place.
    pub fn next_ship(&self) -> Option<ShipDef> {
        FLEET.get(self.next).copied()
    }

    pub fn pending_start(&self) -> Option<usize> {
        self.pending_start
    }

    pub fn placed(&self) -> usize {
        self.next
    }

    pub fn is_complete(&self) -> bool {
        self.next >= FLEET.len()
    }

    /// Drop the pending start selection, if any.
    pub fn cancel(&mut self) {
        self.pending_start = None;
    }

    /// Handle a click on `cell`. A failed placement clears only the pending
    /// start; the board and roster position are left as they were.
    pub fn click(
        &mut self,
        board: &mut Board,
        cell: usize,
        rules: PlacementRules,
    ) -> Result<Click, PlacementError> {
        let Some(ship) = self.next_ship() else {
            return Ok(Click::FleetComplete);
        };
        let Some(start) = self.pending_start.take() else {
            if board.cell(cell).is_none() {
                return Err(PlacementError::OutOfBounds);
            }
            self.pending_start = Some(cell);
            return Ok(Click::StartSelected { ship, start: cell });
        };
        let run = board.place(ship, start, cell, rules)?;
        self.next += 1;
        log::debug!("placed {} at {:?}", ship.name(), run);
        Ok(Click::Placed {
            ship,
            run,
            fleet_complete: self.is_complete(),
        })
    }
}
