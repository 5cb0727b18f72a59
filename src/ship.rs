//! Ship definitions and resolution of a start/end selection into a run of
//! cells.

use core::fmt;

use crate::bitboard::BitBoard;
use crate::common::PlacementError;
use crate::config::{BOARD_SIZE, CELL_COUNT};

pub(crate) type BB = BitBoard<u128, BOARD_SIZE>;

/// Orientation of a ship on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// Type of ship: name and length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShipDef {
    name: &'static str,
    length: usize,
}

impl ShipDef {
    /// Create a new ship definition.
    pub const fn new(name: &'static str, length: usize) -> Self {
        Self { name, length }
    }

    /// Ship's name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Ship's length.
    pub fn length(&self) -> usize {
        self.length
    }
}

/// A contiguous, axis-aligned run of cells.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Run {
    origin: usize,
    len: usize,
    orientation: Orientation,
}

impl Run {
    /// Resolve two cell indices into the run between them, inclusive and in
    /// either order. A single cell resolves to a horizontal run of one.
    pub fn between(start: usize, end: usize) -> Result<Self, PlacementError> {
        if start >= CELL_COUNT || end >= CELL_COUNT {
            return Err(PlacementError::OutOfBounds);
        }
        let (sr, sc) = (start / BOARD_SIZE, start % BOARD_SIZE);
        let (er, ec) = (end / BOARD_SIZE, end % BOARD_SIZE);
        let origin = start.min(end);
        if sr == er {
            Ok(Run {
                origin,
                len: sc.abs_diff(ec) + 1,
                orientation: Orientation::Horizontal,
            })
        } else if sc == ec {
            Ok(Run {
                origin,
                len: sr.abs_diff(er) + 1,
                orientation: Orientation::Vertical,
            })
        } else {
            Err(PlacementError::WrongOrientation)
        }
    }

    /// Resolve a start selection and an end selection for `ship`, checking the
    /// length as well.
    pub fn for_ship(ship: ShipDef, start: usize, end: usize) -> Result<Self, PlacementError> {
        let run = Self::between(start, end)?;
        if run.len != ship.length() {
            return Err(PlacementError::WrongLength);
        }
        Ok(run)
    }

    /// Run of `len` cells beginning at `origin`, if it fits on the board.
    pub fn from_origin(origin: usize, len: usize, orientation: Orientation) -> Option<Self> {
        if origin >= CELL_COUNT || len == 0 {
            return None;
        }
        let (row, col) = (origin / BOARD_SIZE, origin % BOARD_SIZE);
        let fits = match orientation {
            Orientation::Horizontal => col + len <= BOARD_SIZE,
            Orientation::Vertical => row + len <= BOARD_SIZE,
        };
        fits.then_some(Run {
            origin,
            len,
            orientation,
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// First cell of the run (top-most or left-most).
    pub fn origin(&self) -> usize {
        self.origin
    }

    /// Last cell of the run.
    pub fn end(&self) -> usize {
        self.origin + (self.len - 1) * self.step()
    }

    fn step(&self) -> usize {
        match self.orientation {
            Orientation::Horizontal => 1,
            Orientation::Vertical => BOARD_SIZE,
        }
    }

    /// Cell indices covered by the run.
    pub fn cells(&self) -> impl Iterator<Item = usize> {
        let (origin, step) = (self.origin, self.step());
        (0..self.len).map(move |i| origin + i * step)
    }

    /// Occupancy mask of the run.
    pub(crate) fn mask(&self) -> BB {
        let mut mask = BB::new();
        for idx in self.cells() {
            // Runs are only built from in-bounds cells.
            let _ = mask.set(idx);
        }
        mask
    }
}

impl fmt::Debug for Run {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Run {{ origin: ({}, {}), len: {}, orientation: {:?} }}",
            self.origin / BOARD_SIZE,
            self.origin % BOARD_SIZE,
            self.len,
            self.orientation,
        )
    }
}
