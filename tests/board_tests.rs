mod common;

use battleship_sync::{
    Board, Cell, Orientation, PlacementError, PlacementRules, ShipDef, ShotError, ShotResult,
    FLEET, TOTAL_SHIP_CELLS,
};
use common::{full_board, LAYOUT, SHIP_CELLS};

const STRICT: PlacementRules = PlacementRules {
    strict_adjacency: true,
};

fn carrier() -> ShipDef {
    FLEET[0]
}

#[test]
fn test_canonical_fleet_places_on_empty_board() {
    let board = full_board();
    assert_eq!(board.remaining_ship_cells(), TOTAL_SHIP_CELLS);
    for idx in SHIP_CELLS {
        assert_eq!(board.cell(idx), Some(Cell::Ship));
    }
}

#[test]
fn test_place_reports_resolved_run() {
    let mut board = Board::new();
    let run = board.place(carrier(), 33, 3, STRICT).unwrap();
    assert_eq!(run.orientation(), Orientation::Vertical);
    assert_eq!(run.origin(), 3);
    assert_eq!(run.end(), 33);
    assert_eq!(run.cells().collect::<Vec<_>>(), vec![3, 13, 23, 33]);
}

#[test]
fn test_end_before_start_is_accepted() {
    let mut board = Board::new();
    board.place(carrier(), 9, 6, STRICT).unwrap();
    for idx in 6..=9 {
        assert_eq!(board.cell(idx), Some(Cell::Ship));
    }
}

#[test]
fn test_diagonal_is_wrong_orientation() {
    let mut board = Board::new();
    assert_eq!(
        board.place(FLEET[2], 0, 11, STRICT).unwrap_err(),
        PlacementError::WrongOrientation
    );
    assert_eq!(board.remaining_ship_cells(), 0);
}

#[test]
fn test_short_run_is_wrong_length() {
    let mut board = Board::new();
    assert_eq!(
        board.place(carrier(), 0, 2, STRICT).unwrap_err(),
        PlacementError::WrongLength
    );
    assert_eq!(
        board.place(carrier(), 0, 40, STRICT).unwrap_err(),
        PlacementError::WrongLength
    );
}

#[test]
fn test_row_wrap_is_not_a_run() {
    // 8 and 11 are four cells apart in index space but in different rows.
    let mut board = Board::new();
    assert_eq!(
        board.place(carrier(), 8, 11, STRICT).unwrap_err(),
        PlacementError::WrongOrientation
    );
}

#[test]
fn test_same_ship_twice_overlaps() {
    let mut board = Board::new();
    let (start, end) = LAYOUT[0];
    board.place(carrier(), start, end, STRICT).unwrap();
    assert_eq!(
        board.place(carrier(), start, end, STRICT).unwrap_err(),
        PlacementError::Overlap
    );
    assert_eq!(board.remaining_ship_cells(), 4);
}

#[test]
fn test_touching_ship_is_too_close() {
    let mut board = Board::new();
    board.place(carrier(), 0, 3, STRICT).unwrap();
    // side by side
    assert_eq!(
        board.place(FLEET[1], 10, 12, STRICT).unwrap_err(),
        PlacementError::TooClose
    );
    // diagonal corner
    assert_eq!(
        board.place(FLEET[4], 14, 14, STRICT).unwrap_err(),
        PlacementError::TooClose
    );
    // end to end
    assert_eq!(
        board.place(FLEET[2], 4, 5, STRICT).unwrap_err(),
        PlacementError::TooClose
    );
    // one empty row in between is fine
    board.place(FLEET[1], 20, 22, STRICT).unwrap();
}

#[test]
fn test_adjacency_does_not_wrap_rows() {
    let mut board = Board::new();
    board.place(FLEET[4], 9, 9, STRICT).unwrap();
    // 10 follows 9 in index order but sits in column 0 of the next row.
    board.place(FLEET[5], 10, 10, STRICT).unwrap();
}

#[test]
fn test_lax_rules_allow_touching() {
    let mut board = Board::new();
    board.place(carrier(), 0, 3, PlacementRules::lax()).unwrap();
    board.place(FLEET[1], 10, 12, PlacementRules::lax()).unwrap();
    assert_eq!(
        board.place(FLEET[4], 12, 12, PlacementRules::lax()).unwrap_err(),
        PlacementError::Overlap
    );
}

#[test]
fn test_out_of_bounds_placement() {
    let mut board = Board::new();
    assert_eq!(
        board.place(FLEET[4], 100, 100, STRICT).unwrap_err(),
        PlacementError::OutOfBounds
    );
}

#[test]
fn test_fire_hit_miss_and_repeat() {
    let mut board = full_board();
    let hit = board.fire_at(0).unwrap();
    assert_eq!(hit.result, ShotResult::Hit);
    assert!(!hit.all_sunk);
    assert_eq!(board.cell(0), Some(Cell::Hit));

    let miss = board.fire_at(99).unwrap();
    assert_eq!(miss.result, ShotResult::Miss);
    assert_eq!(board.cell(99), Some(Cell::Miss));

    assert_eq!(board.fire_at(0).unwrap_err(), ShotError::AlreadyShot);
    assert_eq!(board.fire_at(99).unwrap_err(), ShotError::AlreadyShot);
    assert_eq!(board.fire_at(100).unwrap_err(), ShotError::OutOfBounds);
    assert_eq!(board.remaining_ship_cells(), TOTAL_SHIP_CELLS - 1);
}

#[test]
fn test_last_hit_sinks_everything() {
    let mut board = full_board();
    let (last, rest) = SHIP_CELLS.split_last().unwrap();
    for idx in rest {
        assert!(!board.fire_at(*idx).unwrap().all_sunk);
    }
    let outcome = board.fire_at(*last).unwrap();
    assert_eq!(outcome.result, ShotResult::Hit);
    assert!(outcome.all_sunk);
    assert_eq!(board.remaining_ship_cells(), 0);
    assert_eq!(board.ship_cells(), TOTAL_SHIP_CELLS);
}

#[test]
fn test_codes_roundtrip_and_rejects_garbage() {
    let mut board = full_board();
    board.fire_at(0).unwrap();
    board.fire_at(55).unwrap();
    let codes = board.to_codes();
    assert_eq!(codes.len(), 100);
    assert_eq!(codes[0], 2);
    assert_eq!(codes[1], 1);
    assert_eq!(codes[55], 3);
    assert_eq!(codes[99], 0);
    assert_eq!(Board::from_codes(&codes), Some(board));

    let mut bad = codes.clone();
    bad[7] = 72;
    assert_eq!(Board::from_codes(&bad), None);
    assert_eq!(Board::from_codes(&codes[..99]), None);
}
