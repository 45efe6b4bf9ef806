//! Property-based tests for the grid editing invariants.
//!
//! For every sequence of edits, in any order:
//!
//! 1. **Safety**: start and end are never obstacles, never equal, and
//!    everything stored stays in bounds.
//! 2. **Silent rejection**: an edit that reports `false` leaves the grid
//!    exactly as it was.
//! 3. **Reset**: always restores the corner endpoints and an empty
//!    obstacle set, from any reachable state.

use proptest::prelude::*;
use wayviz_core::grid::{Cell, EndpointKind, GridState};

#[derive(Debug, Clone, Copy)]
enum Edit {
    Toggle(Cell),
    Move(EndpointKind, Cell),
    Reset,
}

fn arb_cell(rows: u16, cols: u16) -> impl Strategy<Value = Cell> {
    // Deliberately overshoots the bounds so out-of-range edits are exercised.
    (0..rows + 2, 0..cols + 2).prop_map(|(row, col)| Cell::new(row, col))
}

fn arb_edit(rows: u16, cols: u16) -> impl Strategy<Value = Edit> {
    prop_oneof![
        4 => arb_cell(rows, cols).prop_map(Edit::Toggle),
        2 => arb_cell(rows, cols).prop_map(|c| Edit::Move(EndpointKind::Start, c)),
        2 => arb_cell(rows, cols).prop_map(|c| Edit::Move(EndpointKind::End, c)),
        1 => Just(Edit::Reset),
    ]
}

fn snapshot(grid: &GridState) -> (Cell, Cell, Vec<Cell>) {
    (grid.start(), grid.end(), grid.obstacle_list())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn invariant_holds_after_every_edit(edits in prop::collection::vec(arb_edit(10, 10), 1..120)) {
        let mut grid = GridState::new(10, 10);
        for edit in edits {
            match edit {
                Edit::Toggle(cell) => { grid.toggle_obstacle(cell); }
                Edit::Move(which, cell) => { grid.move_endpoint(which, cell); }
                Edit::Reset => grid.reset(),
            }
            prop_assert!(grid.invariant_holds());
        }
    }

    #[test]
    fn rejected_edits_change_nothing(edits in prop::collection::vec(arb_edit(6, 6), 1..80)) {
        let mut grid = GridState::new(6, 6);
        for edit in edits {
            let before = snapshot(&grid);
            let mutated = match edit {
                Edit::Toggle(cell) => grid.toggle_obstacle(cell),
                Edit::Move(which, cell) => grid.move_endpoint(which, cell),
                Edit::Reset => {
                    grid.reset();
                    continue;
                }
            };
            if !mutated {
                prop_assert_eq!(before, snapshot(&grid));
            }
        }
    }

    #[test]
    fn reset_reaches_the_same_state_from_anywhere(
        edits in prop::collection::vec(arb_edit(8, 8), 0..60),
    ) {
        let mut grid = GridState::new(8, 8);
        for edit in edits {
            match edit {
                Edit::Toggle(cell) => { grid.toggle_obstacle(cell); }
                Edit::Move(which, cell) => { grid.move_endpoint(which, cell); }
                Edit::Reset => grid.reset(),
            }
        }
        grid.reset();
        prop_assert_eq!(grid.start(), Cell::new(0, 0));
        prop_assert_eq!(grid.end(), Cell::new(7, 7));
        prop_assert_eq!(grid.obstacle_count(), 0);
    }
}
