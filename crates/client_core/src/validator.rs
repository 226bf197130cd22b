use shared::domain::{CellKind, Grid};

pub const INVALID_SCENARIO_REASON: &str = "Grid must have exactly one runner and one catcher";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validity {
    Ok,
    Invalid(String),
}

impl Validity {
    pub fn is_ok(&self) -> bool {
        matches!(self, Validity::Ok)
    }
}

/// A scenario is runnable iff it holds exactly one catcher and exactly one runner.
pub fn validate(grid: &Grid) -> Validity {
    let (catchers, runners) = grid
        .cells()
        .iter()
        .fold((0usize, 0usize), |(catchers, runners), cell| match cell {
            CellKind::Catcher => (catchers + 1, runners),
            CellKind::Runner => (catchers, runners + 1),
            CellKind::Empty | CellKind::Obstacle => (catchers, runners),
        });

    if catchers == 1 && runners == 1 {
        Validity::Ok
    } else {
        Validity::Invalid(INVALID_SCENARIO_REASON.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_with(size: usize, cells: &[(usize, usize, CellKind)]) -> Grid {
        let mut grid = Grid::empty(size);
        for (row, col, kind) in cells {
            grid.set(*row, *col, *kind).expect("in bounds");
        }
        grid
    }

    #[test]
    fn one_runner_and_one_catcher_is_runnable() {
        let grid = grid_with(
            10,
            &[
                (0, 0, CellKind::Runner),
                (9, 9, CellKind::Catcher),
                (4, 4, CellKind::Obstacle),
                (4, 5, CellKind::Obstacle),
            ],
        );
        assert_eq!(validate(&grid), Validity::Ok);
    }

    #[test]
    fn degenerate_grids_are_invalid() {
        let all_empty = Grid::empty(10);
        let all_catcher = Grid::from_rows(vec![vec![CellKind::Catcher; 3]; 3]).expect("square");
        let zero = Grid::empty(0);

        for grid in [all_empty, all_catcher, zero] {
            assert_eq!(
                validate(&grid),
                Validity::Invalid(INVALID_SCENARIO_REASON.to_string())
            );
        }
    }

    #[test]
    fn extra_or_missing_pieces_are_invalid() {
        let two_runners = grid_with(
            5,
            &[
                (0, 0, CellKind::Runner),
                (0, 1, CellKind::Runner),
                (4, 4, CellKind::Catcher),
            ],
        );
        let no_catcher = grid_with(5, &[(0, 0, CellKind::Runner)]);
        let no_runner = grid_with(5, &[(2, 2, CellKind::Catcher)]);

        assert!(!validate(&two_runners).is_ok());
        assert!(!validate(&no_catcher).is_ok());
        assert!(!validate(&no_runner).is_ok());
    }

    #[test]
    fn single_cell_grid_can_never_be_runnable() {
        let grid = grid_with(1, &[(0, 0, CellKind::Runner)]);
        assert!(!validate(&grid).is_ok());
    }
}
