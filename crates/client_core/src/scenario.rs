use shared::{
    domain::{CellKind, Grid},
    error::GridShapeError,
};

/// The operator-editable grid of one session. Its dimension never changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    grid: Grid,
}

impl Scenario {
    pub fn new(size: usize) -> Self {
        Self {
            grid: Grid::empty(size),
        }
    }

    pub fn size(&self) -> usize {
        self.grid.size()
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn set_cell(
        &mut self,
        row: usize,
        col: usize,
        kind: CellKind,
    ) -> Result<(), GridShapeError> {
        self.grid.set(row, col, kind)
    }

    pub fn clear(&mut self) {
        self.grid = Grid::empty(self.size());
    }

    /// Wholesale replacement with a remote snapshot of the same dimension.
    pub fn replace_grid(&mut self, grid: Grid) -> Result<(), GridShapeError> {
        if grid.size() != self.size() {
            return Err(GridShapeError::SizeMismatch {
                expected: self.size(),
                actual: grid.size(),
            });
        }
        self.grid = grid;
        Ok(())
    }
}
