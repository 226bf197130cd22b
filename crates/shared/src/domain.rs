use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{GridShapeError, UnknownCellKind};

pub const DEFAULT_GRID_SIZE: usize = 10;
/// Largest side length accepted from configuration or the wire.
pub const MAX_GRID_SIZE: usize = 256;

/// Contents of one grid cell. Travels on the wire as `0..=3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum CellKind {
    #[default]
    Empty,
    Obstacle,
    Catcher,
    Runner,
}

impl CellKind {
    pub const ALL: [CellKind; 4] = [
        CellKind::Empty,
        CellKind::Obstacle,
        CellKind::Catcher,
        CellKind::Runner,
    ];

    pub fn label(self) -> &'static str {
        match self {
            CellKind::Empty => "empty",
            CellKind::Obstacle => "obstacle",
            CellKind::Catcher => "catcher",
            CellKind::Runner => "runner",
        }
    }

    pub fn parse_label(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.label().eq_ignore_ascii_case(raw))
    }
}

impl From<CellKind> for u8 {
    fn from(kind: CellKind) -> Self {
        match kind {
            CellKind::Empty => 0,
            CellKind::Obstacle => 1,
            CellKind::Catcher => 2,
            CellKind::Runner => 3,
        }
    }
}

impl TryFrom<u8> for CellKind {
    type Error = UnknownCellKind;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(CellKind::Empty),
            1 => Ok(CellKind::Obstacle),
            2 => Ok(CellKind::Catcher),
            3 => Ok(CellKind::Runner),
            other => Err(UnknownCellKind(other)),
        }
    }
}

impl fmt::Display for CellKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Square, row-major matrix of cells.
///
/// Only square shapes can be constructed or deserialized; the wire form is
/// `size` ordered rows of `size` ordered cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "Vec<Vec<CellKind>>", try_from = "Vec<Vec<CellKind>>")]
pub struct Grid {
    size: usize,
    cells: Vec<CellKind>,
}

impl Grid {
    /// `size` is clamped to [`MAX_GRID_SIZE`].
    pub fn empty(size: usize) -> Self {
        let size = size.min(MAX_GRID_SIZE);
        Self {
            size,
            cells: vec![CellKind::Empty; size * size],
        }
    }

    pub fn from_rows(rows: Vec<Vec<CellKind>>) -> Result<Self, GridShapeError> {
        let size = rows.len();
        if size > MAX_GRID_SIZE {
            return Err(GridShapeError::TooLarge {
                size,
                max: MAX_GRID_SIZE,
            });
        }
        if let Some((row, cols)) = rows.iter().enumerate().find(|(_, cols)| cols.len() != size) {
            return Err(GridShapeError::NotSquare {
                row,
                expected: size,
                actual: cols.len(),
            });
        }

        let cells = rows.into_iter().flatten().collect();
        Ok(Self { size, cells })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get(&self, row: usize, col: usize) -> Option<CellKind> {
        self.index(row, col).map(|idx| self.cells[idx])
    }

    pub fn set(&mut self, row: usize, col: usize, kind: CellKind) -> Result<(), GridShapeError> {
        let idx = self.index(row, col).ok_or(GridShapeError::OutOfBounds {
            row,
            col,
            size: self.size,
        })?;
        self.cells[idx] = kind;
        Ok(())
    }

    pub fn cells(&self) -> &[CellKind] {
        &self.cells
    }

    pub fn rows(&self) -> impl Iterator<Item = &[CellKind]> {
        // chunks(0) panics, and a 0x0 grid has no rows anyway.
        self.cells.chunks(self.size.max(1))
    }

    pub fn count(&self, kind: CellKind) -> usize {
        self.cells.iter().filter(|cell| **cell == kind).count()
    }

    pub fn is_all(&self, kind: CellKind) -> bool {
        self.cells.iter().all(|cell| *cell == kind)
    }

    fn index(&self, row: usize, col: usize) -> Option<usize> {
        (row < self.size && col < self.size).then(|| row * self.size + col)
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::empty(DEFAULT_GRID_SIZE)
    }
}

impl From<Grid> for Vec<Vec<CellKind>> {
    fn from(grid: Grid) -> Self {
        grid.rows().map(<[CellKind]>::to_vec).collect()
    }
}

impl TryFrom<Vec<Vec<CellKind>>> for Grid {
    type Error = GridShapeError;

    fn try_from(rows: Vec<Vec<CellKind>>) -> Result<Self, Self::Error> {
        Self::from_rows(rows)
    }
}
