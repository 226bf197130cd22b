use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unknown cell kind {0}; expected 0 (empty), 1 (obstacle), 2 (catcher) or 3 (runner)")]
pub struct UnknownCellKind(pub u8);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridShapeError {
    #[error("grid row {row} has {actual} cells, expected {expected}")]
    NotSquare {
        row: usize,
        expected: usize,
        actual: usize,
    },
    #[error("cell ({row}, {col}) is outside a {size}x{size} grid")]
    OutOfBounds { row: usize, col: usize, size: usize },
    #[error("grid side {size} exceeds the supported maximum of {max}")]
    TooLarge { size: usize, max: usize },
    #[error("grid is {actual}x{actual}, session expects {expected}x{expected}")]
    SizeMismatch { expected: usize, actual: usize },
}
